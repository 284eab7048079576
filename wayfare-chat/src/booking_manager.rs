use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use wayfare_core::booking::{
    booking_reference, Booking, BookingConfirmation, BookingDraft, BookingStatus, Passenger,
    PassengerDetails,
};
use wayfare_core::pii::{mask_email, mask_phone};
use wayfare_core::repository::BookingRepository;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Input problem; nothing was written. Message names the offending
    /// passenger and field so the user can fix it.
    #[error("{0}")]
    Validation(String),

    /// Write problem. Any partially created booking has been removed.
    #[error("booking could not be saved: {0}")]
    Storage(String),
}

/// Validates, persists and (on partial failure) rolls back a booking
/// plus its passengers. The store offers no multi-statement
/// transaction here, so atomicity is approximated with a compensating
/// delete of the booking row.
pub struct BookingTransactionManager {
    repo: Arc<dyn BookingRepository>,
}

impl BookingTransactionManager {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, draft: BookingDraft) -> Result<BookingConfirmation, BookingError> {
        validate_draft(&draft).map_err(BookingError::Validation)?;

        let booking_id = Uuid::new_v4();
        let reference = booking_reference(booking_id);
        let booking = Booking {
            id: booking_id,
            user_id: draft.user_id.clone(),
            conversation_id: draft.conversation_id,
            total_amount: draft.total.amount,
            currency: draft.total.currency.clone(),
            flight_data: serde_json::to_value(&draft.flight)
                .map_err(|e| BookingError::Storage(e.to_string()))?,
            departure_date: draft.departure_date,
            return_date: draft.return_date,
            origin_airport: draft.origin_airport.clone(),
            destination_airport: draft.destination_airport.clone(),
            airline_code: draft.flight.carrier_code().map(|s| s.to_string()),
            flight_numbers: Some(serde_json::json!(draft.flight.flight_numbers())),
            passenger_count: draft.passengers.len() as i32,
            booking_status: BookingStatus::Confirmed,
            booking_reference: reference.clone(),
            created_at: Utc::now(),
        };

        self.repo
            .insert_booking(&booking)
            .await
            .map_err(|e| BookingError::Storage(e.to_string()))?;

        for (index, details) in draft.passengers.iter().enumerate() {
            let passenger = passenger_row(booking_id, details);
            if let Err(err) = self.repo.insert_passenger(&passenger).await {
                tracing::error!(
                    "passenger {} insert failed for booking {}, rolling back: {}",
                    index + 1,
                    booking_id,
                    err
                );
                if let Err(del_err) = self.repo.delete_booking(booking_id).await {
                    // The invariant "no booking without passengers" is
                    // now violated in the store; surface loudly.
                    tracing::error!(
                        "compensating delete failed for booking {}: {}",
                        booking_id,
                        del_err
                    );
                }
                return Err(BookingError::Storage(format!(
                    "passenger {} could not be saved",
                    index + 1
                )));
            }
        }

        let lead = &draft.passengers[0];
        tracing::info!(
            "booking {} confirmed for {} {} ({}, {}), {} passenger(s), {} {}",
            reference,
            lead.first_name,
            lead.last_name,
            mask_email(&lead.email),
            mask_phone(&lead.phone),
            draft.passengers.len(),
            booking.total_amount,
            booking.currency
        );

        Ok(BookingConfirmation {
            booking_reference: reference,
            booking_id,
            status: BookingStatus::Confirmed,
            total_amount: booking.total_amount,
            currency: booking.currency,
        })
    }
}

/// All checks run before any write.
fn validate_draft(draft: &BookingDraft) -> Result<(), String> {
    if !draft.total.amount.is_finite() || draft.total.amount <= 0.0 {
        return Err("The selected flight has no valid total price. Please search again and pick a flight.".to_string());
    }
    if draft.passengers.is_empty() {
        return Err("At least one passenger is required to book.".to_string());
    }
    for (index, passenger) in draft.passengers.iter().enumerate() {
        if let Some(field) = first_missing_field(passenger) {
            return Err(format!(
                "Passenger {} is missing {}. Please provide it and try again.",
                index + 1,
                field
            ));
        }
    }
    Ok(())
}

fn first_missing_field(passenger: &PassengerDetails) -> Option<&'static str> {
    let required: [(&str, &str); 7] = [
        ("title", &passenger.title),
        ("first name", &passenger.first_name),
        ("last name", &passenger.last_name),
        ("date of birth", &passenger.date_of_birth),
        ("nationality", &passenger.nationality),
        ("email", &passenger.email),
        ("phone", &passenger.phone),
    ];
    required
        .iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
}

fn passenger_row(booking_id: Uuid, details: &PassengerDetails) -> Passenger {
    Passenger {
        id: Uuid::new_v4(),
        booking_id,
        title: details.title.clone(),
        first_name: details.first_name.clone(),
        last_name: details.last_name.clone(),
        date_of_birth: details.date_of_birth.clone(),
        nationality: details.nationality.clone(),
        email: details.email.clone(),
        phone: details.phone.clone(),
        passport_number: details.passport_number.clone(),
        passport_expiry: details.passport_expiry.clone(),
        meal_preference: details.meal_preference.clone(),
        seat_preference: details.seat_preference.clone(),
        special_requests: details.special_requests.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wayfare_core::flight::{CanonicalFlight, FlightSegment, Money};
    use wayfare_store::InMemoryBookingRepository;

    fn passenger(first: &str, email: &str) -> PassengerDetails {
        PassengerDetails {
            title: "Mr".to_string(),
            first_name: first.to_string(),
            last_name: "Smith".to_string(),
            date_of_birth: "1990-01-01".to_string(),
            nationality: "US".to_string(),
            email: email.to_string(),
            phone: "555-0100".to_string(),
            passport_number: None,
            passport_expiry: None,
            meal_preference: None,
            seat_preference: None,
            special_requests: None,
        }
    }

    fn draft(passengers: Vec<PassengerDetails>) -> BookingDraft {
        BookingDraft {
            user_id: "u1".to_string(),
            conversation_id: Uuid::new_v4(),
            flight: CanonicalFlight {
                id: "F1".to_string(),
                price: Money::new(412.50, "USD"),
                segments: vec![FlightSegment {
                    departure_code: "IAH".to_string(),
                    departure_time: "2026-03-03T08:15:00".to_string(),
                    arrival_code: "DFW".to_string(),
                    arrival_time: "2026-03-03T09:40:00".to_string(),
                    carrier_code: "AA".to_string(),
                    flight_number: "2101".to_string(),
                    cabin: "ECONOMY".to_string(),
                }],
                stops: 0,
                duration: Some("PT1H25M".to_string()),
            },
            departure_date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            return_date: None,
            origin_airport: "IAH".to_string(),
            destination_airport: "DFW".to_string(),
            total: Money::new(825.0, "USD"),
            passengers,
        }
    }

    #[tokio::test]
    async fn test_two_passengers_commit_as_a_unit() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let manager = BookingTransactionManager::new(repo.clone());

        let confirmation = manager
            .create(draft(vec![passenger("John", "john@x.com"), passenger("Jane", "jane@x.com")]))
            .await
            .unwrap();

        assert_eq!(confirmation.status, BookingStatus::Confirmed);
        assert!(confirmation.booking_reference.starts_with("WF-"));

        let booking = repo.get_booking(confirmation.booking_id).await.unwrap().unwrap();
        assert_eq!(booking.passenger_count, 2);
        assert_eq!(booking.airline_code.as_deref(), Some("AA"));
        assert_eq!(repo.passenger_count_for(confirmation.booking_id), 2);
    }

    #[tokio::test]
    async fn test_missing_email_names_passenger_and_field() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let manager = BookingTransactionManager::new(repo.clone());

        let result = manager
            .create(draft(vec![passenger("John", "john@x.com"), passenger("Jane", "")]))
            .await;

        match result {
            Err(BookingError::Validation(msg)) => {
                assert!(msg.contains("Passenger 2"), "message was: {}", msg);
                assert!(msg.contains("email"), "message was: {}", msg);
            }
            other => panic!("expected validation failure, got {:?}", other.map(|c| c.booking_reference)),
        }
        // Validation runs before any write.
        assert_eq!(repo.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_passenger_insert_rolls_back_booking() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        repo.fail_passenger_insert_at(2);
        let manager = BookingTransactionManager::new(repo.clone());

        let result = manager
            .create(draft(vec![passenger("John", "john@x.com"), passenger("Jane", "jane@x.com")]))
            .await;

        assert!(matches!(result, Err(BookingError::Storage(_))));
        // The compensating delete removed the booking and the passenger
        // that did make it in.
        assert_eq!(repo.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_passengers_rejected() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let manager = BookingTransactionManager::new(repo.clone());

        let result = manager.create(draft(vec![])).await;
        assert!(matches!(result, Err(BookingError::Validation(_))));
        assert_eq!(repo.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_non_positive_price_rejected() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let manager = BookingTransactionManager::new(repo.clone());

        let mut bad = draft(vec![passenger("John", "john@x.com")]);
        bad.total = Money::new(0.0, "USD");
        assert!(matches!(manager.create(bad).await, Err(BookingError::Validation(_))));
    }
}
