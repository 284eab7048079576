use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flight::{CanonicalFlight, Money};

/// The only state the system assigns today. There is no payment-capture
/// step wired in yet, so no pending or cancelled states exist; adding
/// them is a compile-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
        }
    }
}

/// Traveler details as supplied by the booking request. Every field up
/// to `phone` is required; the rest are optional preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerDetails {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub nationality: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub passport_number: Option<String>,
    pub passport_expiry: Option<String>,
    pub meal_preference: Option<String>,
    pub seat_preference: Option<String>,
    pub special_requests: Option<String>,
}

/// A fully resolved booking ready to be written: the chosen flight, its
/// dates and route, the price, and the traveler list.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub user_id: String,
    pub conversation_id: Uuid,
    pub flight: CanonicalFlight,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub origin_airport: String,
    pub destination_airport: String,
    pub total: Money,
    pub passengers: Vec<PassengerDetails>,
}

/// A persisted booking row. Bookings and their passengers are created as
/// a unit; a booking must never exist with zero passengers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: String,
    pub conversation_id: Uuid,
    pub total_amount: f64,
    pub currency: String,
    /// Denormalized snapshot of the chosen flight.
    pub flight_data: serde_json::Value,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub origin_airport: String,
    pub destination_airport: String,
    pub airline_code: Option<String>,
    pub flight_numbers: Option<serde_json::Value>,
    pub passenger_count: i32,
    pub booking_status: BookingStatus,
    pub booking_reference: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub nationality: String,
    pub email: String,
    pub phone: String,
    pub passport_number: Option<String>,
    pub passport_expiry: Option<String>,
    pub meal_preference: Option<String>,
    pub seat_preference: Option<String>,
    pub special_requests: Option<String>,
}

/// What the caller gets back once the booking and all passengers are
/// committed.
#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub booking_reference: String,
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub total_amount: f64,
    pub currency: String,
}

/// Human-readable reference derived from the booking id.
pub fn booking_reference(booking_id: Uuid) -> String {
    let hex = booking_id.simple().to_string();
    format!("WF-{}", hex[..6].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_reference_shape() {
        let id = Uuid::new_v4();
        let reference = booking_reference(id);
        assert!(reference.starts_with("WF-"));
        assert_eq!(reference.len(), 9);
        assert_eq!(reference, reference.to_uppercase());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let s = serde_json::to_string(&BookingStatus::Confirmed).unwrap();
        assert_eq!(s, "\"confirmed\"");
    }
}
