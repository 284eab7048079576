use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use wayfare_core::booking::{Booking, BookingStatus, Passenger};
use wayfare_core::repository::{BookingRepository, RepoError};

pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: String,
    conversation_id: Uuid,
    total_amount: f64,
    currency: String,
    flight_data: Value,
    departure_date: NaiveDate,
    return_date: Option<NaiveDate>,
    origin_airport: String,
    destination_airport: String,
    airline_code: Option<String>,
    flight_numbers: Option<Value>,
    passenger_count: i32,
    booking_status: String,
    booking_reference: String,
    created_at: DateTime<Utc>,
}

fn booking_from_row(row: BookingRow) -> Result<Booking, RepoError> {
    let booking_status = match row.booking_status.as_str() {
        "confirmed" => BookingStatus::Confirmed,
        other => return Err(format!("unknown booking status in store: {}", other).into()),
    };
    Ok(Booking {
        id: row.id,
        user_id: row.user_id,
        conversation_id: row.conversation_id,
        total_amount: row.total_amount,
        currency: row.currency,
        flight_data: row.flight_data,
        departure_date: row.departure_date,
        return_date: row.return_date,
        origin_airport: row.origin_airport,
        destination_airport: row.destination_airport,
        airline_code: row.airline_code,
        flight_numbers: row.flight_numbers,
        passenger_count: row.passenger_count,
        booking_status,
        booking_reference: row.booking_reference,
        created_at: row.created_at,
    })
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, user_id, conversation_id, total_amount, currency, flight_data,
                departure_date, return_date, origin_airport, destination_airport,
                airline_code, flight_numbers, passenger_count, booking_status,
                booking_reference, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.user_id)
        .bind(booking.conversation_id)
        .bind(booking.total_amount)
        .bind(&booking.currency)
        .bind(&booking.flight_data)
        .bind(booking.departure_date)
        .bind(booking.return_date)
        .bind(&booking.origin_airport)
        .bind(&booking.destination_airport)
        .bind(&booking.airline_code)
        .bind(&booking.flight_numbers)
        .bind(booking.passenger_count)
        .bind(booking.booking_status.as_str())
        .bind(&booking.booking_reference)
        .bind(booking.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_passenger(&self, passenger: &Passenger) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO passengers (
                id, booking_id, title, first_name, last_name, date_of_birth,
                nationality, email, phone, passport_number, passport_expiry,
                meal_preference, seat_preference, special_requests
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(passenger.id)
        .bind(passenger.booking_id)
        .bind(&passenger.title)
        .bind(&passenger.first_name)
        .bind(&passenger.last_name)
        .bind(&passenger.date_of_birth)
        .bind(&passenger.nationality)
        .bind(&passenger.email)
        .bind(&passenger.phone)
        .bind(&passenger.passport_number)
        .bind(&passenger.passport_expiry)
        .bind(&passenger.meal_preference)
        .bind(&passenger.seat_preference)
        .bind(&passenger.special_requests)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_booking(&self, booking_id: Uuid) -> Result<(), RepoError> {
        // Passengers go with it via ON DELETE CASCADE.
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(booking_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, RepoError> {
        let row: Option<BookingRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, conversation_id, total_amount, currency, flight_data,
                   departure_date, return_date, origin_airport, destination_airport,
                   airline_code, flight_numbers, passenger_count, booking_status,
                   booking_reference, created_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(booking_from_row).transpose()
    }
}
