use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: f64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: f64, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }
}

/// One leg of an itinerary. Times are RFC 3339 strings as delivered by
/// the provider; no timezone normalization happens downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSegment {
    pub departure_code: String,
    pub departure_time: String,
    pub arrival_code: String,
    pub arrival_time: String,
    pub carrier_code: String,
    pub flight_number: String,
    pub cabin: String,
}

/// Provider-agnostic flight shape. Every adapter must emit this; nothing
/// downstream may depend on a provider's native schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalFlight {
    pub id: String,
    pub price: Money,
    pub segments: Vec<FlightSegment>,
    pub stops: u32,
    pub duration: Option<String>,
}

impl CanonicalFlight {
    /// Origin airport of the full itinerary, if any segment exists.
    pub fn origin(&self) -> Option<&str> {
        self.segments.first().map(|s| s.departure_code.as_str())
    }

    /// Final destination airport of the full itinerary.
    pub fn destination(&self) -> Option<&str> {
        self.segments.last().map(|s| s.arrival_code.as_str())
    }

    pub fn carrier_code(&self) -> Option<&str> {
        self.segments.first().map(|s| s.carrier_code.as_str())
    }

    pub fn flight_numbers(&self) -> Vec<String> {
        self.segments
            .iter()
            .map(|s| format!("{}{}", s.carrier_code, s.flight_number))
            .collect()
    }
}
