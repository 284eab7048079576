use serde_json::json;

use crate::types::FunctionSchema;

pub const SEARCH_FLIGHTS: &str = "search_flights";
pub const CREATE_FLIGHT_BOOKING: &str = "create_flight_booking";

/// Schema for the flight-search function. Origin/destination stay
/// free-form; resolution to IATA codes happens on our side.
pub fn search_flights_schema() -> FunctionSchema {
    FunctionSchema {
        name: SEARCH_FLIGHTS.to_string(),
        description: "Search for available flights between two cities or airports on a date"
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "origin": {
                    "type": "string",
                    "description": "Departure city or airport as the user said it, e.g. 'Houston' or 'IAH'"
                },
                "destination": {
                    "type": "string",
                    "description": "Arrival city or airport as the user said it"
                },
                "departure_date": {
                    "type": "string",
                    "description": "Departure date as the user said it, e.g. 'March 3' or '2026-03-03'"
                },
                "return_date": {
                    "type": "string",
                    "description": "Return date for round trips, if the user gave one"
                },
                "adults": {
                    "type": "integer",
                    "description": "Number of adult travelers, default 1"
                }
            },
            "required": ["origin", "destination", "departure_date"]
        }),
    }
}

/// Schema for the booking function. Date and price are optional: when
/// omitted they are rehydrated from the cached search the flight id
/// came from.
pub fn create_flight_booking_schema() -> FunctionSchema {
    FunctionSchema {
        name: CREATE_FLIGHT_BOOKING.to_string(),
        description:
            "Book a flight previously returned by search_flights for the given passengers"
                .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "flight_id": {
                    "type": "string",
                    "description": "Id of the chosen flight from the search results"
                },
                "departure_date": {
                    "type": "string",
                    "description": "Departure date, if the user restated it"
                },
                "return_date": {
                    "type": "string",
                    "description": "Return date, if any"
                },
                "total_price": {
                    "type": "number",
                    "description": "Total price, if the user restated it"
                },
                "currency": {
                    "type": "string",
                    "description": "Price currency, e.g. USD"
                },
                "passengers": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "first_name": { "type": "string" },
                            "last_name": { "type": "string" },
                            "date_of_birth": { "type": "string" },
                            "nationality": { "type": "string" },
                            "email": { "type": "string" },
                            "phone": { "type": "string" },
                            "passport_number": { "type": "string" },
                            "passport_expiry": { "type": "string" },
                            "meal_preference": { "type": "string" },
                            "seat_preference": { "type": "string" },
                            "special_requests": { "type": "string" }
                        },
                        "required": [
                            "title", "first_name", "last_name", "date_of_birth",
                            "nationality", "email", "phone"
                        ]
                    }
                }
            },
            "required": ["flight_id", "passengers"]
        }),
    }
}

/// Both function schemas, in the order they are advertised.
pub fn all_schemas() -> Vec<FunctionSchema> {
    vec![search_flights_schema(), create_flight_booking_schema()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names() {
        let schemas = all_schemas();
        let names: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["search_flights", "create_flight_booking"]);
    }

    #[test]
    fn test_search_schema_requires_route_and_date() {
        let schema = search_flights_schema();
        let required = schema.parameters["required"].as_array().unwrap();
        for field in ["origin", "destination", "departure_date"] {
            assert!(required.iter().any(|v| v == field), "missing {}", field);
        }
    }

    #[test]
    fn test_booking_schema_passenger_fields() {
        let schema = create_flight_booking_schema();
        let required = schema.parameters["properties"]["passengers"]["items"]["required"]
            .as_array()
            .unwrap();
        assert_eq!(required.len(), 7);
    }
}
