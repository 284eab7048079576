use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use wayfare_core::booking::{BookingDraft, PassengerDetails};
use wayfare_core::cities::{resolve_city, CityResolution};
use wayfare_core::conversation::{MessageRole, NewMessage};
use wayfare_core::dates::resolve_date;
use wayfare_core::flight::Money;
use wayfare_core::repository::ConversationRepository;
use wayfare_core::search::{CachedSearch, SearchContext};
use wayfare_http::{retry_async, RetryPolicy};
use wayfare_llm::schemas::{CREATE_FLIGHT_BOOKING, SEARCH_FLIGHTS};
use wayfare_llm::FunctionCall;
use wayfare_providers::{ProviderChain, SearchQuery};

use crate::booking_manager::{BookingError, BookingTransactionManager};
use crate::reconstruct::find_cached_flight;

/// How many flights are forwarded to the model for summarization. The
/// full result set still goes into the cache.
const SUMMARY_FLIGHT_LIMIT: usize = 5;

/// The two operations the model may request, matched exhaustively so a
/// third operation is a compile-time-checked addition.
#[derive(Debug)]
pub enum FunctionIntent {
    SearchFlights(SearchArgs),
    CreateBooking(BookingArgs),
}

#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    #[error("model requested unsupported function \"{0}\"")]
    UnknownFunction(String),

    #[error("arguments for {name} did not parse: {detail}")]
    BadArguments { name: &'static str, detail: String },
}

#[derive(Debug, Deserialize)]
pub struct SearchArgs {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub return_date: Option<String>,
    #[serde(default = "default_adults")]
    pub adults: u32,
}

fn default_adults() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct BookingArgs {
    pub flight_id: String,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub total_price: Option<f64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub passengers: Vec<PassengerDetails>,
}

impl FunctionIntent {
    pub fn parse(call: &FunctionCall) -> Result<Self, IntentError> {
        match call.name.as_str() {
            SEARCH_FLIGHTS => {
                let args = serde_json::from_str(&call.arguments).map_err(|e| {
                    IntentError::BadArguments {
                        name: SEARCH_FLIGHTS,
                        detail: e.to_string(),
                    }
                })?;
                Ok(FunctionIntent::SearchFlights(args))
            }
            CREATE_FLIGHT_BOOKING => {
                let args = serde_json::from_str(&call.arguments).map_err(|e| {
                    IntentError::BadArguments {
                        name: CREATE_FLIGHT_BOOKING,
                        detail: e.to_string(),
                    }
                })?;
                Ok(FunctionIntent::CreateBooking(args))
            }
            other => Err(IntentError::UnknownFunction(other.to_string())),
        }
    }
}

/// What handling one function call produced.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Clarification or corrective text, returned to the user directly.
    Reply(String),
    /// Successful function execution; the payload goes back to the
    /// model for a natural-language summary.
    FunctionResult {
        name: &'static str,
        payload: serde_json::Value,
    },
}

/// Routes a parsed function call to the search or booking handler.
/// Handler failures are converted into user-facing corrective messages
/// here; nothing propagates past the dispatcher.
pub struct FunctionDispatcher {
    chain: Arc<ProviderChain>,
    conversations: Arc<dyn ConversationRepository>,
    bookings: BookingTransactionManager,
    storage_retry: RetryPolicy,
}

impl FunctionDispatcher {
    pub fn new(
        chain: Arc<ProviderChain>,
        conversations: Arc<dyn ConversationRepository>,
        bookings: BookingTransactionManager,
        storage_retry: RetryPolicy,
    ) -> Self {
        Self {
            chain,
            conversations,
            bookings,
            storage_retry,
        }
    }

    pub async fn dispatch(
        &self,
        conversation_id: Uuid,
        user_id: &str,
        call: &FunctionCall,
        today: NaiveDate,
    ) -> DispatchOutcome {
        match FunctionIntent::parse(call) {
            Ok(FunctionIntent::SearchFlights(args)) => {
                self.handle_search(conversation_id, args, today).await
            }
            Ok(FunctionIntent::CreateBooking(args)) => {
                self.handle_booking(conversation_id, user_id, args, today).await
            }
            Err(err) => {
                tracing::warn!("rejected function call: {}", err);
                DispatchOutcome::Reply(
                    "I wasn't able to act on that. Could you rephrase your request?".to_string(),
                )
            }
        }
    }

    async fn handle_search(
        &self,
        conversation_id: Uuid,
        args: SearchArgs,
        today: NaiveDate,
    ) -> DispatchOutcome {
        // Ambiguous inputs never reach a provider; ask first.
        let mut clarifications = Vec::new();

        let origin = match resolve_endpoint(&args.origin, "from", &mut clarifications) {
            Some(code) => code,
            None => String::new(),
        };
        let destination = match resolve_endpoint(&args.destination, "to", &mut clarifications) {
            Some(code) => code,
            None => String::new(),
        };
        if !clarifications.is_empty() {
            return DispatchOutcome::Reply(clarifications.join(" "));
        }

        let departure_date = match resolve_date(&args.departure_date, today) {
            Ok(date) => date,
            Err(_) => {
                return DispatchOutcome::Reply(format!(
                    "I couldn't understand \"{}\" as a date. Could you give it like \"March 3\" or \"2026-03-03\"?",
                    args.departure_date
                ))
            }
        };
        let return_date = match &args.return_date {
            Some(phrase) => match resolve_date(phrase, today) {
                Ok(date) => Some(date),
                Err(_) => {
                    return DispatchOutcome::Reply(format!(
                        "I couldn't understand \"{}\" as a return date. Could you give it like \"March 10\" or \"2026-03-10\"?",
                        phrase
                    ))
                }
            },
            None => None,
        };

        let query = SearchQuery {
            origin: origin.clone(),
            destination: destination.clone(),
            departure_date,
            return_date,
            adults: args.adults.max(1),
        };

        let flights = match self.chain.search(&query).await {
            Ok(flights) => flights,
            Err(err) => {
                tracing::warn!("flight search failed: {}", err);
                return DispatchOutcome::Reply(format!(
                    "I couldn't find any flights from {} to {} on {}. You could try different dates or nearby airports.",
                    origin,
                    destination,
                    departure_date.format("%B %-d")
                ));
            }
        };

        let context = SearchContext {
            origin_raw: args.origin.clone(),
            destination_raw: args.destination.clone(),
            origin,
            destination,
            departure_date,
            return_date,
            adults: query.adults,
        };
        let cached = CachedSearch {
            context: context.clone(),
            flights: flights.clone(),
        };

        // Cache onto a sentinel message so a later booking request can
        // be reconstructed. Losing the cache degrades booking, not the
        // search itself.
        let sentinel = NewMessage {
            conversation_id,
            role: MessageRole::System,
            content: "Cached flight search results".to_string(),
            metadata: Some(cached.to_metadata()),
        };
        let write = retry_async(
            &self.storage_retry,
            "search cache write",
            || self.conversations.append_message(&sentinel),
            |_| true,
        )
        .await;
        if let Err(err) = write {
            tracing::error!("failed to cache search results: {}", err);
        }

        let summarized: Vec<_> = flights.iter().take(SUMMARY_FLIGHT_LIMIT).collect();
        DispatchOutcome::FunctionResult {
            name: SEARCH_FLIGHTS,
            payload: serde_json::json!({
                "origin": context.origin,
                "destination": context.destination,
                "departure_date": context.departure_date,
                "return_date": context.return_date,
                "adults": context.adults,
                "results_count": flights.len(),
                "flights": summarized,
            }),
        }
    }

    async fn handle_booking(
        &self,
        conversation_id: Uuid,
        user_id: &str,
        args: BookingArgs,
        today: NaiveDate,
    ) -> DispatchOutcome {
        let messages = match self.conversations.list_messages(conversation_id).await {
            Ok(messages) => messages,
            Err(err) => {
                tracing::error!("history lookup failed during booking: {}", err);
                return DispatchOutcome::Reply(
                    "I couldn't look up our conversation just now. Please try booking again in a moment."
                        .to_string(),
                );
            }
        };

        let (context, flight) = match find_cached_flight(&messages, &args.flight_id) {
            Some(found) => found,
            None => {
                return DispatchOutcome::Reply(
                    "I couldn't find that flight in our recent searches. Please run the search again and pick one of the listed options."
                        .to_string(),
                )
            }
        };

        // Overlay: fields the call supplied explicitly win over the
        // cached search context.
        let departure_date = match &args.departure_date {
            Some(phrase) => match resolve_date(phrase, today) {
                Ok(date) => date,
                Err(_) => {
                    return DispatchOutcome::Reply(format!(
                        "I couldn't understand \"{}\" as the departure date. Could you restate it?",
                        phrase
                    ))
                }
            },
            None => context.departure_date,
        };
        let return_date = match &args.return_date {
            Some(phrase) => match resolve_date(phrase, today) {
                Ok(date) => Some(date),
                Err(_) => {
                    return DispatchOutcome::Reply(format!(
                        "I couldn't understand \"{}\" as the return date. Could you restate it?",
                        phrase
                    ))
                }
            },
            None => context.return_date,
        };

        let passenger_count = args.passengers.len().max(1) as f64;
        let total = match args.total_price {
            Some(amount) => Money::new(
                amount,
                args.currency.as_deref().unwrap_or(&flight.price.currency),
            ),
            None => Money::new(flight.price.amount * passenger_count, &flight.price.currency),
        };

        let draft = BookingDraft {
            user_id: user_id.to_string(),
            conversation_id,
            origin_airport: context.origin.clone(),
            destination_airport: context.destination.clone(),
            flight,
            departure_date,
            return_date,
            total,
            passengers: args.passengers,
        };

        match self.bookings.create(draft).await {
            Ok(confirmation) => DispatchOutcome::FunctionResult {
                name: CREATE_FLIGHT_BOOKING,
                payload: serde_json::json!({
                    "booking_reference": confirmation.booking_reference,
                    "booking_id": confirmation.booking_id,
                    "status": confirmation.status,
                    "total_amount": confirmation.total_amount,
                    "currency": confirmation.currency,
                }),
            },
            Err(BookingError::Validation(message)) => DispatchOutcome::Reply(message),
            Err(BookingError::Storage(detail)) => {
                tracing::error!("booking write failed: {}", detail);
                DispatchOutcome::Reply(
                    "Something went wrong while saving your booking and it was not created. Please try again."
                        .to_string(),
                )
            }
        }
    }
}

/// Resolve one endpoint phrase, pushing a clarification question when
/// the phrase is ambiguous. Returns the IATA code to search with when
/// resolution is clean.
fn resolve_endpoint(
    phrase: &str,
    direction: &str,
    clarifications: &mut Vec<String>,
) -> Option<String> {
    match resolve_city(phrase) {
        CityResolution::Exact { code } => Some(code),
        CityResolution::Unknown { placeholder } => Some(placeholder),
        CityResolution::MultiAirport { city, options, .. } => {
            let listed: Vec<String> = options
                .iter()
                .map(|o| format!("{} ({})", o.code, o.name))
                .collect();
            clarifications.push(format!(
                "{} has several airports: {}. Which one would you like to fly {}?",
                capitalize(&city),
                listed.join(", "),
                direction
            ));
            None
        }
        CityResolution::Partial { suggestions, .. } => {
            clarifications.push(format!(
                "I couldn't find \"{}\". Did you mean {}?",
                phrase,
                suggestions
                    .iter()
                    .map(|s| capitalize(s))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
            None
        }
    }
}

fn capitalize(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use wayfare_core::flight::{CanonicalFlight, FlightSegment};
    use wayfare_core::repository::BookingRepository;
    use wayfare_providers::{FlightProvider, ProviderError};
    use wayfare_store::{InMemoryBookingRepository, InMemoryConversationRepository};

    struct CountingProvider {
        flights: Vec<CanonicalFlight>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FlightProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn search(
            &self,
            _query: &SearchQuery,
        ) -> Result<Vec<CanonicalFlight>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.flights.clone())
        }
    }

    fn flight(id: &str, amount: f64) -> CanonicalFlight {
        CanonicalFlight {
            id: id.to_string(),
            price: Money::new(amount, "USD"),
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
        }
    }

    struct Fixture {
        dispatcher: FunctionDispatcher,
        conversations: Arc<InMemoryConversationRepository>,
        bookings: Arc<InMemoryBookingRepository>,
        provider_calls: Arc<AtomicUsize>,
        conversation_id: Uuid,
    }

    async fn fixture(flights: Vec<CanonicalFlight>) -> Fixture {
        let conversations = Arc::new(InMemoryConversationRepository::new());
        let bookings = Arc::new(InMemoryBookingRepository::new());
        let provider_calls = Arc::new(AtomicUsize::new(0));

        let chain = Arc::new(ProviderChain::new(vec![Arc::new(CountingProvider {
            flights,
            calls: provider_calls.clone(),
        })]));
        let manager = BookingTransactionManager::new(bookings.clone());
        let dispatcher = FunctionDispatcher::new(
            chain,
            conversations.clone(),
            manager,
            RetryPolicy::new(3, Duration::from_millis(1)),
        );

        let conversation = conversations.create_conversation(Some("u1"), "test").await.unwrap();
        Fixture {
            dispatcher,
            conversations,
            bookings,
            provider_calls,
            conversation_id: conversation.id,
        }
    }

    fn call(name: &str, arguments: serde_json::Value) -> FunctionCall {
        FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
    }

    fn john_smith() -> serde_json::Value {
        serde_json::json!({
            "title": "Mr",
            "first_name": "John",
            "last_name": "Smith",
            "date_of_birth": "1990-01-01",
            "nationality": "US",
            "email": "john@x.com",
            "phone": "555-0100"
        })
    }

    #[tokio::test]
    async fn test_multi_airport_clarifies_without_calling_provider() {
        let fx = fixture(vec![flight("F1", 200.0)]).await;

        let outcome = fx
            .dispatcher
            .dispatch(
                fx.conversation_id,
                "u1",
                &call(
                    SEARCH_FLIGHTS,
                    serde_json::json!({
                        "origin": "Houston",
                        "destination": "Dallas",
                        "departure_date": "next Friday"
                    }),
                ),
                today(),
            )
            .await;

        match outcome {
            DispatchOutcome::Reply(text) => {
                assert!(text.contains("IAH"), "clarification was: {}", text);
                assert!(text.contains("DFW"), "clarification was: {}", text);
            }
            other => panic!("expected clarification, got {:?}", other),
        }
        assert_eq!(fx.provider_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unparseable_date_clarifies() {
        let fx = fixture(vec![flight("F1", 200.0)]).await;

        let outcome = fx
            .dispatcher
            .dispatch(
                fx.conversation_id,
                "u1",
                &call(
                    SEARCH_FLIGHTS,
                    serde_json::json!({
                        "origin": "IAH",
                        "destination": "DFW",
                        "departure_date": "sometime soon"
                    }),
                ),
                today(),
            )
            .await;

        assert!(matches!(outcome, DispatchOutcome::Reply(ref text) if text.contains("date")));
        assert_eq!(fx.provider_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_typo_city_offers_suggestions() {
        let fx = fixture(vec![]).await;

        let outcome = fx
            .dispatcher
            .dispatch(
                fx.conversation_id,
                "u1",
                &call(
                    SEARCH_FLIGHTS,
                    serde_json::json!({
                        "origin": "houstn",
                        "destination": "DFW",
                        "departure_date": "March 3"
                    }),
                ),
                today(),
            )
            .await;

        match outcome {
            DispatchOutcome::Reply(text) => {
                assert!(text.contains("Houston"), "suggestion missing: {}", text)
            }
            other => panic!("expected suggestions, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_caches_results_and_builds_payload() {
        let fx = fixture(vec![flight("F1", 200.0), flight("F2", 250.0)]).await;

        let outcome = fx
            .dispatcher
            .dispatch(
                fx.conversation_id,
                "u1",
                &call(
                    SEARCH_FLIGHTS,
                    serde_json::json!({
                        "origin": "IAH",
                        "destination": "DFW",
                        "departure_date": "March 3"
                    }),
                ),
                today(),
            )
            .await;

        match outcome {
            DispatchOutcome::FunctionResult { name, payload } => {
                assert_eq!(name, SEARCH_FLIGHTS);
                assert_eq!(payload["results_count"], 2);
                assert_eq!(payload["departure_date"], "2026-03-03");
            }
            other => panic!("expected function result, got {:?}", other),
        }

        let messages = fx.conversations.list_messages(fx.conversation_id).await.unwrap();
        let cached = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .filter_map(|m| m.metadata.as_ref().and_then(CachedSearch::from_metadata))
            .next()
            .expect("sentinel cache message missing");
        assert_eq!(cached.flights.len(), 2);
        assert_eq!(cached.context.origin, "IAH");
    }

    #[tokio::test]
    async fn test_end_to_end_search_then_book_from_cache() {
        let fx = fixture(vec![flight("F1", 412.50)]).await;

        // First turn: clean codes, search runs and caches.
        let search = fx
            .dispatcher
            .dispatch(
                fx.conversation_id,
                "u1",
                &call(
                    SEARCH_FLIGHTS,
                    serde_json::json!({
                        "origin": "IAH",
                        "destination": "DFW",
                        "departure_date": "March 3"
                    }),
                ),
                today(),
            )
            .await;
        assert!(matches!(search, DispatchOutcome::FunctionResult { .. }));

        // Follow-up: book option 1; date and price come from the cache.
        let booking = fx
            .dispatcher
            .dispatch(
                fx.conversation_id,
                "u1",
                &call(
                    CREATE_FLIGHT_BOOKING,
                    serde_json::json!({
                        "flight_id": "1",
                        "passengers": [john_smith()]
                    }),
                ),
                today(),
            )
            .await;

        let payload = match booking {
            DispatchOutcome::FunctionResult { name, payload } => {
                assert_eq!(name, CREATE_FLIGHT_BOOKING);
                payload
            }
            other => panic!("expected booking confirmation, got {:?}", other),
        };
        assert_eq!(payload["status"], "confirmed");
        assert_eq!(payload["total_amount"], 412.50);

        let booking_id = payload["booking_id"].as_str().unwrap().parse().unwrap();
        let stored = fx.bookings.get_booking(booking_id).await.unwrap().unwrap();
        assert_eq!(stored.passenger_count, 1);
        assert_eq!(stored.origin_airport, "IAH");
        assert_eq!(
            stored.departure_date,
            NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()
        );
    }

    #[tokio::test]
    async fn test_booking_without_cache_asks_to_search_again() {
        let fx = fixture(vec![]).await;

        let outcome = fx
            .dispatcher
            .dispatch(
                fx.conversation_id,
                "u1",
                &call(
                    CREATE_FLIGHT_BOOKING,
                    serde_json::json!({
                        "flight_id": "F9",
                        "passengers": [john_smith()]
                    }),
                ),
                today(),
            )
            .await;

        assert!(
            matches!(outcome, DispatchOutcome::Reply(ref text) if text.contains("search")),
            "got {:?}",
            outcome
        );
        assert_eq!(fx.bookings.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_explicit_booking_fields_win_over_cache() {
        let fx = fixture(vec![flight("F1", 412.50)]).await;

        fx.dispatcher
            .dispatch(
                fx.conversation_id,
                "u1",
                &call(
                    SEARCH_FLIGHTS,
                    serde_json::json!({
                        "origin": "IAH",
                        "destination": "DFW",
                        "departure_date": "March 3"
                    }),
                ),
                today(),
            )
            .await;

        let booking = fx
            .dispatcher
            .dispatch(
                fx.conversation_id,
                "u1",
                &call(
                    CREATE_FLIGHT_BOOKING,
                    serde_json::json!({
                        "flight_id": "F1",
                        "departure_date": "March 10",
                        "total_price": 999.0,
                        "passengers": [john_smith()]
                    }),
                ),
                today(),
            )
            .await;

        let payload = match booking {
            DispatchOutcome::FunctionResult { payload, .. } => payload,
            other => panic!("expected confirmation, got {:?}", other),
        };
        assert_eq!(payload["total_amount"], 999.0);

        let booking_id = payload["booking_id"].as_str().unwrap().parse().unwrap();
        let stored = fx.bookings.get_booking(booking_id).await.unwrap().unwrap();
        assert_eq!(
            stored.departure_date,
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
        );
    }

    #[tokio::test]
    async fn test_unknown_function_gets_corrective_reply() {
        let fx = fixture(vec![]).await;

        let outcome = fx
            .dispatcher
            .dispatch(
                fx.conversation_id,
                "u1",
                &call("cancel_booking", serde_json::json!({})),
                today(),
            )
            .await;

        assert!(matches!(outcome, DispatchOutcome::Reply(_)));
    }
}
