use wayfare_core::conversation::{MessageRole, StoredMessage};
use wayfare_core::flight::CanonicalFlight;
use wayfare_core::search::{CachedSearch, SearchContext};

/// Only this many cached searches are considered, most recent first.
pub const CACHE_SCAN_LIMIT: usize = 5;

/// Recover the flight a booking request refers to from the
/// conversation's cached search messages. Explicitly supplied fields
/// are overlaid by the caller afterwards; if nothing matches the
/// booking must fail rather than guess.
pub fn find_cached_flight(
    messages: &[StoredMessage],
    flight_id: &str,
) -> Option<(SearchContext, CanonicalFlight)> {
    let caches: Vec<CachedSearch> = messages
        .iter()
        .rev()
        .filter(|m| m.role == MessageRole::System)
        .filter_map(|m| m.metadata.as_ref().and_then(CachedSearch::from_metadata))
        .take(CACHE_SCAN_LIMIT)
        .collect();

    for cached in &caches {
        if let Some(flight) = cached.flights.iter().find(|f| f.id == flight_id) {
            return Some((cached.context.clone(), flight.clone()));
        }
    }

    // The model sometimes refers to "option 2" by ordinal instead of
    // the id. Fall back to a 1-based index into the latest search.
    if let Ok(ordinal) = flight_id.trim().parse::<usize>() {
        if let Some(latest) = caches.first() {
            if ordinal >= 1 {
                if let Some(flight) = latest.flights.get(ordinal - 1) {
                    return Some((latest.context.clone(), flight.clone()));
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;
    use wayfare_core::flight::Money;

    fn context(origin: &str) -> SearchContext {
        SearchContext {
            origin_raw: origin.to_string(),
            destination_raw: "DFW".to_string(),
            origin: origin.to_string(),
            destination: "DFW".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            return_date: None,
            adults: 1,
        }
    }

    fn flight(id: &str) -> CanonicalFlight {
        CanonicalFlight {
            id: id.to_string(),
            price: Money::new(200.0, "USD"),
            segments: vec![],
            stops: 0,
            duration: None,
        }
    }

    fn cache_message(seq: i64, cached: &CachedSearch) -> StoredMessage {
        StoredMessage {
            id: Uuid::new_v4(),
            conversation_id: Uuid::nil(),
            role: MessageRole::System,
            content: "Cached flight search results".to_string(),
            metadata: Some(cached.to_metadata()),
            created_at: Utc.timestamp_opt(1_700_000_000 + seq, 0).single().unwrap(),
        }
    }

    fn user_message(seq: i64) -> StoredMessage {
        StoredMessage {
            id: Uuid::new_v4(),
            conversation_id: Uuid::nil(),
            role: MessageRole::User,
            content: "hi".to_string(),
            metadata: None,
            created_at: Utc.timestamp_opt(1_700_000_000 + seq, 0).single().unwrap(),
        }
    }

    #[test]
    fn test_finds_flight_by_id() {
        let cached = CachedSearch { context: context("IAH"), flights: vec![flight("F1"), flight("F2")] };
        let messages = vec![user_message(0), cache_message(1, &cached)];

        let (ctx, found) = find_cached_flight(&messages, "F2").unwrap();
        assert_eq!(found.id, "F2");
        assert_eq!(ctx.origin, "IAH");
    }

    #[test]
    fn test_most_recent_cache_wins_on_duplicate_ids() {
        let older = CachedSearch { context: context("IAH"), flights: vec![flight("F1")] };
        let newer = CachedSearch { context: context("HOU"), flights: vec![flight("F1")] };
        let messages = vec![cache_message(0, &older), cache_message(1, &newer)];

        let (ctx, _) = find_cached_flight(&messages, "F1").unwrap();
        assert_eq!(ctx.origin, "HOU");
    }

    #[test]
    fn test_scan_bounded_to_last_five_caches() {
        let mut messages = Vec::new();
        // The oldest cache holds the flight; six newer ones push it out.
        let target = CachedSearch { context: context("IAH"), flights: vec![flight("OLD")] };
        messages.push(cache_message(0, &target));
        for i in 1..=6 {
            let filler = CachedSearch { context: context("HOU"), flights: vec![flight(&format!("N{}", i))] };
            messages.push(cache_message(i, &filler));
        }

        assert!(find_cached_flight(&messages, "OLD").is_none());
        assert!(find_cached_flight(&messages, "N6").is_some());
    }

    #[test]
    fn test_ordinal_fallback_uses_latest_search() {
        let cached = CachedSearch { context: context("IAH"), flights: vec![flight("F1"), flight("F2")] };
        let messages = vec![cache_message(0, &cached)];

        let (_, found) = find_cached_flight(&messages, "2").unwrap();
        assert_eq!(found.id, "F2");
        assert!(find_cached_flight(&messages, "3").is_none());
        assert!(find_cached_flight(&messages, "0").is_none());
    }

    #[test]
    fn test_no_cache_returns_none() {
        let messages = vec![user_message(0)];
        assert!(find_cached_flight(&messages, "F1").is_none());
    }
}
