use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::flight::CanonicalFlight;

/// Parameters of one executed search: the raw user phrases, the codes
/// and dates they resolved to, and the passenger count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchContext {
    pub origin_raw: String,
    pub destination_raw: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub adults: u32,
}

/// A SearchContext paired with the flights it returned. This is the
/// payload cached on a sentinel conversation message so a later
/// "book option 2" can be resolved without re-asking for details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSearch {
    pub context: SearchContext,
    pub flights: Vec<CanonicalFlight>,
}

/// Metadata discriminator for sentinel cache messages.
pub const SEARCH_CACHE_KIND: &str = "flight_search_results";

impl CachedSearch {
    /// Wrap into the metadata blob stored on a sentinel message.
    pub fn to_metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "kind": SEARCH_CACHE_KIND,
            "search": self,
        })
    }

    /// Recover from a sentinel message's metadata, if it carries one.
    pub fn from_metadata(metadata: &serde_json::Value) -> Option<Self> {
        if metadata.get("kind")?.as_str()? != SEARCH_CACHE_KIND {
            return None;
        }
        serde_json::from_value(metadata.get("search")?.clone()).ok()
    }
}
