use async_trait::async_trait;
use chrono::NaiveDate;

use wayfare_core::CanonicalFlight;
use wayfare_http::HttpCallError;

/// Resolved search parameters handed to every adapter.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub adults: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Http(#[from] HttpCallError),

    #[error("{provider} returned an unreadable payload: {detail}")]
    Malformed { provider: String, detail: String },
}

/// One flight-search backend. Each adapter owns the mapping from its
/// native response shape into CanonicalFlight.
#[async_trait]
pub trait FlightProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<CanonicalFlight>, ProviderError>;
}
