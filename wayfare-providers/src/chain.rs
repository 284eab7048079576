use std::sync::Arc;

use wayfare_core::CanonicalFlight;

use crate::client::{FlightProvider, SearchQuery};

/// Chain-level failure. Distinct from a transport failure so the caller
/// can present a helpful empty-results message instead of a generic
/// error.
#[derive(Debug, thiserror::Error)]
pub enum SearchChainError {
    #[error("no flight providers are configured")]
    NoProviders,

    #[error("no results from any provider: {}", .outcomes.join("; "))]
    NoResults { outcomes: Vec<String> },
}

/// Prioritized list of flight-search backends. Providers are tried
/// strictly in order; each exhausts its own retry schedule before falling
/// through. The first provider to return a non-empty result wins.
pub struct ProviderChain {
    providers: Vec<Arc<dyn FlightProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn FlightProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn search(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<CanonicalFlight>, SearchChainError> {
        if self.providers.is_empty() {
            return Err(SearchChainError::NoProviders);
        }

        let mut outcomes = Vec::new();
        for provider in &self.providers {
            match provider.search(query).await {
                Ok(flights) if !flights.is_empty() => {
                    tracing::info!(
                        "{} returned {} flights for {} -> {}",
                        provider.name(),
                        flights.len(),
                        query.origin,
                        query.destination
                    );
                    return Ok(flights);
                }
                Ok(_) => {
                    tracing::info!(
                        "{} returned no flights for {} -> {}, trying next provider",
                        provider.name(),
                        query.origin,
                        query.destination
                    );
                    outcomes.push(format!("{}: returned no flights", provider.name()));
                }
                Err(err) => {
                    tracing::warn!(
                        "{} failed for {} -> {}: {}",
                        provider.name(),
                        query.origin,
                        query.destination,
                        err
                    );
                    outcomes.push(format!("{}: {}", provider.name(), err));
                }
            }
        }

        Err(SearchChainError::NoResults { outcomes })
    }
}
