pub mod amadeus;
pub mod chain;
pub mod client;
pub mod kiwi;

pub use amadeus::AmadeusProvider;
pub use chain::{ProviderChain, SearchChainError};
pub use client::{FlightProvider, ProviderError, SearchQuery};
pub use kiwi::KiwiProvider;
