pub mod client;
pub mod retry;

pub use client::{HttpCallError, ResilientClient};
pub use retry::{backoff_delay, retry_async, RetryPolicy};
