use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use tokio::time::sleep;

use crate::retry::{backoff_delay, RetryPolicy};

/// Terminal outcome of a resilient HTTP call.
#[derive(Debug, thiserror::Error)]
pub enum HttpCallError {
    /// 401: credentials are missing or rejected. A configuration
    /// problem, never retried.
    #[error("{service} rejected the configured credentials (401)")]
    Unauthorized { service: String },

    /// Any other 4xx: the request itself is wrong. Not retried; the
    /// response body is surfaced for diagnostics.
    #[error("{service} rejected the request ({status}): {body}")]
    Rejected {
        service: String,
        status: u16,
        body: String,
    },

    /// Every attempt failed with a retryable error.
    #[error("{service} failed after {attempts} attempts: {last_error}")]
    Exhausted {
        service: String,
        attempts: u32,
        last_error: String,
    },
}

impl HttpCallError {
    pub fn service(&self) -> &str {
        match self {
            HttpCallError::Unauthorized { service }
            | HttpCallError::Rejected { service, .. }
            | HttpCallError::Exhausted { service, .. } => service,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, HttpCallError::Unauthorized { .. })
    }
}

/// How a response status steers the retry loop.
#[derive(Debug, PartialEq)]
enum StatusClass {
    Success,
    Unauthorized,
    Throttled,
    ServerError,
    ClientError,
}

fn classify(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Success
    } else if status == StatusCode::UNAUTHORIZED {
        StatusClass::Unauthorized
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        StatusClass::Throttled
    } else if status.is_server_error() {
        StatusClass::ServerError
    } else {
        StatusClass::ClientError
    }
}

/// `Retry-After` in delta-seconds form. The HTTP-date form is rare from
/// the APIs involved and falls back to the backoff schedule.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Retrying HTTP wrapper used by both the LLM call and the provider
/// calls. 2xx succeeds; 401 and other 4xx fail immediately; 429, 5xx
/// and transport failures retry with exponential backoff, honoring
/// `Retry-After` on 429.
pub struct ResilientClient {
    http: reqwest::Client,
    policy: RetryPolicy,
}

impl ResilientClient {
    pub fn new(policy: RetryPolicy, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { http, policy })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `build` to produce a fresh request per attempt and drive it
    /// through the retry schedule.
    pub async fn execute<F>(&self, service: &str, build: F) -> Result<reqwest::Response, HttpCallError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let max = self.policy.max_attempts;
        let mut last_error = String::new();

        for attempt in 1..=max {
            let outcome = build(&self.http).send().await;

            let delay = match outcome {
                Err(err) => {
                    last_error = format!("transport error: {}", err);
                    backoff_delay(&self.policy, attempt)
                }
                Ok(response) => match classify(response.status()) {
                    StatusClass::Success => return Ok(response),
                    StatusClass::Unauthorized => {
                        return Err(HttpCallError::Unauthorized {
                            service: service.to_string(),
                        })
                    }
                    StatusClass::ClientError => {
                        let status = response.status().as_u16();
                        let body = response.text().await.unwrap_or_default();
                        return Err(HttpCallError::Rejected {
                            service: service.to_string(),
                            status,
                            body,
                        });
                    }
                    StatusClass::Throttled => {
                        last_error = format!("{} throttled the request (429)", service);
                        retry_after(response.headers())
                            .unwrap_or_else(|| backoff_delay(&self.policy, attempt))
                    }
                    StatusClass::ServerError => {
                        last_error = format!("{} returned {}", service, response.status());
                        backoff_delay(&self.policy, attempt)
                    }
                },
            };

            if attempt < max {
                tracing::warn!(
                    "{} attempt {}/{} failed ({}), retrying in {:?}",
                    service,
                    attempt,
                    max,
                    last_error,
                    delay
                );
                sleep(delay).await;
            }
        }

        Err(HttpCallError::Exhausted {
            service: service.to_string(),
            attempts: max,
            last_error,
        })
    }
}
