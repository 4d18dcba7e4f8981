//! Shared HTTP client construction.

use std::time::Duration;

use reqwest::Client;

/// Build the client used by all backend calls.
///
/// The overall request timeout is generous; callers that need a tighter
/// deadline wrap individual requests themselves.
pub fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|_| Client::new())
}
