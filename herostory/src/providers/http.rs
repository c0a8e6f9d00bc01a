//! Response handling shared by the HTTP clients.
//!
//! Transport errors lose their request URL before becoming a
//! [`GenerationError`].

use crate::errors::GenerationError;
use std::time::Duration;

/// Maps a `reqwest` failure to a provider error without the request URL.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> GenerationError {
    let err = err.without_url();
    if err.is_timeout() {
        GenerationError::provider(provider, format!("request timed out: {err}"))
    } else {
        GenerationError::provider(provider, err.to_string())
    }
}

/// Builds a client with a per-request timeout.
pub(crate) fn client(provider: &str, timeout_secs: u64) -> Result<reqwest::Client, GenerationError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| transport_error(provider, e))
}

/// Passes a success response through, otherwise reads the body into a
/// status-carrying provider error.
pub(crate) async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GenerationError::provider_status(provider, status.as_u16(), body))
}
