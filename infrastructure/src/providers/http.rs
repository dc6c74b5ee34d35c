//! Shared HTTP plumbing for the network-backed adapters.

use ace_application::GatewayError;
use std::time::Duration;
use tracing::warn;

/// Longest error body echoed back in a `GatewayError`.
const MAX_ERROR_BODY: usize = 512;

/// Build the HTTP client shared by every request of one adapter.
///
/// Only the connect phase gets a hard timeout here; stalls mid-response are
/// caught by the stream's idle timeout instead, because a full-request
/// timeout would cut off long generations.
pub(crate) fn build_client(connect_timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
}

/// Join a base URL and an API path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Map a transport-level failure to a gateway error.
pub(crate) fn map_send_error(error: reqwest::Error) -> GatewayError {
    if error.is_decode() || error.is_body() {
        GatewayError::BackendProtocol(error.to_string())
    } else {
        GatewayError::BackendUnavailable(error.to_string())
    }
}

/// Send `request`, waiting at most `timeout` for the response headers.
pub(crate) async fn send(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<reqwest::Response, GatewayError> {
    let response = tokio::time::timeout(timeout, request.send())
        .await
        .map_err(|_| GatewayError::Timeout(timeout))?
        .map_err(map_send_error)?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    let body = truncate(&body, MAX_ERROR_BODY);
    warn!("Backend request failed with status {}: {}", status, body);
    Err(GatewayError::BackendProtocol(format!(
        "status {}: {}",
        status, body
    )))
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(
            join_url("http://localhost:11434/", "/api/chat"),
            "http://localhost:11434/api/chat"
        );
        assert_eq!(
            join_url("https://api.openai.com", "v1/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("short", 100), "short");
    }
}
