//! Shared request helpers: client construction and error classification.

use std::time::Duration;

use pitch_core::upstream::UpstreamError;

/// Longest slice of an error body kept in a failure message.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Build a client whose every request is bounded by `timeout_secs`.
pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

/// Classify a failure while sending the request or reading the response.
pub(crate) fn classify(service: &'static str, timeout_secs: u64, err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout {
            service,
            timeout_secs,
        }
    } else if err.is_decode() {
        UpstreamError::InvalidResponse {
            service,
            message: err.to_string(),
        }
    } else {
        UpstreamError::Rejected {
            service,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Pass 2xx responses through; turn anything else into
/// [`UpstreamError::Rejected`] carrying the status and a body excerpt.
///
/// `describe` extracts a provider-specific message from the error body.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
    describe: fn(&str) -> Option<String>,
) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    let detail = describe(&body).unwrap_or_else(|| truncate(&body));

    Err(UpstreamError::Rejected {
        service,
        status: Some(status.as_u16()),
        message: format!("HTTP {}: {detail}", status.as_u16()),
    })
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{head}...")
    }
}
