//! Mapping HTTP/reqwest failures to [`ProviderError`].

use cohort_turn::ProviderError;

/// Map an HTTP status code from the Anthropic API to a [`ProviderError`].
///
/// Reference: <https://docs.anthropic.com/en/api/errors>
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthFailed(body.to_string()),
        429 => ProviderError::RateLimited,
        // 529 is Anthropic's overloaded status.
        500..=599 => ProviderError::RequestFailed(format!("HTTP {status}: {body}")),
        _ => ProviderError::InvalidResponse(format!("HTTP {status}: {body}")),
    }
}

/// Map a [`reqwest::Error`] to a [`ProviderError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    ProviderError::RequestFailed(err.to_string())
}
