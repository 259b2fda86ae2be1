//! Provider trait for language-model backends.
//!
//! The [`Provider`] trait uses RPITIT (return-position `impl Trait` in
//! traits) and is intentionally NOT object-safe. Sessions and the
//! orchestrator are generic over `P: Provider` and share one backend
//! through an `Arc<P>`.

use crate::types::{ProviderRequest, ProviderResponse};
use std::future::Future;
use thiserror::Error;

/// Errors from language-model backends.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP or network request failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Provider rate-limited the request.
    #[error("rate limited")]
    RateLimited,

    /// Authentication/authorization failed.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// Could not parse the provider's response, or it was unusable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// Whether retrying this request might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited | ProviderError::RequestFailed(_)
        )
    }
}

/// Language-model backend interface.
///
/// Accepts a transcript plus tool schemas and returns text, a tool-call
/// request, or both, already converted into [`ContentPart`](crate::ContentPart)s.
pub trait Provider: Send + Sync {
    /// Send a completion request to the backend.
    fn complete(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send;
}
