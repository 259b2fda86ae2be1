//! ScriptedProvider: replays canned responses in order.

use crate::provider::{Provider, ProviderError};
use crate::types::{ProviderRequest, ProviderResponse};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

/// A provider that returns queued responses in order.
///
/// Once the queue is drained it returns the fallback response if one
/// was set, otherwise `ProviderError::RequestFailed`.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    fallback: Option<ProviderResponse>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    /// Queue successful responses.
    pub fn new(responses: impl IntoIterator<Item = ProviderResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok))
    }

    /// Queue responses and errors.
    pub fn with_results(
        results: impl IntoIterator<Item = Result<ProviderResponse, ProviderError>>,
    ) -> Self {
        Self {
            script: Mutex::new(results.into_iter().collect()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Respond with `response` forever once the queue is empty.
    pub fn with_fallback(mut self, response: ProviderResponse) -> Self {
        self.fallback = Some(response);
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Provider for ScriptedProvider {
    fn complete(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);
        let next = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        let result = match next {
            Some(result) => result,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ProviderError::RequestFailed("script exhausted".into())),
        };
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_then_fails() {
        let provider = ScriptedProvider::new([
            ProviderResponse::text("first"),
            ProviderResponse::text("second"),
        ]);
        let request = ProviderRequest::default();

        let first = provider.complete(request.clone()).await.unwrap();
        assert_eq!(first.text_content(), "first");
        let second = provider.complete(request.clone()).await.unwrap();
        assert_eq!(second.text_content(), "second");
        let err = provider.complete(request).await.unwrap_err();
        assert!(matches!(err, ProviderError::RequestFailed(_)));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn fallback_repeats_forever() {
        let provider = ScriptedProvider::new(Vec::<ProviderResponse>::new())
            .with_fallback(ProviderResponse::text("again"));
        for _ in 0..3 {
            let response = provider.complete(ProviderRequest::default()).await.unwrap();
            assert_eq!(response.text_content(), "again");
        }
    }
}
