//! FnProvider: answers each request with a closure.

use crate::provider::{Provider, ProviderError};
use crate::types::{ProviderRequest, ProviderResponse};
use std::future::Future;
use std::sync::Mutex;

/// A provider whose responses are computed from the request.
///
/// Useful when many agents share one provider concurrently and a fixed
/// queue would hand responses to whichever agent asks first.
pub struct FnProvider<F> {
    respond: F,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl<F> FnProvider<F>
where
    F: Fn(&ProviderRequest) -> Result<ProviderResponse, ProviderError> + Send + Sync,
{
    /// Wrap a response function.
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl<F> Provider for FnProvider<F>
where
    F: Fn(&ProviderRequest) -> Result<ProviderResponse, ProviderError> + Send + Sync,
{
    fn complete(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        let result = (self.respond)(&request);
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);
        async move { result }
    }
}
