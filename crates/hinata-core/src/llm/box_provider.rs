//! Type-erased provider handle.
//!
//! `LlmProvider::complete` returns `impl Future`, so the trait cannot be used
//! as `dyn LlmProvider`. [`ErasedProvider`] boxes the future instead, and
//! [`BoxLlmProvider`] keeps one behind an `Arc` so a chain can mix provider
//! types and hand out cheap clones.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hinata_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::provider::LlmProvider;

type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;

/// Object-safe mirror of [`LlmProvider`]. Implemented for every provider.
trait ErasedProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    fn complete_erased<'a>(&'a self, request: &'a CompletionRequest) -> CompletionFuture<'a>;
}

impl<P: LlmProvider> ErasedProvider for P {
    fn provider_name(&self) -> &str {
        self.name()
    }

    fn complete_erased<'a>(&'a self, request: &'a CompletionRequest) -> CompletionFuture<'a> {
        Box::pin(self.complete(request))
    }
}

/// Shared, type-erased [`LlmProvider`].
///
/// Itself implements `LlmProvider`, so code generic over providers accepts it
/// unchanged.
#[derive(Clone)]
pub struct BoxLlmProvider(Arc<dyn ErasedProvider>);

impl BoxLlmProvider {
    pub fn new<P: LlmProvider + 'static>(provider: P) -> Self {
        Self(Arc::new(provider))
    }
}

impl LlmProvider for BoxLlmProvider {
    fn name(&self) -> &str {
        self.0.provider_name()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.0.complete_erased(request).await
    }
}

impl fmt::Debug for BoxLlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoxLlmProvider").field(&self.name()).finish()
    }
}
