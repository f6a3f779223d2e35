//! The model client seam.
//!
//! [`ModelClient`] is what the relay calls; [`Ollama`](crate::llms::Ollama)
//! is the production implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::message::{Completion, Prompt};
use crate::stream::ChunkStream;

/// A connection to a model runtime.
///
/// Implementations are configured once at construction and never retry:
/// callers see each upstream failure exactly once.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate the full completion for a prompt.
    ///
    /// # Errors
    ///
    /// Returns an [`UpstreamError`] if the runtime is unreachable, times out,
    /// or answers with an error or a malformed payload.
    async fn complete(&self, prompt: &Prompt) -> Result<Completion, UpstreamError>;

    /// Start an incremental generation.
    ///
    /// The returned stream is lazy: no request is sent until it is first
    /// polled. Dropping it aborts the upstream call.
    fn stream(&self, prompt: &Prompt) -> ChunkStream;

    /// Name of the runtime, used in logs and error messages.
    fn provider_name(&self) -> &'static str;

    /// Model identifier requests are sent with.
    fn model(&self) -> &str;
}

/// Type alias for an Arc-wrapped [`ModelClient`].
pub type SharedModelClient = Arc<dyn ModelClient>;
