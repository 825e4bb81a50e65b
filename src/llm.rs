//! Generation service abstraction
//!
//! Provides a common streaming interface over the text-completion service
//! and the consumer that turns a stream into one completed turn.

mod error;
mod ndjson;
mod ollama;
mod stream;
mod types;

#[cfg(test)]
pub mod testing;

pub use error::{LlmError, LlmErrorKind};
pub use ollama::{OllamaClient, DEFAULT_OLLAMA_BASE_URL};
pub use stream::{collect_completion, open_stream, StreamControl};
pub use types::*;

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;

/// Common interface for streaming generation services
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Open one completion stream for `request`.
    ///
    /// Each call issues a fresh request; a stream cannot be resumed. Failing
    /// to open the stream (unreachable service, failure status) is reported
    /// here, failures after that arrive as `Err` items of the stream.
    async fn stream(&self, request: &GenerationRequest) -> Result<ChunkStream, LlmError>;
}

#[async_trait]
impl<T: GenerationClient + ?Sized> GenerationClient for Arc<T> {
    async fn stream(&self, request: &GenerationRequest) -> Result<ChunkStream, LlmError> {
        (**self).stream(request).await
    }
}

/// Logging wrapper for generation clients
pub struct LoggingClient {
    inner: Arc<dyn GenerationClient>,
}

impl LoggingClient {
    pub fn new(inner: Arc<dyn GenerationClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl GenerationClient for LoggingClient {
    async fn stream(&self, request: &GenerationRequest) -> Result<ChunkStream, LlmError> {
        let start = Instant::now();
        let model = request.model.clone();

        let stream = match self.inner.stream(request).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(
                    model = %model,
                    duration_ms = %start.elapsed().as_millis(),
                    error = %e.message,
                    kind = %e.kind,
                    "Generation request failed"
                );
                return Err(e);
            }
        };

        tracing::debug!(
            model = %model,
            prompt_chars = request.prompt.len(),
            "Generation stream opened"
        );

        let mut fragments = 0usize;
        let logged = stream.inspect(move |item| match item {
            Ok(GenerationChunk::Text(_)) => fragments += 1,
            Ok(GenerationChunk::Done) => {
                tracing::info!(
                    model = %model,
                    duration_ms = %start.elapsed().as_millis(),
                    fragments,
                    "Generation completed"
                );
            }
            Ok(GenerationChunk::Error(message)) => {
                tracing::error!(
                    model = %model,
                    duration_ms = %start.elapsed().as_millis(),
                    error = %message,
                    "Generation service reported an error"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %model,
                    duration_ms = %start.elapsed().as_millis(),
                    error = %e.message,
                    kind = %e.kind,
                    retryable = e.kind.is_retryable(),
                    "Generation stream failed"
                );
            }
        });

        Ok(Box::pin(logged))
    }
}
