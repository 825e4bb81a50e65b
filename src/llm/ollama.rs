//! Ollama `/api/generate` streaming client
//!
//! A background task reads the HTTP body, frames it into NDJSON lines and
//! forwards decoded chunks over a bounded channel. The caller reads the other
//! end as a `ChunkStream`; dropping that stream cancels the reader task.

use super::ndjson::{decode_line, LineDecoder};
use super::types::{ChunkStream, GenerationChunk, GenerationRequest, SamplingParams};
use super::{GenerationClient, LlmError};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Default Ollama base URL
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Chunks buffered between the body reader and the consumer
const CHANNEL_CAPACITY: usize = 64;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Streaming client for an Ollama-compatible generation service
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Result<Self, LlmError> {
        // No overall request timeout: completions stream for as long as the
        // model talks. Stalls are bounded by the consumer's idle deadline.
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| LlmError::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

#[async_trait]
impl GenerationClient for OllamaClient {
    async fn stream(&self, request: &GenerationRequest) -> Result<ChunkStream, LlmError> {
        let body = OllamaGenerateRequest::from(request);

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::transport(format!("Connection failed: {e}"))
                } else if e.is_timeout() {
                    LlmError::timeout(format!("Request timeout: {e}"))
                } else {
                    LlmError::transport(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| LlmError::transport(format!("Failed to read response: {e}")))?;
            if let Ok(error_resp) = serde_json::from_str::<OllamaErrorResponse>(&body) {
                return Err(LlmError::protocol(format!(
                    "HTTP {status}: {}",
                    error_resp.error
                )));
            }
            return Err(LlmError::transport(format!("HTTP {status} error: {body}")));
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let reader_cancel = CancellationToken::new();
        let token = reader_cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;

                () = token.cancelled() => {
                    tracing::debug!("Stream reader dropped, abandoning response body");
                }

                () = pump_ndjson(response.bytes_stream(), tx) => {}
            }
        });

        Ok(Box::pin(GuardedStream {
            inner: ReceiverStream::new(rx),
            _guard: reader_cancel.drop_guard(),
        }))
    }
}

/// Read a byte stream to its terminal chunk, forwarding decoded chunks.
///
/// Exactly one terminal item is sent: `Done`, `Error`, or an `Err` for a
/// malformed line, a body read failure, or a body that ends without `done`.
async fn pump_ndjson<S, B, E>(body: S, tx: mpsc::Sender<Result<GenerationChunk, LlmError>>)
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut body = std::pin::pin!(body);
    let mut decoder = LineDecoder::new();

    while let Some(next) = body.next().await {
        let bytes = match next {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx
                    .send(Err(LlmError::transport(format!("Stream interrupted: {e}"))))
                    .await;
                return;
            }
        };

        for line in decoder.push(bytes.as_ref()) {
            if forward_line(&line, &tx).await.is_break() {
                return;
            }
        }
    }

    if let Some(line) = decoder.finish() {
        if forward_line(&line, &tx).await.is_break() {
            return;
        }
    }

    let _ = tx
        .send(Err(LlmError::transport(
            "Stream closed before the completion was done",
        )))
        .await;
}

/// Forward one line's chunks; break on a terminal chunk or a gone reader
async fn forward_line(
    line: &[u8],
    tx: &mpsc::Sender<Result<GenerationChunk, LlmError>>,
) -> ControlFlow<()> {
    match decode_line(line) {
        Ok(chunks) => {
            for chunk in chunks {
                let terminal = chunk.is_terminal();
                if tx.send(Ok(chunk)).await.is_err() || terminal {
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        }
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            ControlFlow::Break(())
        }
    }
}

/// Receiver half that cancels the reader task when dropped
struct GuardedStream {
    inner: ReceiverStream<Result<GenerationChunk, LlmError>>,
    _guard: DropGuard,
}

impl Stream for GuardedStream {
    type Item = Result<GenerationChunk, LlmError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(flatten)]
    sampling: SamplingParams,
}

impl<'a> From<&'a GenerationRequest> for OllamaGenerateRequest<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            model: &request.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            sampling: request.sampling,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaErrorResponse {
    error: String,
}
