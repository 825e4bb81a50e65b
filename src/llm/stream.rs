//! Consuming a completion stream
//!
//! Opening the stream and every read race the turn's cancellation token and
//! an optional idle deadline, so a stalled transport cannot block a turn
//! forever.

use super::types::{ChunkStream, GenerationChunk, GenerationRequest};
use super::{GenerationClient, LlmError};
use futures::StreamExt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline applied to each chunk read of a turn
#[derive(Debug, Clone, Default)]
pub struct StreamControl {
    pub cancel: CancellationToken,
    /// Longest wait for the next chunk; `None` waits indefinitely
    pub idle_timeout: Option<Duration>,
}

impl StreamControl {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            idle_timeout: None,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }
}

/// Send `request` and wait for the stream to open, under the same
/// cancellation and deadline as the chunk reads.
pub async fn open_stream(
    client: &dyn GenerationClient,
    request: &GenerationRequest,
    control: &StreamControl,
) -> Result<ChunkStream, LlmError> {
    let open = client.stream(request);
    tokio::select! {
        biased;

        () = control.cancel.cancelled() => Err(LlmError::cancelled("Generation cancelled")),

        opened = async {
            match control.idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, open).await {
                    Ok(opened) => opened,
                    Err(_) => Err(LlmError::timeout(format!(
                        "No response within {}s",
                        limit.as_secs_f32()
                    ))),
                },
                None => open.await,
            }
        } => opened,
    }
}

/// Drain `stream` to its `Done` chunk and return the accumulated text.
///
/// Each fragment is passed to `on_fragment` as it arrives. An `Error` chunk,
/// a failed item, cancellation, an idle timeout, or a stream that ends
/// without `Done` all abort with an error and discard the partial text.
pub async fn collect_completion<F>(
    mut stream: ChunkStream,
    control: &StreamControl,
    mut on_fragment: F,
) -> Result<String, LlmError>
where
    F: FnMut(&str),
{
    let mut text = String::new();

    loop {
        let next = tokio::select! {
            biased;

            () = control.cancel.cancelled() => {
                return Err(LlmError::cancelled("Generation cancelled"));
            }

            next = next_chunk(&mut stream, control.idle_timeout) => next?,
        };

        match next {
            Some(Ok(GenerationChunk::Text(fragment))) => {
                on_fragment(&fragment);
                text.push_str(&fragment);
            }
            Some(Ok(GenerationChunk::Done)) => return Ok(text),
            Some(Ok(GenerationChunk::Error(message))) => {
                return Err(LlmError::protocol(format!(
                    "Generation service error: {message}"
                )));
            }
            Some(Err(e)) => return Err(e),
            None => {
                return Err(LlmError::transport(
                    "Stream closed before the completion was done",
                ));
            }
        }
    }
}

async fn next_chunk(
    stream: &mut ChunkStream,
    idle_timeout: Option<Duration>,
) -> Result<Option<Result<GenerationChunk, LlmError>>, LlmError> {
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, stream.next())
            .await
            .map_err(|_| {
                LlmError::timeout(format!(
                    "No chunk received within {}s",
                    limit.as_secs_f32()
                ))
            }),
        None => Ok(stream.next().await),
    }
}
