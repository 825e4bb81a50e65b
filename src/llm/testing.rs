//! Mock generation client for testing
//!
//! Plays back queued scripts, one per `stream` call, and records requests.

use super::types::{ChunkStream, GenerationChunk, GenerationRequest};
use super::{GenerationClient, LlmError};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use std::collections::VecDeque;
use std::sync::Mutex;

enum Script {
    /// Items to yield; `stall` keeps the stream open after the last one
    Stream {
        items: Vec<Result<GenerationChunk, LlmError>>,
        stall: bool,
    },
    /// Fail before any chunk is produced
    OpenError(LlmError),
    /// Never finish opening the stream
    Hang,
}

/// Mock client that returns queued streams
#[allow(dead_code)]
pub struct MockGenerationClient {
    scripts: Mutex<VecDeque<Script>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<GenerationRequest>>,
}

#[allow(dead_code)]
impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful completion made of `fragments` followed by `Done`
    pub fn queue_fragments(&self, fragments: &[&str]) {
        let mut items: Vec<_> = fragments
            .iter()
            .map(|f| Ok(GenerationChunk::text(*f)))
            .collect();
        items.push(Ok(GenerationChunk::Done));
        self.queue_chunks(items);
    }

    /// Queue an exact item sequence (no implicit `Done`)
    pub fn queue_chunks(&self, items: Vec<Result<GenerationChunk, LlmError>>) {
        self.scripts
            .lock()
            .unwrap()
            .push_back(Script::Stream { items, stall: false });
    }

    /// Queue `fragments` followed by a failure item
    pub fn queue_failure_after(&self, fragments: &[&str], error: LlmError) {
        let mut items: Vec<_> = fragments
            .iter()
            .map(|f| Ok(GenerationChunk::text(*f)))
            .collect();
        items.push(Err(error));
        self.queue_chunks(items);
    }

    /// Queue `fragments` followed by a stream that never yields again
    pub fn queue_stalled(&self, fragments: &[&str]) {
        let items = fragments
            .iter()
            .map(|f| Ok(GenerationChunk::text(*f)))
            .collect();
        self.scripts
            .lock()
            .unwrap()
            .push_back(Script::Stream { items, stall: true });
    }

    /// Queue a failure to open the stream
    pub fn queue_error(&self, error: LlmError) {
        self.scripts
            .lock()
            .unwrap()
            .push_back(Script::OpenError(error));
    }

    /// Queue a request that never gets a response
    pub fn queue_hang(&self) {
        self.scripts.lock().unwrap().push_back(Script::Hang);
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of scripts not yet consumed
    pub fn remaining(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn stream(&self, request: &GenerationRequest) -> Result<ChunkStream, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::transport("No mock stream queued"))?;

        match script {
            Script::Stream { items, stall: false } => Ok(stream::iter(items).boxed()),
            Script::Stream { items, stall: true } => {
                Ok(stream::iter(items).chain(stream::pending()).boxed())
            }
            Script::OpenError(error) => Err(error),
            Script::Hang => futures::future::pending().await,
        }
    }
}
