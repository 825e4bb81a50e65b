//! Common types for generation requests and streamed chunks

use super::LlmError;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Sampling parameters; unset fields are left to the service defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl SamplingParams {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// One-shot completion request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    /// Character prefix sent as the service's system prompt
    pub system: Option<String>,
    pub sampling: SamplingParams,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            system: None,
            sampling: SamplingParams::default(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }
}

/// One element of a completion stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationChunk {
    /// Text fragment to append
    Text(String),
    /// Application-level failure reported by the service; terminal
    Error(String),
    /// Normal end of stream
    Done,
}

impl GenerationChunk {
    #[cfg(test)]
    pub fn text(s: impl Into<String>) -> Self {
        GenerationChunk::Text(s.into())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationChunk::Error(_) | GenerationChunk::Done)
    }
}

/// Lazy, single-reader sequence of chunks for one request.
///
/// An `Err` item is a transport or protocol failure and ends the sequence.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<GenerationChunk, LlmError>> + Send>>;
