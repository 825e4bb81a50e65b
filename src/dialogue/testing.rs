//! Stub intent classifier for testing

use super::classifier::{ClassificationRequest, IntentClassifier};
use crate::llm::{LlmError, StreamControl};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// What the stub was asked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedClassification {
    pub utterance: String,
    pub current_state: String,
    pub candidates: Vec<String>,
    pub last_turn: Option<String>,
}

/// Classifier that returns queued labels in order
#[allow(dead_code)]
pub struct StubClassifier {
    answers: Mutex<VecDeque<Result<String, LlmError>>>,
    pub calls: Mutex<Vec<RecordedClassification>>,
}

#[allow(dead_code)]
impl StubClassifier {
    pub fn new() -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_labels(labels: &[&str]) -> Self {
        let stub = Self::new();
        for label in labels {
            stub.queue_label(label);
        }
        stub
    }

    pub fn queue_label(&self, label: &str) {
        self.answers
            .lock()
            .unwrap()
            .push_back(Ok(label.to_string()));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.answers.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_calls(&self) -> Vec<RecordedClassification> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for StubClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntentClassifier for StubClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest<'_>,
        _control: &StreamControl,
    ) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(RecordedClassification {
            utterance: request.utterance.to_string(),
            current_state: request.current_state.to_string(),
            candidates: request.candidates.iter().map(|c| (*c).to_string()).collect(),
            last_turn: request.last_turn.map(str::to_string),
        });
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::transport("No stub label queued")))
    }
}
