//! Intent classification of player replies

use super::prompt::classification_prompt;
use crate::llm::{
    collect_completion, open_stream, GenerationClient, GenerationRequest, LlmError,
    SamplingParams, StreamControl,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Everything needed to classify one reply
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRequest<'a> {
    /// Character name shown next to its last line
    pub speaker: &'a str,
    pub utterance: &'a str,
    pub current_state: &'a str,
    /// Labels leaving the current state, in declaration order
    pub candidates: &'a [&'a str],
    pub last_turn: Option<&'a str>,
}

/// Maps a player reply onto one of a closed set of intent labels.
///
/// The answer is best effort: it is not guaranteed to be one of the
/// candidates. Checking membership is up to the caller.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(
        &self,
        request: &ClassificationRequest<'_>,
        control: &StreamControl,
    ) -> Result<String, LlmError>;
}

#[async_trait]
impl<T: IntentClassifier + ?Sized> IntentClassifier for Arc<T> {
    async fn classify(
        &self,
        request: &ClassificationRequest<'_>,
        control: &StreamControl,
    ) -> Result<String, LlmError> {
        (**self).classify(request, control).await
    }
}

/// Classifier that asks the generation service for the label
pub struct LlmIntentClassifier {
    client: Arc<dyn GenerationClient>,
    model: String,
    sampling: SamplingParams,
}

impl LlmIntentClassifier {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        model: impl Into<String>,
        sampling: SamplingParams,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            sampling,
        }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest<'_>,
        control: &StreamControl,
    ) -> Result<String, LlmError> {
        let prompt = classification_prompt(
            request.speaker,
            request.utterance,
            request.current_state,
            request.candidates,
            request.last_turn,
        );
        let generation = GenerationRequest::new(prompt, self.model.clone()).with_sampling(self.sampling);

        let stream = open_stream(self.client.as_ref(), &generation, control).await?;
        let completion = collect_completion(stream, control, |_| {}).await?;
        let label = completion.trim().to_string();

        tracing::debug!(
            state = %request.current_state,
            label = %label,
            "Classified player reply"
        );
        Ok(label)
    }
}
