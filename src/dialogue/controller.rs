//! Dialogue controller
//!
//! Drives one turn at a time: build the prompt for the current state, stream
//! the completion, resolve the next state and record the turn. The session is
//! taken by reference and the successor is returned only when the whole turn
//! succeeds.

use super::classifier::{ClassificationRequest, IntentClassifier, LlmIntentClassifier};
use super::prompt::{narrative_prompt, self_report_prompt};
use super::session::DialogueSession;
use super::transition::{
    resolve_intent, resolve_self_report, StateResolution, TransitionResult, UnresolvedStatePolicy,
};
use super::DialogueError;
use crate::character::{Character, DialogueMode};
use crate::llm::{
    collect_completion, open_stream, GenerationClient, GenerationRequest, LlmError, StreamControl,
};
use std::sync::Arc;
use uuid::Uuid;

/// Controller configuration that is not part of the character
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub model: String,
    pub unresolved_policy: UnresolvedStatePolicy,
}

impl ControllerSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            unresolved_policy: UnresolvedStatePolicy::default(),
        }
    }

    pub fn with_unresolved_policy(mut self, policy: UnresolvedStatePolicy) -> Self {
        self.unresolved_policy = policy;
        self
    }
}

/// Input driving one turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnInput<'a> {
    /// No player line; only valid for self-reporting characters
    Auto,
    /// The player's reply
    Utterance(&'a str),
}

impl<'a> TurnInput<'a> {
    fn utterance(self) -> Option<&'a str> {
        match self {
            TurnInput::Auto => None,
            TurnInput::Utterance(text) => Some(text),
        }
    }
}

/// Result of a completed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Successor session
    pub session: DialogueSession,
    /// Full generated response, as appended to the history
    pub response: String,
    pub resolution: StateResolution,
    /// Label returned by the classifier (intent-routed only)
    pub intent: Option<String>,
}

pub struct DialogueController {
    character: Character,
    client: Arc<dyn GenerationClient>,
    classifier: Arc<dyn IntentClassifier>,
    settings: ControllerSettings,
}

impl DialogueController {
    /// Create a controller classifying replies with the generation service
    pub fn new(
        character: Character,
        client: Arc<dyn GenerationClient>,
        settings: ControllerSettings,
    ) -> Self {
        let classifier = Arc::new(LlmIntentClassifier::new(
            client.clone(),
            settings.model.clone(),
            character.sampling().classifier,
        ));
        Self {
            character,
            client,
            classifier,
            settings,
        }
    }

    /// Replace the intent classifier
    #[cfg(test)]
    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    /// Fresh session at the character's initial state
    pub fn new_session(&self) -> DialogueSession {
        DialogueSession::new(self.character.initial_state())
    }

    /// Reset `session` to the initial state with an empty history
    pub fn restart(&self, session: &DialogueSession) -> DialogueSession {
        tracing::info!(session = %session.id(), "Dialogue restarted");
        session.reset(self.character.initial_state())
    }

    /// Run one turn.
    ///
    /// Text fragments are passed to `on_fragment` as they arrive. On error the
    /// caller keeps its unchanged `session`.
    pub async fn advance_turn<F>(
        &self,
        session: &DialogueSession,
        input: TurnInput<'_>,
        control: &StreamControl,
        on_fragment: F,
    ) -> Result<TurnOutcome, DialogueError>
    where
        F: FnMut(&str) + Send,
    {
        match self.character.mode() {
            DialogueMode::SelfReport => {
                self.self_report_turn(session, input.utterance(), control, on_fragment)
                    .await
            }
            DialogueMode::IntentRouted => {
                let utterance = input.utterance().ok_or(DialogueError::MissingUtterance)?;
                self.intent_routed_turn(session, utterance, control, on_fragment)
                    .await
            }
        }
    }

    async fn self_report_turn<F>(
        &self,
        session: &DialogueSession,
        utterance: Option<&str>,
        control: &StreamControl,
        on_fragment: F,
    ) -> Result<TurnOutcome, DialogueError>
    where
        F: FnMut(&str) + Send,
    {
        let table = self.character.table();
        let state = table.get(session.current_state())?;
        let description = self.character.description();

        let request = GenerationRequest::new(
            self_report_prompt(description, &state.prompt, session.last_turn(), utterance),
            self.settings.model.clone(),
        )
        .with_system(description)
        .with_sampling(self.character.sampling().narrative);
        let response = self.generate(&request, control, on_fragment).await?;

        let TransitionResult {
            session: next,
            resolution,
        } = resolve_self_report(
            session.clone(),
            &response,
            table,
            self.settings.unresolved_policy,
        );
        log_resolution(session.id(), &resolution);

        Ok(TurnOutcome {
            session: next.with_turn(response.clone()),
            response,
            resolution,
            intent: None,
        })
    }

    async fn intent_routed_turn<F>(
        &self,
        session: &DialogueSession,
        utterance: &str,
        control: &StreamControl,
        on_fragment: F,
    ) -> Result<TurnOutcome, DialogueError>
    where
        F: FnMut(&str) + Send,
    {
        let table = self.character.table();
        let candidates = table.outgoing_labels(session.current_state())?;

        let label = self
            .classifier
            .classify(
                &ClassificationRequest {
                    speaker: self.character.name(),
                    utterance,
                    current_state: session.current_state(),
                    candidates: &candidates,
                    last_turn: session.last_turn(),
                },
                control,
            )
            .await?;

        let TransitionResult {
            session: next,
            resolution,
        } = resolve_intent(session.clone(), &label, table);
        log_resolution(session.id(), &resolution);

        // `next` carries no turn for this reply yet
        let state = table.get(next.current_state())?;
        let request = GenerationRequest::new(
            narrative_prompt(
                self.character.description(),
                &state.prompt,
                utterance,
                next.last_turn(),
            ),
            self.settings.model.clone(),
        )
        .with_sampling(self.character.sampling().narrative);
        let response = self.generate(&request, control, on_fragment).await?;

        Ok(TurnOutcome {
            session: next.with_turn(response.clone()),
            response,
            resolution,
            intent: Some(label),
        })
    }

    async fn generate<F>(
        &self,
        request: &GenerationRequest,
        control: &StreamControl,
        on_fragment: F,
    ) -> Result<String, LlmError>
    where
        F: FnMut(&str) + Send,
    {
        let stream = open_stream(self.client.as_ref(), request, control).await?;
        collect_completion(stream, control, on_fragment).await
    }
}

fn log_resolution(session: Uuid, resolution: &StateResolution) {
    match resolution {
        StateResolution::Transitioned { from, to } => {
            tracing::info!(session = %session, from = %from, to = %to, "State transition");
        }
        StateResolution::Unresolved { declared, adopted } => {
            tracing::warn!(
                session = %session,
                declared = ?declared,
                adopted,
                "Completion did not name a known next state"
            );
        }
        StateResolution::NoMatchingTransition { label } => {
            tracing::warn!(
                session = %session,
                label = %label,
                "No transition for classified intent, staying in state"
            );
        }
    }
}
