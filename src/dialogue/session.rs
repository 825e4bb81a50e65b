//! Dialogue session value

use uuid::Uuid;

/// One conversation with a character.
///
/// Sessions are values: a turn reads the current session and, on success,
/// produces its successor. A failed turn therefore cannot leave a session
/// half-updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueSession {
    id: Uuid,
    current_state: String,
    previous_state: Option<String>,
    history: Vec<String>,
}

impl DialogueSession {
    pub fn new(initial_state: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            current_state: initial_state.into(),
            previous_state: None,
            history: Vec::new(),
        }
    }

    /// Identifier used to correlate log lines of one session
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current_state(&self) -> &str {
        &self.current_state
    }

    pub fn previous_state(&self) -> Option<&str> {
        self.previous_state.as_deref()
    }

    /// Completed turns, oldest first
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn last_turn(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    /// Back to `initial_state` with no history, keeping the session id
    #[must_use]
    pub fn reset(&self, initial_state: impl Into<String>) -> Self {
        Self {
            id: self.id,
            current_state: initial_state.into(),
            previous_state: None,
            history: Vec::new(),
        }
    }

    /// Move to `to`, remembering where we came from
    #[must_use]
    pub(crate) fn transitioned(self, to: impl Into<String>) -> Self {
        let previous = self.current_state;
        Self {
            current_state: to.into(),
            previous_state: Some(previous),
            ..self
        }
    }

    /// Overwrite the current state without recording a transition
    #[must_use]
    pub(crate) fn overwritten(self, state: impl Into<String>) -> Self {
        Self {
            current_state: state.into(),
            ..self
        }
    }

    /// Append one completed turn
    #[must_use]
    pub(crate) fn with_turn(mut self, text: impl Into<String>) -> Self {
        self.history.push(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let session = DialogueSession::new("Idle");
        assert_eq!(session.current_state(), "Idle");
        assert_eq!(session.previous_state(), None);
        assert!(session.history().is_empty());
        assert_eq!(session.last_turn(), None);
    }

    #[test]
    fn test_transition_records_previous() {
        let session = DialogueSession::new("Idle").transitioned("LookingFor");
        assert_eq!(session.current_state(), "LookingFor");
        assert_eq!(session.previous_state(), Some("Idle"));

        let session = session.transitioned("LookingFor");
        assert_eq!(session.previous_state(), Some("LookingFor"));
    }

    #[test]
    fn test_overwrite_keeps_previous() {
        let session = DialogueSession::new("Idle")
            .transitioned("Found")
            .overwritten("Sleeping");
        assert_eq!(session.current_state(), "Sleeping");
        assert_eq!(session.previous_state(), Some("Idle"));
    }

    #[test]
    fn test_history_appends_in_order() {
        let session = DialogueSession::new("Idle")
            .with_turn("a")
            .with_turn("b")
            .with_turn("c");
        assert_eq!(session.history(), ["a", "b", "c"]);
        assert_eq!(session.last_turn(), Some("c"));
    }

    #[test]
    fn test_reset_keeps_id() {
        let session = DialogueSession::new("Introduction")
            .transitioned("End")
            .with_turn("farewell");
        let reset = session.reset("Introduction");

        assert_eq!(reset.id(), session.id());
        assert_eq!(reset.current_state(), "Introduction");
        assert_eq!(reset.previous_state(), None);
        assert!(reset.history().is_empty());
    }

    #[test]
    fn test_independent_sessions_have_distinct_ids() {
        assert_ne!(DialogueSession::new("Idle").id(), DialogueSession::new("Idle").id());
    }
}
