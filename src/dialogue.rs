//! Dialogue state control
//!
//! Turns a character and a generation service into a conversation that moves
//! between the character's narrative states.

mod classifier;
mod controller;
mod marker;
mod prompt;
mod session;
mod transition;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub mod testing;

pub use controller::{ControllerSettings, DialogueController, TurnInput, TurnOutcome};
pub use session::DialogueSession;
pub use transition::{StateResolution, UnresolvedStatePolicy};

use crate::character::CharacterError;
use crate::llm::{LlmError, LlmErrorKind};
use thiserror::Error;

/// Errors that end a turn without producing a successor session
#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),
    #[error(transparent)]
    Character(#[from] CharacterError),
    #[error("This character needs a player reply to advance")]
    MissingUtterance,
}

impl DialogueError {
    /// Whether the failure came from the cancellation token
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DialogueError::Generation(e) if e.kind == LlmErrorKind::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DialogueError::from(LlmError::transport("Connection refused"));
        assert_eq!(err.to_string(), "Generation failed: Connection refused");
        assert!(!err.is_cancelled());

        let err = DialogueError::from(CharacterError::UnknownState("Sleeping".to_string()));
        assert_eq!(err.to_string(), "Unknown state 'Sleeping'");

        assert!(DialogueError::from(LlmError::cancelled("Generation cancelled")).is_cancelled());
    }
}
