//! JSON character definitions
//!
//! Lets new characters be described in a file and validated exactly like the
//! built-in ones.

use super::{Character, CharacterError, CharacterSampling, DialogueMode, State, StateDefinitionTable, Transition};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialized form of a character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterDefinition {
    pub name: String,
    pub description: String,
    pub initial_state: String,
    pub mode: DialogueMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_state: Option<String>,
    pub states: Vec<State>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
    #[serde(default)]
    pub sampling: CharacterSampling,
}

impl CharacterDefinition {
    /// Read and parse a definition without validating it
    pub fn from_file(path: &Path) -> Result<Self, CharacterError> {
        let content = std::fs::read_to_string(path).map_err(|source| CharacterError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| CharacterError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

impl TryFrom<CharacterDefinition> for Character {
    type Error = CharacterError;

    fn try_from(definition: CharacterDefinition) -> Result<Self, Self::Error> {
        let table = StateDefinitionTable::new(definition.states, definition.transitions)?;
        let character = Character::new(
            definition.name,
            definition.description,
            definition.initial_state,
            definition.mode,
            table,
        )?
        .with_sampling(definition.sampling);

        match definition.pause_state {
            Some(state) => character.with_pause_state(state),
            None => Ok(character),
        }
    }
}

impl Character {
    /// Load and validate a character from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, CharacterError> {
        let character = Character::try_from(CharacterDefinition::from_file(path)?)?;
        tracing::info!(
            path = %path.display(),
            character = %character.name(),
            states = character.table().states().len(),
            transitions = character.table().transitions().count(),
            "Loaded character definition"
        );
        Ok(character)
    }
}
