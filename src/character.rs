//! Character definitions
//!
//! A character bundles its shared description, its narrative states and how
//! its dialogue moves between them.

mod builtin;
mod definition;
mod table;

pub use table::{State, StateDefinitionTable, Transition};

use crate::llm::SamplingParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors building or loading a character
#[derive(Debug, Error)]
pub enum CharacterError {
    #[error("Unknown state '{0}'")]
    UnknownState(String),
    #[error("State '{0}' is defined more than once")]
    DuplicateState(String),
    #[error("Transition {from} --{label}--> {to} references undefined state '{missing}'")]
    UndefinedTransitionState {
        from: String,
        label: String,
        to: String,
        missing: String,
    },
    #[error("Label '{label}' is declared more than once on state '{from}'")]
    DuplicateLabel { from: String, label: String },
    #[error("Intent-routed character '{0}' declares no transitions")]
    MissingTransitions(String),
    #[error("Unknown built-in character '{name}' (expected one of: {available})")]
    UnknownCharacter { name: String, available: String },
    #[error("Failed to read character file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse character file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// How the next state of a turn is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueMode {
    /// The generated text declares its next state with a marker line
    SelfReport,
    /// The player's reply is classified into one of the state's transition labels
    IntentRouted,
}

/// Sampling parameters per request purpose
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterSampling {
    pub narrative: SamplingParams,
    pub classifier: SamplingParams,
}

/// A fully validated character
#[derive(Debug, Clone)]
pub struct Character {
    name: String,
    description: String,
    initial_state: String,
    pause_state: Option<String>,
    mode: DialogueMode,
    sampling: CharacterSampling,
    table: StateDefinitionTable,
}

impl Character {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        initial_state: impl Into<String>,
        mode: DialogueMode,
        table: StateDefinitionTable,
    ) -> Result<Self, CharacterError> {
        let name = name.into();
        let initial_state = initial_state.into();
        table.get(&initial_state)?;
        if mode == DialogueMode::IntentRouted && !table.has_transitions() {
            return Err(CharacterError::MissingTransitions(name));
        }

        Ok(Self {
            name,
            description: description.into(),
            initial_state,
            pause_state: None,
            mode,
            sampling: CharacterSampling::default(),
            table,
        })
    }

    /// Designate the state at which the console offers to continue or stop
    pub fn with_pause_state(mut self, state: impl Into<String>) -> Result<Self, CharacterError> {
        let state = state.into();
        self.table.get(&state)?;
        self.pause_state = Some(state);
        Ok(self)
    }

    pub fn with_sampling(mut self, sampling: CharacterSampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Look up one of the built-in characters by name
    pub fn builtin(name: &str) -> Result<Self, CharacterError> {
        builtin::by_name(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared character block included in every narrative prompt
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    pub fn pause_state(&self) -> Option<&str> {
        self.pause_state.as_deref()
    }

    pub fn mode(&self) -> DialogueMode {
        self.mode
    }

    pub fn sampling(&self) -> &CharacterSampling {
        &self.sampling
    }

    pub fn table(&self) -> &StateDefinitionTable {
        &self.table
    }
}
