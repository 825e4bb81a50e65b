//! Pure next-state resolution
//!
//! Given a session and what a turn produced (a completion or a classified
//! label), decide the successor session. No I/O happens here.

use super::marker::declared_next_state;
use super::session::DialogueSession;
use crate::character::StateDefinitionTable;
use std::fmt;
use std::str::FromStr;

/// What to do when a self-reported next state names no known state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnresolvedStatePolicy {
    /// Adopt the declared text as the current state even though it is not a
    /// state. The following turn fails with an unknown-state error.
    #[default]
    AdoptRaw,
    /// Stay in the current state and report a warning
    KeepPrevious,
}

impl UnresolvedStatePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            UnresolvedStatePolicy::KeepPrevious => "keep_previous",
            UnresolvedStatePolicy::AdoptRaw => "adopt_raw",
        }
    }
}

impl fmt::Display for UnresolvedStatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnresolvedStatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep_previous" => Ok(UnresolvedStatePolicy::KeepPrevious),
            "adopt_raw" => Ok(UnresolvedStatePolicy::AdoptRaw),
            other => Err(format!(
                "unknown state policy '{other}' (expected keep_previous or adopt_raw)"
            )),
        }
    }
}

/// How a turn's next state was decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateResolution {
    /// Moved along a known state (self-loops included)
    Transitioned { from: String, to: String },
    /// Self-report named no known state. `declared` is `None` when the
    /// completion had no marker; `adopted` tells whether the raw value became
    /// the current state.
    Unresolved {
        declared: Option<String>,
        adopted: bool,
    },
    /// The classified label has no transition out of the current state
    NoMatchingTransition { label: String },
}

/// Successor session together with how it was reached
#[derive(Debug, Clone)]
pub struct TransitionResult {
    pub session: DialogueSession,
    pub resolution: StateResolution,
}

impl TransitionResult {
    fn transitioned(session: DialogueSession, to: &str) -> Self {
        let from = session.current_state().to_string();
        Self {
            session: session.transitioned(to),
            resolution: StateResolution::Transitioned {
                from,
                to: to.to_string(),
            },
        }
    }
}

/// Resolve a self-reporting completion against the state table
pub fn resolve_self_report(
    session: DialogueSession,
    completion: &str,
    table: &StateDefinitionTable,
    policy: UnresolvedStatePolicy,
) -> TransitionResult {
    let declared = declared_next_state(completion);
    if let Some(name) = declared.as_deref().filter(|name| table.contains(name)) {
        return TransitionResult::transitioned(session, name);
    }

    match policy {
        UnresolvedStatePolicy::KeepPrevious => TransitionResult {
            session,
            resolution: StateResolution::Unresolved {
                declared,
                adopted: false,
            },
        },
        UnresolvedStatePolicy::AdoptRaw => {
            let raw = declared.clone().unwrap_or_default();
            TransitionResult {
                session: session.overwritten(raw),
                resolution: StateResolution::Unresolved {
                    declared,
                    adopted: true,
                },
            }
        }
    }
}

/// Resolve a classified intent label against the current state's transitions
pub fn resolve_intent(
    session: DialogueSession,
    label: &str,
    table: &StateDefinitionTable,
) -> TransitionResult {
    match table.transition(session.current_state(), label) {
        Some(transition) => {
            let to = transition.to.clone();
            TransitionResult::transitioned(session, &to)
        }
        None => TransitionResult {
            session,
            resolution: StateResolution::NoMatchingTransition {
                label: label.to_string(),
            },
        },
    }
}
