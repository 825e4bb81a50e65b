//! State definition table with a validated transition table

use super::CharacterError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A narrative state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    /// Narrative prompt fragment for this state
    pub prompt: String,
}

impl State {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
        }
    }
}

/// Declared move out of `from` when the player's intent is `label`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: String,
    pub label: String,
    pub to: String,
}

impl Transition {
    pub fn new(from: impl Into<String>, label: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            label: label.into(),
            to: to.into(),
        }
    }
}

/// Immutable lookup of states and their outgoing transitions.
///
/// Built once; construction rejects duplicate states, transitions touching
/// undefined states, and labels repeated within one source state.
#[derive(Debug, Clone)]
pub struct StateDefinitionTable {
    states: Vec<State>,
    index: HashMap<String, usize>,
    /// Outgoing transitions per source state, in declaration order
    outgoing: HashMap<String, Vec<Transition>>,
}

impl StateDefinitionTable {
    pub fn new(states: Vec<State>, transitions: Vec<Transition>) -> Result<Self, CharacterError> {
        let mut index = HashMap::with_capacity(states.len());
        for (i, state) in states.iter().enumerate() {
            if index.insert(state.name.clone(), i).is_some() {
                return Err(CharacterError::DuplicateState(state.name.clone()));
            }
        }

        let mut outgoing: HashMap<String, Vec<Transition>> = HashMap::new();
        let mut seen_labels: HashSet<(String, String)> = HashSet::new();
        for transition in transitions {
            for endpoint in [&transition.from, &transition.to] {
                if !index.contains_key(endpoint) {
                    return Err(CharacterError::UndefinedTransitionState {
                        from: transition.from.clone(),
                        label: transition.label.clone(),
                        to: transition.to.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
            if !seen_labels.insert((transition.from.clone(), transition.label.clone())) {
                return Err(CharacterError::DuplicateLabel {
                    from: transition.from,
                    label: transition.label,
                });
            }
            outgoing
                .entry(transition.from.clone())
                .or_default()
                .push(transition);
        }

        Ok(Self {
            states,
            index,
            outgoing,
        })
    }

    /// Look up a state by name
    pub fn get(&self, name: &str) -> Result<&State, CharacterError> {
        self.index
            .get(name)
            .map(|&i| &self.states[i])
            .ok_or_else(|| CharacterError::UnknownState(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All states in declaration order
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Whether any transition is declared (intent-routed characters)
    pub fn has_transitions(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Labels leaving `state`, in declaration order
    pub fn outgoing_labels(&self, state: &str) -> Result<Vec<&str>, CharacterError> {
        self.get(state)?;
        Ok(self
            .outgoing
            .get(state)
            .map(|ts| ts.iter().map(|t| t.label.as_str()).collect())
            .unwrap_or_default())
    }

    /// The transition out of `from` declared for `label`, if any
    pub fn transition(&self, from: &str, label: &str) -> Option<&Transition> {
        self.outgoing
            .get(from)?
            .iter()
            .find(|t| t.label == label)
    }

    /// Every declared transition, grouped by source state in state order
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.states
            .iter()
            .filter_map(|s| self.outgoing.get(&s.name))
            .flatten()
    }
}
