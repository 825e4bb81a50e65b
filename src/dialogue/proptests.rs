//! Property-based tests for prompts and next-state resolution

use super::marker::declared_next_state;
use super::prompt::{classification_prompt, narrative_prompt, self_report_prompt};
use super::session::DialogueSession;
use super::transition::*;
use crate::character::{Character, State, StateDefinitionTable, Transition};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

const STATES: &[&str] = &["Introduction", "Shop", "Suspicion", "Negotiation", "End"];
const LABELS: &[&str] = &[
    "greetings",
    "see_items",
    "price_negotiation",
    "doubt_quality",
    "agree_deal",
    "dont_want_to_buy",
];

fn table() -> StateDefinitionTable {
    StateDefinitionTable::new(
        STATES
            .iter()
            .map(|name| State::new(*name, format!("Prompt for {name}.")))
            .collect(),
        vec![
            Transition::new("Introduction", "see_items", "Shop"),
            Transition::new("Shop", "price_negotiation", "Negotiation"),
            Transition::new("Shop", "doubt_quality", "Suspicion"),
            Transition::new("Suspicion", "dont_want_to_buy", "End"),
            Transition::new("Negotiation", "agree_deal", "End"),
            Transition::new("End", "greetings", "Introduction"),
        ],
    )
    .unwrap()
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_state_name() -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::sample::select(STATES).prop_map(str::to_string),
        "[A-Z][a-z]{2,10}",
    ]
}

/// Completions with a known, unknown or missing marker and arbitrary chatter
fn arb_completion() -> impl Strategy<Value = String> {
    (
        "[a-zA-Z ,.!?']{0,60}",
        prop_oneof![
            arb_state_name().prop_map(|name| format!("\nNext State: {name}")),
            arb_state_name().prop_map(|name| format!(" Next State: **{name}**.")),
            Just(String::new()),
        ],
    )
        .prop_map(|(chatter, marker)| format!("{chatter}{marker}"))
}

fn arb_label() -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::sample::select(LABELS).prop_map(str::to_string),
        "[a-z_]{1,15}",
    ]
}

// Every state of the built-in characters, with and without running context
#[test]
fn test_builtin_prompts_contain_blocks_once() {
    for name in ["merchant", "bounty_hunter"] {
        let character = Character::builtin(name).unwrap();
        let description = character.description();
        for state in character.table().states() {
            let prompts = [
                self_report_prompt(description, &state.prompt, None, None),
                self_report_prompt(description, &state.prompt, Some("Earlier reply."), Some("Hello")),
                narrative_prompt(description, &state.prompt, "Hello", None),
                narrative_prompt(description, &state.prompt, "Hello", Some("Earlier reply.")),
            ];
            for prompt in &prompts {
                assert_eq!(count(prompt, description), 1, "{name}/{}", state.name);
                assert_eq!(count(prompt, &state.prompt), 1, "{name}/{}", state.name);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Every prompt carries the character block and the state fragment once
    #[test]
    fn prop_prompts_contain_blocks_once(
        description in "DESC-[a-z]{4,12}",
        fragment in "FRAG-[a-z]{4,12}",
        last_turn in proptest::option::of("[a-z .]{0,40}"),
        utterance in "[a-z .?]{0,40}",
    ) {
        let prompts = [
            self_report_prompt(&description, &fragment, last_turn.as_deref(), None),
            self_report_prompt(&description, &fragment, last_turn.as_deref(), Some(&utterance)),
            narrative_prompt(&description, &fragment, &utterance, last_turn.as_deref()),
        ];
        for prompt in &prompts {
            prop_assert_eq!(count(prompt, &description), 1, "{}", prompt);
            prop_assert_eq!(count(prompt, &fragment), 1, "{}", prompt);
            let head = format!("{description}\n\n{fragment}");
            prop_assert!(prompt.starts_with(&head));
        }
    }

    // The classifier prompt lists every candidate and the reply
    #[test]
    fn prop_classification_prompt_lists_candidates(
        labels in proptest::collection::vec("[a-z_]{3,12}", 1..6),
        utterance in "[a-z ]{1,30}",
        state in arb_state_name(),
    ) {
        let candidates: Vec<&str> = labels.iter().map(String::as_str).collect();
        let prompt = classification_prompt("Gideon", &utterance, &state, &candidates, None);
        prop_assert!(prompt.contains(&candidates.join(", ")));
        let reply_line = format!("PLAYER_REPLY: {utterance}");
        prop_assert!(prompt.contains(&reply_line));
        let state_part = format!("({state})");
        prop_assert!(prompt.contains(&state_part));
    }

    // A declared name is reduced to letters, digits and inner whitespace
    #[test]
    fn prop_declared_name_is_clean(completion in arb_completion()) {
        if let Some(name) = declared_next_state(&completion) {
            prop_assert!(name.chars().all(|c| c.is_alphanumeric() || c.is_whitespace()));
            prop_assert_eq!(name.trim(), name.as_str());
        }
    }

    // Keeping the previous state never leaves the state graph
    #[test]
    fn prop_keep_previous_stays_in_table(
        completions in proptest::collection::vec(arb_completion(), 0..20)
    ) {
        let table = table();
        let mut session = DialogueSession::new("Introduction");

        for completion in completions {
            let before = session.clone();
            let result = resolve_self_report(
                session,
                &completion,
                &table,
                UnresolvedStatePolicy::KeepPrevious,
            );
            session = result.session;
            prop_assert!(table.contains(session.current_state()));

            match result.resolution {
                StateResolution::Transitioned { from, to } => {
                    prop_assert_eq!(from.as_str(), before.current_state());
                    prop_assert_eq!(to.as_str(), session.current_state());
                    prop_assert_eq!(session.previous_state(), Some(before.current_state()));
                }
                StateResolution::Unresolved { adopted, .. } => {
                    prop_assert!(!adopted);
                    prop_assert_eq!(&session, &before);
                }
                StateResolution::NoMatchingTransition { .. } => {
                    prop_assert!(false, "self-report never classifies");
                }
            }
        }
    }

    // Raw adoption takes whatever was declared and never touches previous
    #[test]
    fn prop_adopt_raw_takes_declared_value(completion in arb_completion()) {
        let table = table();
        let session = DialogueSession::new("Shop").transitioned("Suspicion");
        let declared = declared_next_state(&completion);

        let result = resolve_self_report(
            session,
            &completion,
            &table,
            UnresolvedStatePolicy::AdoptRaw,
        );
        prop_assert_eq!(
            result.session.current_state(),
            declared.as_deref().unwrap_or_default()
        );
        if matches!(result.resolution, StateResolution::Unresolved { .. }) {
            prop_assert_eq!(result.session.previous_state(), Some("Shop"));
        } else {
            prop_assert_eq!(result.session.previous_state(), Some("Suspicion"));
        }
    }

    // Intent routing only follows declared transitions
    #[test]
    fn prop_intent_follows_declared_transitions(
        labels in proptest::collection::vec(arb_label(), 0..20)
    ) {
        let table = table();
        let mut session = DialogueSession::new("Introduction");

        for label in labels {
            let expected = table
                .transition(session.current_state(), &label)
                .map(|t| t.to.clone());
            let before = session.clone();
            let result = resolve_intent(session, &label, &table);
            session = result.session;

            prop_assert!(table.contains(session.current_state()));
            match expected {
                Some(to) => {
                    prop_assert_eq!(session.current_state(), to.as_str());
                    prop_assert_eq!(session.previous_state(), Some(before.current_state()));
                }
                None => {
                    prop_assert_eq!(&session, &before);
                    prop_assert_eq!(
                        result.resolution,
                        StateResolution::NoMatchingTransition { label }
                    );
                }
            }
        }
    }
}
