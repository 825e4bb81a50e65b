//! Prompt construction
//!
//! Every narrative prompt is the character block, then the state's fragment,
//! then whatever running context the turn has.

/// Prompt for a self-reporting turn
pub fn self_report_prompt(
    description: &str,
    fragment: &str,
    last_turn: Option<&str>,
    utterance: Option<&str>,
) -> String {
    let mut prompt = format!("{description}\n\n{fragment}\n\n");
    if let Some(last) = last_turn {
        prompt.push_str(&format!("Your last response was: {last}\n\n"));
    }
    if let Some(utterance) = utterance {
        prompt.push_str(&format!("The player says: {utterance}\n\n"));
    }
    prompt
}

/// Prompt for the narrative half of an intent-routed turn
pub fn narrative_prompt(
    description: &str,
    fragment: &str,
    utterance: &str,
    last_turn: Option<&str>,
) -> String {
    format!(
        "{description}\n\n{fragment}\n\n\
         The last message of the player was: {utterance}\n\n\
         Your last response was: {}\n\n",
        last_turn.unwrap_or_default()
    )
}

/// Closed-set prompt asking for one intent label
pub fn classification_prompt(
    speaker: &str,
    utterance: &str,
    current_state: &str,
    candidates: &[&str],
    last_turn: Option<&str>,
) -> String {
    let last = match last_turn {
        Some(last) => last.to_string(),
        None => format!("Nothing said yet. {speaker} has not talked with the player."),
    };
    format!(
        "This is the last response of {speaker}:\n\n\
         {speaker}: {last}\n\n\
         Based on the player's reply and the current state of the conversation ({current_state}), \
         classify the reply into one of these intents: {}\n\n\
         PLAYER_REPLY: {utterance}\n\n\
         ---\n\n\
         Answer with the intent only, no other information.",
        candidates.join(", ")
    )
}
