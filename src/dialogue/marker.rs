//! Next-state marker parsing for self-reporting characters

/// Phrase a self-reporting completion ends with, followed by the state name
pub const NEXT_STATE_MARKER: &str = "Next State:";

/// Find the state name a completion declares for itself.
///
/// Takes the first line containing the marker and keeps the text after it, up
/// to any repeated marker, reduced to letters, digits and whitespace. Returns
/// `None` when no line carries the marker; the name may be empty.
pub fn declared_next_state(completion: &str) -> Option<String> {
    let line = completion
        .lines()
        .find(|line| line.contains(NEXT_STATE_MARKER))?;
    let declared = line.split(NEXT_STATE_MARKER).nth(1).unwrap_or_default();
    let cleaned: String = declared
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    Some(cleaned.trim().to_string())
}
