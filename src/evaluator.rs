use serde::{Deserialize, Serialize};
use tracing::info;

use crate::tracker::Attempt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// Rebuilds the phrase from the user's placements and compares it to the
/// original, word for word and in order.
///
/// The candidate borrows the words in place, so no second copy of the phrase
/// is ever allocated.
///
/// # Panics
///
/// If a blank is still empty. A wrong verdict on a backup is worse than a
/// crash, so an incomplete attempt is never judged.
pub fn evaluate(attempt: &Attempt) -> Outcome {
    assert!(attempt.is_complete(), "evaluate called on an incomplete attempt");

    let challenge = attempt.challenge();
    let original = challenge.phrase().words();
    let mut candidate: Vec<&str> = original.iter().map(String::as_str).collect();

    for group in 0..challenge.group_count() {
        let (Some(position), Some(word)) =
            (challenge.blank_position(group), attempt.placed_word(group))
        else {
            panic!("group {} has no placement", group);
        };
        candidate[position] = word;
    }

    let outcome = if candidate.iter().eq(original.iter()) {
        Outcome::Succeeded
    } else {
        Outcome::Failed
    };
    info!(?outcome, "backup check evaluated");
    outcome
}
