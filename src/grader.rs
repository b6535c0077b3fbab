//! Scoring a submission against a rendered round.

use crate::domain::{RenderModel, Submission};

/// Count groups whose selected text equals that group's tagged-correct
/// choice. Lookup is by group id, never by answer text, so two questions
/// sharing a correct answer cannot credit each other.
pub fn grade(submission: &Submission, model: &RenderModel) -> u32 {
  model
    .groups
    .iter()
    .filter(|group| {
      match (submission.get(group.group_id), group.correct_choice()) {
        (Some(picked), Some(correct)) => picked == correct.display_text,
        _ => false,
      }
    })
    .count() as u32
}
