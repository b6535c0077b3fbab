//! Domain models: fetched questions, the rendered round, and a player's submission.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// One multiple-choice question as delivered by the question source.
/// Text is already entity-decoded.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
  pub prompt: String,
  pub correct_answer: String,
  pub incorrect_answers: Vec<String>,
  #[serde(default)] pub category: String,
  #[serde(default)] pub difficulty: String,
}

#[cfg(test)]
impl Question {
  pub fn new(prompt: impl Into<String>, correct: impl Into<String>, incorrect: &[&str]) -> Self {
    Self {
      prompt: prompt.into(),
      correct_answer: correct.into(),
      incorrect_answers: incorrect.iter().map(|s| s.to_string()).collect(),
      category: String::new(),
      difficulty: String::new(),
    }
  }
}

/// A single answer option as shown to the player.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct RenderedChoice {
  pub display_text: String,
  pub is_correct: bool,
  pub group_id: usize,
}

/// A question with its shuffled choices. `group_id` is the question's
/// position in the fetched batch.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct RenderedQuestion {
  pub group_id: usize,
  pub prompt: String,
  pub category: String,
  pub difficulty: String,
  pub choices: Vec<RenderedChoice>,
}

impl RenderedQuestion {
  pub fn correct_choice(&self) -> Option<&RenderedChoice> {
    self.choices.iter().find(|c| c.is_correct)
  }
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct RenderModel {
  pub groups: Vec<RenderedQuestion>,
}

impl RenderModel {
  pub fn len(&self) -> usize { self.groups.len() }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool { self.groups.is_empty() }
}

/// Selected answer text per question group. Unanswered groups are absent.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Submission(pub BTreeMap<usize, String>);

/// Form field prefix for a question group's radio buttons (`answer0`, `answer1`, ...).
pub const ANSWER_FIELD_PREFIX: &str = "answer";

impl Submission {
  /// Collect `answer{N}` fields from a posted form; any other key is ignored.
  pub fn from_form(fields: &HashMap<String, String>) -> Self {
    let picks = fields
      .iter()
      .filter_map(|(k, v)| {
        let idx = k.strip_prefix(ANSWER_FIELD_PREFIX)?.parse::<usize>().ok()?;
        Some((idx, v.clone()))
      })
      .collect();
    Self(picks)
  }

  pub fn get(&self, group_id: usize) -> Option<&str> {
    self.0.get(&group_id).map(String::as_str)
  }
}

#[cfg(test)]
impl Submission {
  pub fn new() -> Self { Self::default() }

  pub fn select(mut self, group_id: usize, text: impl Into<String>) -> Self {
    self.0.insert(group_id, text.into());
    self
  }
}
