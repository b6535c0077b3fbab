//! Turns a fetched batch into a presentable round: shuffled choices per
//! question, with the correct one tagged for grading.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{Question, RenderModel, RenderedChoice, RenderedQuestion};

/// Build the render model for a batch. `group_id` is the question's index in
/// `questions`; choice order within a group is a uniform shuffle.
pub fn render<R: Rng + ?Sized>(questions: &[Question], rng: &mut R) -> RenderModel {
  let groups = questions
    .iter()
    .enumerate()
    .map(|(group_id, q)| render_question(group_id, q, rng))
    .collect();
  RenderModel { groups }
}

fn render_question<R: Rng + ?Sized>(group_id: usize, q: &Question, rng: &mut R) -> RenderedQuestion {
  let mut choices: Vec<RenderedChoice> = std::iter::once(&q.correct_answer)
    .chain(q.incorrect_answers.iter())
    .map(|text| RenderedChoice {
      is_correct: *text == q.correct_answer,
      display_text: text.clone(),
      group_id,
    })
    .collect();
  choices.shuffle(rng);

  RenderedQuestion {
    group_id,
    prompt: q.prompt.clone(),
    category: q.category.clone(),
    difficulty: q.difficulty.clone(),
    choices,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn batch() -> Vec<Question> {
    vec![
      Question::new("Capital of France?", "Paris", &["Lyon", "Nice", "Lille"]),
      Question::new("2 + 2?", "4", &["3", "5", "7"]),
      Question::new("Largest planet?", "Jupiter", &["Saturn", "Mars", "Venus"]),
    ]
  }

  #[test]
  fn exactly_one_correct_choice_per_group() {
    let mut rng = StdRng::seed_from_u64(7);
    let model = render(&batch(), &mut rng);
    for (group, q) in model.groups.iter().zip(batch()) {
      let correct: Vec<_> = group.choices.iter().filter(|c| c.is_correct).collect();
      assert_eq!(correct.len(), 1);
      assert_eq!(correct[0].display_text, q.correct_answer);
    }
  }

  #[test]
  fn shuffle_is_a_permutation() {
    for seed in 0..20 {
      let mut rng = StdRng::seed_from_u64(seed);
      let model = render(&batch(), &mut rng);
      for (group, q) in model.groups.iter().zip(batch()) {
        let mut shown: Vec<_> = group.choices.iter().map(|c| c.display_text.clone()).collect();
        let mut source = q.incorrect_answers.clone();
        source.push(q.correct_answer.clone());
        shown.sort();
        source.sort();
        assert_eq!(shown, source);
      }
    }
  }

  #[test]
  fn group_ids_follow_batch_positions() {
    let mut rng = StdRng::seed_from_u64(1);
    let model = render(&batch(), &mut rng);
    assert_eq!(model.len(), 3);
    for (i, group) in model.groups.iter().enumerate() {
      assert_eq!(group.group_id, i);
      assert!(group.choices.iter().all(|c| c.group_id == i));
    }
    assert_eq!(model.groups[1].prompt, "2 + 2?");
  }

  #[test]
  fn same_seed_renders_identically() {
    let a = render(&batch(), &mut StdRng::seed_from_u64(42));
    let b = render(&batch(), &mut StdRng::seed_from_u64(42));
    assert_eq!(a, b);
  }

  #[test]
  fn correct_answer_moves_across_seeds() {
    let positions: std::collections::HashSet<usize> = (0..50)
      .map(|seed| {
        let model = render(&batch()[..1], &mut StdRng::seed_from_u64(seed));
        model.groups[0].choices.iter().position(|c| c.is_correct).unwrap()
      })
      .collect();
    assert!(positions.len() > 1);
  }

  #[test]
  fn empty_batch_renders_empty_model() {
    let model = render(&[], &mut StdRng::seed_from_u64(0));
    assert!(model.is_empty());
  }
}
