//! Where a round's questions come from.

use std::future::Future;

use crate::domain::Question;
use crate::error::QuizError;

/// One-shot fetch of a batch of questions. Implementations make a single
/// attempt; retrying is the player's call (start another round).
pub trait QuestionSource: Send + Sync + 'static {
  fn fetch_round(&self, amount: usize) -> impl Future<Output = Result<Vec<Question>, QuizError>> + Send;
}

#[cfg(test)]
pub use fixed::FixedSource;

#[cfg(test)]
mod fixed {
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  use tokio::sync::Semaphore;

  use super::*;

  /// Serves the same batch every time, or a configured error. A gated source
  /// holds each fetch until `release` lets it through.
  pub struct FixedSource {
    batch: Vec<Question>,
    fail_with: Mutex<Option<QuizError>>,
    calls: AtomicUsize,
    gate: Option<Semaphore>,
  }

  impl FixedSource {
    pub fn new(batch: Vec<Question>) -> Self {
      Self { batch, fail_with: Mutex::new(None), calls: AtomicUsize::new(0), gate: None }
    }

    pub fn failing(err: QuizError) -> Self {
      Self { fail_with: Mutex::new(Some(err)), ..Self::new(Vec::new()) }
    }

    pub fn gated(self) -> Self {
      Self { gate: Some(Semaphore::new(0)), ..self }
    }

    /// Let `n` held fetches complete.
    pub fn release(&self, n: usize) {
      if let Some(gate) = &self.gate {
        gate.add_permits(n);
      }
    }

    pub fn set_failure(&self, err: Option<QuizError>) {
      *self.fail_with.lock().unwrap() = err;
    }

    pub fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }

    /// Two-question batch used across tests.
    pub fn geography() -> Self {
      Self::new(vec![
        Question::new("What is the capital of France?", "Paris", &["Lyon", "Nice", "Lille"]),
        Question::new("What is 2 + 2?", "4", &["3", "5", "7"]),
      ])
    }
  }

  impl QuestionSource for FixedSource {
    async fn fetch_round(&self, amount: usize) -> Result<Vec<Question>, QuizError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if let Some(gate) = &self.gate {
        if let Ok(permit) = gate.acquire().await {
          permit.forget();
        }
      }
      if let Some(err) = self.fail_with.lock().unwrap().clone() {
        return Err(err);
      }
      Ok(self.batch.iter().take(amount).cloned().collect())
    }
  }
}
