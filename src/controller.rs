//! Round lifecycle: Idle → Loading → AwaitingSubmission → Grading → Loading ...
//!
//! All transitions here are synchronous. The fetch itself happens outside the
//! controller (see `logic`), between `start`/`submit`/`new_player`, which hand
//! out a `FetchTicket`, and `finish_fetch`, which redeems it. Tickets carry
//! the round sequence number; a ticket whose round has been superseded is
//! discarded on arrival.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{Question, RenderModel, Submission};
use crate::error::QuizError;
use crate::grader::grade;
use crate::ledger::Ledger;
use crate::render::render;

/// A rendered round waiting for answers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round {
  pub seq: u64,
  pub model: RenderModel,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoundState {
  Idle,
  Loading { seq: u64 },
  AwaitingSubmission { round: Round },
  Grading { seq: u64 },
}

impl RoundState {
  pub fn name(&self) -> &'static str {
    match self {
      RoundState::Idle => "idle",
      RoundState::Loading { .. } => "loading",
      RoundState::AwaitingSubmission { .. } => "awaiting_submission",
      RoundState::Grading { .. } => "grading",
    }
  }
}

/// Permission to fetch questions for round `seq`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
  pub seq: u64,
  pub amount: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
  /// The round is rendered and awaiting submission.
  Ready(Round),
  /// The round was superseded while its fetch was in flight.
  Stale { seq: u64, current: u64 },
}

/// Result of a graded submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graded {
  pub user: String,
  pub score: u32,
  pub out_of: u32,
  pub round_seq: u64,
  /// Ticket for the round that was started right after grading.
  pub next: FetchTicket,
}

pub struct RoundController<L: Ledger> {
  ledger: L,
  rng: StdRng,
  amount: usize,
  seq: u64,
  state: RoundState,
  current_user: Option<String>,
  last_error: Option<String>,
}

impl<L: Ledger> RoundController<L> {
  pub fn new(ledger: L, amount: usize) -> Self {
    Self::with_rng(ledger, amount, StdRng::from_entropy())
  }

  pub fn with_rng(ledger: L, amount: usize, rng: StdRng) -> Self {
    Self {
      ledger,
      rng,
      amount: amount.max(1),
      seq: 0,
      state: RoundState::Idle,
      current_user: None,
      last_error: None,
    }
  }

  pub fn state(&self) -> &RoundState { &self.state }

  pub fn current_round(&self) -> Option<&Round> {
    match &self.state {
      RoundState::AwaitingSubmission { round } => Some(round),
      _ => None,
    }
  }

  pub fn current_user(&self) -> Option<&str> { self.current_user.as_deref() }

  pub fn last_error(&self) -> Option<&str> { self.last_error.as_deref() }

  pub fn scores(&self) -> Result<Vec<(String, Vec<u32>)>, QuizError> {
    self.ledger.list()
  }

  /// Begin a fresh round from any state; whatever was in flight or on
  /// screen is superseded.
  #[instrument(level = "debug", skip(self), fields(from = self.state.name()))]
  pub fn start(&mut self) -> FetchTicket {
    self.begin_loading()
  }

  fn begin_loading(&mut self) -> FetchTicket {
    self.seq += 1;
    self.state = RoundState::Loading { seq: self.seq };
    self.last_error = None;
    debug!(target: "round", seq = self.seq, amount = self.amount, "Round loading");
    FetchTicket { seq: self.seq, amount: self.amount }
  }

  /// Apply the outcome of the fetch for `ticket`.
  #[instrument(level = "debug", skip(self, ticket, result), fields(seq = ticket.seq, ok = result.is_ok()))]
  pub fn finish_fetch(
    &mut self,
    ticket: FetchTicket,
    result: Result<Vec<Question>, QuizError>,
  ) -> Result<FetchOutcome, QuizError> {
    if self.state != (RoundState::Loading { seq: ticket.seq }) {
      info!(target: "round", seq = ticket.seq, current = self.seq, state = self.state.name(), "Discarding stale fetch result");
      return Ok(FetchOutcome::Stale { seq: ticket.seq, current: self.seq });
    }

    match result {
      Ok(questions) => {
        let model = render(&questions, &mut self.rng);
        let round = Round { seq: ticket.seq, model };
        info!(target: "round", seq = round.seq, questions = round.model.len(), "Round ready");
        self.state = RoundState::AwaitingSubmission { round: round.clone() };
        Ok(FetchOutcome::Ready(round))
      }
      Err(e) => {
        error!(target: "round", seq = ticket.seq, error = %e, "Round fetch failed");
        self.state = RoundState::Idle;
        self.last_error = Some(e.to_string());
        Err(e)
      }
    }
  }

  /// Grade the current round for `user`, record the score, and move on to the
  /// next round. `round_seq`, when given, must name the round on screen.
  #[instrument(level = "info", skip(self, submission), fields(answered = submission.0.len()))]
  pub fn submit(
    &mut self,
    user: &str,
    round_seq: Option<u64>,
    submission: &Submission,
  ) -> Result<Graded, QuizError> {
    let round = match &self.state {
      RoundState::AwaitingSubmission { round } => round.clone(),
      _ => return Err(QuizError::NoActiveRound),
    };
    if let Some(got) = round_seq {
      if got != round.seq {
        warn!(target: "round", expected = round.seq, got, "Submission for a superseded round");
        return Err(QuizError::StaleRound { expected: round.seq, got });
      }
    }
    let user = validate_username(user)?;

    self.state = RoundState::Grading { seq: round.seq };
    let score = grade(submission, &round.model);
    let out_of = round.model.len() as u32;

    if let Err(e) = self.ledger.append(&user, score) {
      error!(target: "round", seq = round.seq, error = %e, "Could not record score; round stays open");
      self.state = RoundState::AwaitingSubmission { round };
      return Err(e);
    }
    info!(target: "round", seq = round.seq, %user, score, out_of, "Round graded");

    self.current_user = Some(user.clone());
    let next = self.begin_loading();
    Ok(Graded { user, score, out_of, round_seq: round.seq, next })
  }

  /// Forget a player: clear their history, reset the current user and start
  /// a new round. Without an explicit name the current user is cleared.
  #[instrument(level = "info", skip(self), fields(from = self.state.name()))]
  pub fn new_player(&mut self, user: Option<&str>) -> Result<FetchTicket, QuizError> {
    let target = match user {
      Some(name) => Some(validate_username(name)?),
      None => self.current_user.clone(),
    };
    if let Some(name) = &target {
      self.ledger.clear(name)?;
      info!(target: "round", user = %name, "New player: history cleared");
    }
    self.current_user = None;
    Ok(self.begin_loading())
  }
}

/// Usernames are case-sensitive arbitrary text; only surrounding whitespace
/// is dropped, and nothing may remain empty.
pub fn validate_username(raw: &str) -> Result<String, QuizError> {
  let name = raw.trim();
  if name.is_empty() {
    return Err(QuizError::Validation("Please enter your name before submitting".into()));
  }
  Ok(name.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ledger::MemoryLedger;

  fn controller() -> RoundController<MemoryLedger> {
    RoundController::with_rng(MemoryLedger::default(), 10, StdRng::seed_from_u64(11))
  }

  fn batch() -> Vec<Question> {
    vec![
      Question::new("Capital of France?", "Paris", &["Lyon", "Nice", "Lille"]),
      Question::new("2 + 2?", "4", &["3", "5", "7"]),
    ]
  }

  fn ready(ctl: &mut RoundController<MemoryLedger>) -> Round {
    let ticket = ctl.start();
    match ctl.finish_fetch(ticket, Ok(batch())).unwrap() {
      FetchOutcome::Ready(round) => round,
      other => panic!("expected ready round, got {:?}", other),
    }
  }

  #[test]
  fn starts_idle_and_loads() {
    let mut ctl = controller();
    assert_eq!(ctl.state(), &RoundState::Idle);
    let ticket = ctl.start();
    assert_eq!(ticket, FetchTicket { seq: 1, amount: 10 });
    assert_eq!(ctl.state(), &RoundState::Loading { seq: 1 });
  }

  #[test]
  fn successful_fetch_awaits_submission() {
    let mut ctl = controller();
    let round = ready(&mut ctl);
    assert_eq!(round.seq, 1);
    assert_eq!(round.model.len(), 2);
    assert_eq!(ctl.current_round(), Some(&round));
  }

  #[test]
  fn failed_fetch_returns_to_idle_with_error() {
    let mut ctl = controller();
    let ticket = ctl.start();
    let err = ctl.finish_fetch(ticket, Err(QuizError::Network("dns".into()))).unwrap_err();
    assert_eq!(err, QuizError::Network("dns".into()));
    assert_eq!(ctl.state(), &RoundState::Idle);
    assert!(ctl.last_error().unwrap().contains("dns"));

    // Retrying clears the surfaced error.
    ctl.start();
    assert_eq!(ctl.last_error(), None);
  }

  #[test]
  fn stale_fetch_is_discarded() {
    let mut ctl = controller();
    let old = ctl.start();
    let fresh = ctl.start();

    let outcome = ctl.finish_fetch(old, Ok(batch())).unwrap();
    assert_eq!(outcome, FetchOutcome::Stale { seq: 1, current: 2 });
    assert_eq!(ctl.state(), &RoundState::Loading { seq: 2 });

    // A stale failure is dropped too, without touching state.
    assert!(ctl.finish_fetch(old, Err(QuizError::Network("late".into()))).is_ok());
    assert_eq!(ctl.last_error(), None);

    assert!(matches!(ctl.finish_fetch(fresh, Ok(batch())).unwrap(), FetchOutcome::Ready(_)));
  }

  #[test]
  fn duplicate_fetch_result_is_stale() {
    let mut ctl = controller();
    let ticket = ctl.start();
    ctl.finish_fetch(ticket, Ok(batch())).unwrap();
    let again = ctl.finish_fetch(ticket, Ok(vec![])).unwrap();
    assert!(matches!(again, FetchOutcome::Stale { .. }));
    assert_eq!(ctl.current_round().unwrap().model.len(), 2);
  }

  #[test]
  fn submit_grades_records_and_loads_next_round() {
    let mut ctl = controller();
    let round = ready(&mut ctl);
    let sub = Submission::new().select(0, "Paris").select(1, "7");

    let graded = ctl.submit("Ana", Some(round.seq), &sub).unwrap();
    assert_eq!(graded.score, 1);
    assert_eq!(graded.out_of, 2);
    assert_eq!(graded.next, FetchTicket { seq: 2, amount: 10 });
    assert_eq!(ctl.state(), &RoundState::Loading { seq: 2 });
    assert_eq!(ctl.current_user(), Some("Ana"));
    assert_eq!(ctl.scores().unwrap(), vec![("Ana".to_string(), vec![1])]);
  }

  #[test]
  fn empty_username_is_rejected_and_round_kept() {
    let mut ctl = controller();
    let round = ready(&mut ctl);
    let sub = Submission::new().select(0, "Paris");

    let err = ctl.submit("   ", Some(round.seq), &sub).unwrap_err();
    assert!(matches!(err, QuizError::Validation(_)));
    assert_eq!(ctl.state(), &RoundState::AwaitingSubmission { round });
    assert!(ctl.scores().unwrap().is_empty());
  }

  #[test]
  fn submit_without_round_is_rejected() {
    let mut ctl = controller();
    assert_eq!(ctl.submit("Ana", None, &Submission::new()), Err(QuizError::NoActiveRound));
    ctl.start();
    assert_eq!(ctl.submit("Ana", None, &Submission::new()), Err(QuizError::NoActiveRound));
  }

  #[test]
  fn submit_for_superseded_round_is_rejected() {
    let mut ctl = controller();
    ready(&mut ctl);
    let current = ready(&mut ctl);
    let err = ctl.submit("Ana", Some(1), &Submission::new()).unwrap_err();
    assert_eq!(err, QuizError::StaleRound { expected: current.seq, got: 1 });
    assert!(ctl.scores().unwrap().is_empty());
  }

  #[test]
  fn username_is_trimmed_but_case_kept() {
    let mut ctl = controller();
    ready(&mut ctl);
    let graded = ctl.submit("  Ana ", None, &Submission::new()).unwrap();
    assert_eq!(graded.user, "Ana");
    assert_eq!(graded.score, 0);
  }

  #[test]
  fn scores_accumulate_across_rounds() {
    let mut ctl = controller();
    for picks in [("Paris", "4"), ("Lyon", "4")] {
      let graded_next = {
        let round = ctl.current_round().cloned();
        let round = match round { Some(r) => r, None => ready(&mut ctl) };
        let sub = Submission::new().select(0, picks.0).select(1, picks.1);
        ctl.submit("Ana", Some(round.seq), &sub).unwrap().next
      };
      ctl.finish_fetch(graded_next, Ok(batch())).unwrap();
    }
    assert_eq!(ctl.scores().unwrap(), vec![("Ana".to_string(), vec![2, 1])]);
  }

  #[test]
  fn new_player_clears_only_that_user() {
    let mut ledger = MemoryLedger::default();
    ledger.append("Ana", 7).unwrap();
    ledger.append("Ana", 9).unwrap();
    ledger.append("Ben", 3).unwrap();
    let mut ctl = RoundController::with_rng(ledger, 10, StdRng::seed_from_u64(1));
    ready(&mut ctl);

    let ticket = ctl.new_player(Some("Ana")).unwrap();
    assert_eq!(ctl.state(), &RoundState::Loading { seq: ticket.seq });
    assert_eq!(ctl.current_user(), None);
    assert_eq!(ctl.scores().unwrap(), vec![("Ben".to_string(), vec![3])]);
  }

  #[test]
  fn new_player_defaults_to_current_user() {
    let mut ctl = controller();
    ready(&mut ctl);
    let next = ctl.submit("Ana", None, &Submission::new()).unwrap().next;
    ctl.finish_fetch(next, Ok(batch())).unwrap();

    ctl.new_player(None).unwrap();
    assert!(ctl.scores().unwrap().is_empty());
    assert_eq!(ctl.current_user(), None);
  }

  #[test]
  fn new_player_with_blank_name_is_rejected() {
    let mut ctl = controller();
    let round = ready(&mut ctl);
    assert!(matches!(ctl.new_player(Some("")), Err(QuizError::Validation(_))));
    assert_eq!(ctl.current_round(), Some(&round));
  }

  #[test]
  fn new_player_supersedes_in_flight_fetch() {
    let mut ctl = controller();
    let first = ctl.start();
    let second = ctl.new_player(None).unwrap();
    assert!(matches!(ctl.finish_fetch(first, Ok(batch())).unwrap(), FetchOutcome::Stale { .. }));
    assert!(matches!(ctl.finish_fetch(second, Ok(batch())).unwrap(), FetchOutcome::Ready(_)));
  }

  #[test]
  fn amount_is_at_least_one() {
    let mut ctl = RoundController::with_rng(MemoryLedger::default(), 0, StdRng::seed_from_u64(0));
    assert_eq!(ctl.start().amount, 1);
  }
}
