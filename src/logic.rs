//! Core behaviors shared by the HTML page, HTTP API and WebSocket handlers.
//!
//! Each operation takes the controller lock for one synchronous transition,
//! releases it for the network fetch, then retakes it to apply the result.
//! The fetch and its `finish_fetch` run in their own task, so a request that
//! goes away mid-fetch still leaves the controller in a settled state.
//! Results for rounds superseded in the meantime are dropped by the
//! controller; callers see them as "still loading" (`Ok(None)`).

use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use crate::controller::{FetchOutcome, FetchTicket, Graded, Round, RoundState};
use crate::domain::Submission;
use crate::error::QuizError;
use crate::ledger::Ledger;
use crate::source::QuestionSource;
use crate::state::AppState;

/// What a client needs to draw the quiz screen.
#[derive(Clone, Debug)]
pub struct Snapshot {
  pub state: &'static str,
  pub round: Option<Round>,
  pub user: Option<String>,
  pub error: Option<String>,
  pub scores: Vec<(String, Vec<u32>)>,
}

#[derive(Clone, Debug)]
pub struct SubmitReport {
  pub graded: Graded,
  pub next_round: Option<Round>,
  pub next_error: Option<QuizError>,
}

async fn run_fetch<S: QuestionSource, L: Ledger>(
  state: &Arc<AppState<S, L>>,
  ticket: FetchTicket,
) -> Result<Option<Round>, QuizError> {
  let task_state = Arc::clone(state);
  let fetch = tokio::spawn(async move {
    let result = task_state.source.fetch_round(ticket.amount).await;
    let mut ctl = task_state.controller.lock().await;
    ctl.finish_fetch(ticket, result)
  });

  let outcome = match fetch.await {
    Ok(outcome) => outcome?,
    Err(e) => {
      error!(target: "round", seq = ticket.seq, error = %e, "Fetch task failed");
      return Err(QuizError::Network(format!("question fetch aborted: {}", e)));
    }
  };
  match outcome {
    FetchOutcome::Ready(round) => Ok(Some(round)),
    FetchOutcome::Stale { seq, current } => {
      debug!(target: "round", seq, current, "Fetch superseded");
      Ok(None)
    }
  }
}

/// Start a new round, superseding any round on screen or in flight.
#[instrument(level = "info", skip(state))]
pub async fn start_round<S: QuestionSource, L: Ledger>(state: &Arc<AppState<S, L>>) -> Result<Option<Round>, QuizError> {
  let ticket = state.controller.lock().await.start();
  run_fetch(state, ticket).await
}

/// The round on screen; a fresh process starts one. After a failed fetch
/// nothing is started until the player asks again.
#[instrument(level = "debug", skip(state))]
pub async fn current_or_start<S: QuestionSource, L: Ledger>(state: &Arc<AppState<S, L>>) -> Result<Option<Round>, QuizError> {
  let ticket = {
    let mut ctl = state.controller.lock().await;
    if let Some(round) = ctl.current_round() {
      return Ok(Some(round.clone()));
    }
    if *ctl.state() != RoundState::Idle || ctl.last_error().is_some() {
      return Ok(None);
    }
    ctl.start()
  };
  run_fetch(state, ticket).await
}

/// Grade, record, and immediately fetch the next round. A failed next fetch
/// does not undo the recorded score; it is reported alongside it.
#[instrument(level = "info", skip(state, submission), fields(answered = submission.0.len()))]
pub async fn submit_answers<S: QuestionSource, L: Ledger>(
  state: &Arc<AppState<S, L>>,
  user: &str,
  round_seq: Option<u64>,
  submission: &Submission,
) -> Result<SubmitReport, QuizError> {
  let graded = state.controller.lock().await.submit(user, round_seq, submission)?;
  let (next_round, next_error) = match run_fetch(state, graded.next).await {
    Ok(round) => (round, None),
    Err(e) => {
      warn!(target: "round", error = %e, "Next round could not be fetched");
      (None, Some(e))
    }
  };
  Ok(SubmitReport { graded, next_round, next_error })
}

/// Clear a player's history and start over.
#[instrument(level = "info", skip(state))]
pub async fn new_player<S: QuestionSource, L: Ledger>(
  state: &Arc<AppState<S, L>>,
  user: Option<&str>,
) -> Result<Option<Round>, QuizError> {
  let ticket = state.controller.lock().await.new_player(user)?;
  run_fetch(state, ticket).await
}

pub async fn scoreboard<S: QuestionSource, L: Ledger>(state: &AppState<S, L>) -> Result<Vec<(String, Vec<u32>)>, QuizError> {
  state.controller.lock().await.scores()
}

pub async fn snapshot<S: QuestionSource, L: Ledger>(state: &AppState<S, L>) -> Result<Snapshot, QuizError> {
  let ctl = state.controller.lock().await;
  Ok(Snapshot {
    state: ctl.state().name(),
    round: ctl.current_round().cloned(),
    user: ctl.current_user().map(str::to_string),
    error: ctl.last_error().map(str::to_string),
    scores: ctl.scores()?,
  })
}
