//! HTTP JSON endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}, Json};
use tracing::{info, instrument};

use crate::domain::Submission;
use crate::error::QuizError;
use crate::ledger::Ledger;
use crate::logic::*;
use crate::protocol::*;
use crate::source::QuestionSource;
use crate::state::AppState;

impl QuizError {
  pub fn status_code(&self) -> StatusCode {
    match self {
      QuizError::Validation(_) => StatusCode::BAD_REQUEST,
      QuizError::NoActiveRound | QuizError::StaleRound { .. } => StatusCode::CONFLICT,
      QuizError::Network(_) | QuizError::MalformedResponse(_) | QuizError::Upstream { .. } => StatusCode::BAD_GATEWAY,
      QuizError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for QuizError {
  fn into_response(self) -> Response {
    (self.status_code(), Json(ErrorOut { message: self.to_string() })).into_response()
  }
}

type ApiResult<T> = Result<Json<T>, QuizError>;

async fn status_out<S: QuestionSource, L: Ledger>(state: &AppState<S, L>) -> ApiResult<RoundStatusOut> {
  let snap = snapshot(state).await?;
  Ok(Json(RoundStatusOut::from(&snap)))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_round<S: QuestionSource, L: Ledger>(
  State(state): State<Arc<AppState<S, L>>>,
) -> ApiResult<RoundStatusOut> {
  status_out(&state).await
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_round<S: QuestionSource, L: Ledger>(
  State(state): State<Arc<AppState<S, L>>>,
) -> ApiResult<RoundStatusOut> {
  let round = start_round(&state).await?;
  info!(target: "round", seq = ?round.as_ref().map(|r| r.seq), "HTTP round started");
  status_out(&state).await
}

#[instrument(level = "info", skip(state, body), fields(user = %body.username, round = ?body.round, answered = body.answers.len()))]
pub async fn http_post_submit<S: QuestionSource, L: Ledger>(
  State(state): State<Arc<AppState<S, L>>>,
  Json(body): Json<SubmitIn>,
) -> ApiResult<SubmitOut> {
  let submission = Submission(body.answers);
  let report = submit_answers(&state, &body.username, body.round, &submission).await?;
  info!(target: "round", user = %report.graded.user, score = report.graded.score, out_of = report.graded.out_of, "HTTP submit evaluated");
  Ok(Json(SubmitOut::from(&report)))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_new_player<S: QuestionSource, L: Ledger>(
  State(state): State<Arc<AppState<S, L>>>,
  body: Option<Json<NewPlayerIn>>,
) -> ApiResult<RoundStatusOut> {
  let body = body.map(|Json(b)| b).unwrap_or_default();
  new_player(&state, body.username.as_deref()).await?;
  status_out(&state).await
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_scores<S: QuestionSource, L: Ledger>(
  State(state): State<Arc<AppState<S, L>>>,
) -> ApiResult<ScoresOut> {
  let scores = scoreboard(&state).await?;
  Ok(Json(ScoresOut { scores: to_rows(scores) }))
}
