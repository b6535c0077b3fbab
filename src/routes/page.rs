//! Quiz page handlers: plain HTML forms, post/redirect/get.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
  extract::{Form, State},
  http::StatusCode,
  response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{info, instrument, warn};

use crate::domain::Submission;
use crate::error::QuizError;
use crate::ledger::Ledger;
use crate::logic::*;
use crate::source::QuestionSource;
use crate::state::AppState;
use crate::view::render_page;

async fn page_with<S: QuestionSource, L: Ledger>(
  state: &AppState<S, L>,
  status: StatusCode,
  notice: Option<String>,
) -> Response {
  match snapshot(state).await {
    Ok(snap) => (status, Html(render_page(&snap, notice.as_deref()))).into_response(),
    Err(e) => (e.status_code(), Html(format!("<p>{}</p>", crate::util::escape_html(&e.to_string())))).into_response(),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn page_index<S: QuestionSource, L: Ledger>(State(state): State<Arc<AppState<S, L>>>) -> Response {
  // Fetch errors are remembered by the controller and shown from the snapshot.
  if let Err(e) = current_or_start(&state).await {
    warn!(target: "trivia_backend", error = %e, "Round could not be loaded for page");
  }
  page_with(&state, StatusCode::OK, None).await
}

#[instrument(level = "info", skip(state, form), fields(fields = form.len()))]
pub async fn page_play<S: QuestionSource, L: Ledger>(
  State(state): State<Arc<AppState<S, L>>>,
  Form(form): Form<HashMap<String, String>>,
) -> Response {
  let user = form.get("username").map(String::as_str).unwrap_or("");
  let round = form.get("round").and_then(|r| r.parse::<u64>().ok());
  let submission = Submission::from_form(&form);

  match submit_answers(&state, user, round, &submission).await {
    Ok(report) => {
      info!(target: "round", user = %report.graded.user, score = report.graded.score, out_of = report.graded.out_of, "Page submit evaluated");
      Redirect::to("/").into_response()
    }
    Err(e @ QuizError::Validation(_)) => page_with(&state, StatusCode::UNPROCESSABLE_ENTITY, Some(e.to_string())).await,
    Err(e) => {
      // Stale or missing round: show whatever is current now.
      page_with(&state, e.status_code(), Some(e.to_string())).await
    }
  }
}

#[instrument(level = "info", skip(state, form))]
pub async fn page_new_player<S: QuestionSource, L: Ledger>(
  State(state): State<Arc<AppState<S, L>>>,
  Form(form): Form<HashMap<String, String>>,
) -> Response {
  // A blank name field means "whoever is playing now".
  let user = form.get("username").map(|s| s.trim()).filter(|s| !s.is_empty());
  match new_player(&state, user).await {
    Ok(_) => Redirect::to("/").into_response(),
    Err(e) if e.is_fetch_error() => Redirect::to("/").into_response(),
    Err(e) => page_with(&state, e.status_code(), Some(e.to_string())).await,
  }
}

#[instrument(level = "info", skip(state))]
pub async fn page_start<S: QuestionSource, L: Ledger>(State(state): State<Arc<AppState<S, L>>>) -> Response {
  if let Err(e) = start_round(&state).await {
    warn!(target: "trivia_backend", error = %e, "Retry did not load a round");
  }
  Redirect::to("/").into_response()
}
