//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::domain::Submission;
use crate::error::QuizError;
use crate::ledger::Ledger;
use crate::logic::*;
use crate::protocol::{to_rows, ClientWsMessage, RoundStatusOut, ServerWsMessage, SubmitOut};
use crate::source::QuestionSource;
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade<S: QuestionSource, L: Ledger>(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState<S, L>>>,
) -> impl IntoResponse {
  info!(target: "trivia_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws<S: QuestionSource, L: Ledger>(mut socket: WebSocket, state: Arc<AppState<S, L>>) {
  info!(target: "trivia_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "trivia_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "trivia_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "trivia_backend", "WebSocket disconnected");
}

fn error_msg(e: QuizError) -> ServerWsMessage {
  ServerWsMessage::Error { message: e.to_string() }
}

async fn status_msg<S: QuestionSource, L: Ledger>(state: &AppState<S, L>) -> ServerWsMessage {
  match snapshot(state).await {
    Ok(snap) => ServerWsMessage::Round(RoundStatusOut::from(&snap)),
    Err(e) => error_msg(e),
  }
}

#[instrument(level = "info", skip(state))]
pub(crate) async fn handle_client_ws<S: QuestionSource, L: Ledger>(msg: ClientWsMessage, state: &Arc<AppState<S, L>>) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartRound => match start_round(state).await {
      Ok(_) => status_msg(state).await,
      Err(e) => error_msg(e),
    },

    ClientWsMessage::CurrentRound => match current_or_start(state).await {
      Ok(_) => status_msg(state).await,
      Err(e) => error_msg(e),
    },

    ClientWsMessage::SubmitAnswers { username, round, answers } => {
      match submit_answers(state, &username, round, &Submission(answers)).await {
        Ok(report) => {
          tracing::info!(target: "round", user = %report.graded.user, score = report.graded.score, "WS submit_answers evaluated");
          ServerWsMessage::Graded(SubmitOut::from(&report))
        }
        Err(e) => error_msg(e),
      }
    }

    ClientWsMessage::NewPlayer { username } => match new_player(state, username.as_deref()).await {
      Ok(_) => status_msg(state).await,
      Err(e) => error_msg(e),
    },

    ClientWsMessage::Scores => match scoreboard(state).await {
      Ok(scores) => ServerWsMessage::Scores { scores: to_rows(scores) },
      Err(e) => error_msg(e),
    },
  }
}
