//! Trivia · quiz round backend
//!
//! - Server-rendered quiz page plus Axum HTTP + WebSocket API
//! - Questions from Open Trivia DB, scores kept in a local JSON ledger
//! - Static assets from ./static
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   TRIVIA_CONFIG_PATH  : path to TOML config (api + ledger sections)
//!   OPENTDB_BASE_URL    : default "https://opentdb.com/api.php"
//!   TRIVIA_AMOUNT       : questions per round (default 10)
//!   LEDGER_PATH         : score file (default "trivia_scores.json")
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod source;
mod opentdb;
mod render;
mod grader;
mod ledger;
mod controller;
mod state;
mod logic;
mod protocol;
mod view;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::QuizConfig;
use crate::routes::build_router;
use crate::state::LiveState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = QuizConfig::from_env();

  // Question source + round controller (which owns the score ledger).
  let state = Arc::new(LiveState::from_config(&cfg)?);

  // Build the HTTP router with page, API, CORS and tracing layers.
  let app = build_router(state);

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "trivia_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "trivia_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "trivia_backend", error = %e, "Could not listen for ctrl-c; running until killed");
    std::future::pending::<()>().await;
  }
}
