//! Router assembly: quiz page, HTTP API, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::ledger::Ledger;
use crate::source::QuestionSource;
use crate::state::AppState;

pub mod http;
pub mod page;
pub mod ws;

/// Build the application router with:
/// - the quiz page at `/` with form posts to `/play`, `/new-player`, `/start`
/// - WebSocket at `/ws`
/// - JSON API under `/api/v1/...`
/// - stylesheet and other assets from `./static`
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router<S: QuestionSource, L: Ledger>(state: Arc<AppState<S, L>>) -> Router {
    Router::new()
        // Quiz page
        .route("/", get(page::page_index::<S, L>))
        .route("/play", post(page::page_play::<S, L>))
        .route("/new-player", post(page::page_new_player::<S, L>))
        .route("/start", post(page::page_start::<S, L>))
        // WebSocket
        .route("/ws", get(ws::ws_upgrade::<S, L>))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route(
            "/api/v1/round",
            get(http::http_get_round::<S, L>).post(http::http_post_round::<S, L>),
        )
        .route("/api/v1/submit", post(http::http_post_submit::<S, L>))
        .route("/api/v1/new_player", post(http::http_post_new_player::<S, L>))
        .route("/api/v1/scores", get(http::http_get_scores::<S, L>))
        .nest_service("/static", ServeDir::new("./static"))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
