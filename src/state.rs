//! Application state: the question source and the round controller (which
//! owns the ledger), shared by every transport.
//!
//! The controller sits behind an async mutex. Its transitions run to
//! completion while the lock is held; network fetches never hold it.

use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::config::QuizConfig;
use crate::controller::RoundController;
use crate::error::QuizError;
use crate::ledger::{FileLedger, Ledger};
use crate::opentdb::OpenTdb;
use crate::source::QuestionSource;

pub struct AppState<S: QuestionSource, L: Ledger> {
    pub source: S,
    pub controller: Mutex<RoundController<L>>,
}

impl<S: QuestionSource, L: Ledger> AppState<S, L> {
    pub fn new(source: S, controller: RoundController<L>) -> Self {
        Self { source, controller: Mutex::new(controller) }
    }
}

/// Production wiring: OpenTDB questions, scores in a JSON file.
pub type LiveState = AppState<OpenTdb, FileLedger>;

impl LiveState {
    #[instrument(level = "info", skip_all)]
    pub fn from_config(cfg: &QuizConfig) -> Result<Self, QuizError> {
        let source = OpenTdb::from_config(&cfg.api)?;
        let ledger = FileLedger::new(cfg.ledger.path.clone());

        // Surface a broken ledger at startup rather than on the first submit.
        let known = ledger.load()?;
        info!(
            target: "trivia_backend",
            base_url = %source.base_url,
            amount = cfg.api.amount,
            ledger = %ledger.path().display(),
            players = known.len(),
            "Quiz state ready"
        );

        Ok(Self::new(source, RoundController::new(ledger, cfg.api.amount)))
    }
}
