//! Loading quiz configuration (trivia API parameters + ledger location) from TOML.
//!
//! The file is optional: TRIVIA_CONFIG_PATH names it, and environment
//! variables override individual values afterwards. See `QuizConfig`.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info, warn};

#[derive(Clone, Debug, Deserialize, Default, PartialEq)]
pub struct QuizConfig {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub ledger: LedgerConfig,
}

/// OpenTDB serves at most this many questions per request.
pub const MAX_AMOUNT: usize = 50;

/// Where questions come from and how many per round.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  pub amount: usize,
  pub question_type: String,
  pub category: Option<u32>,
  pub difficulty: Option<String>,
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "https://opentdb.com/api.php".into(),
      amount: 10,
      question_type: "multiple".into(),
      category: None,
      difficulty: None,
      timeout_secs: 10,
    }
  }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
  pub path: PathBuf,
}

impl Default for LedgerConfig {
  fn default() -> Self {
    Self { path: PathBuf::from("trivia_scores.json") }
  }
}

impl QuizConfig {
  /// Parse a TOML document; missing sections and keys take their defaults.
  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
    let mut cfg = toml::from_str::<QuizConfig>(s)?;
    cfg.normalize();
    Ok(cfg)
  }

  /// File named by TRIVIA_CONFIG_PATH (if any), then env overrides.
  pub fn from_env() -> Self {
    let mut cfg = load_config_file_from_env().unwrap_or_default();
    cfg.apply_overrides(|key| std::env::var(key).ok());
    cfg
  }

  /// Apply OPENTDB_BASE_URL / TRIVIA_AMOUNT / LEDGER_PATH from `lookup`.
  pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("OPENTDB_BASE_URL") {
      self.api.base_url = url;
    }
    if let Some(raw) = lookup("TRIVIA_AMOUNT") {
      match raw.parse::<usize>() {
        Ok(n) => self.api.amount = n,
        Err(e) => warn!(target: "trivia_backend", %raw, error = %e, "Ignoring invalid TRIVIA_AMOUNT"),
      }
    }
    if let Some(path) = lookup("LEDGER_PATH") {
      self.ledger.path = PathBuf::from(path);
    }
    self.normalize();
  }

  fn normalize(&mut self) {
    // A round always carries at least one question.
    if self.api.amount == 0 {
      self.api.amount = 1;
    }
    if self.api.amount > MAX_AMOUNT {
      warn!(target: "trivia_backend", requested = self.api.amount, max = MAX_AMOUNT, "Question amount capped");
      self.api.amount = MAX_AMOUNT;
    }
  }
}

/// Attempt to load `QuizConfig` from TRIVIA_CONFIG_PATH. On any parsing/IO error, returns None.
fn load_config_file_from_env() -> Option<QuizConfig> {
  let path = std::env::var("TRIVIA_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match QuizConfig::from_toml_str(&s) {
      Ok(cfg) => {
        info!(target: "trivia_backend", %path, "Loaded quiz config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "trivia_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "trivia_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
