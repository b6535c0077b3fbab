//! Score ledger: per-user history of round scores, oldest first.
//!
//! Persisted as one JSON object `{ "user": [scores...] }` that is replaced
//! whole on every write. User order is the order users were first added.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info, instrument, warn};

use crate::error::QuizError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScoreLedger {
  entries: Vec<(String, Vec<u32>)>,
}

impl ScoreLedger {
  pub fn get(&self, user: &str) -> Option<&[u32]> {
    self.entries.iter().find(|(u, _)| u == user).map(|(_, s)| s.as_slice())
  }

  pub fn push(&mut self, user: &str, score: u32) {
    match self.entries.iter_mut().find(|(u, _)| u == user) {
      Some((_, scores)) => scores.push(score),
      None => self.entries.push((user.to_string(), vec![score])),
    }
  }

  /// Remove the user's whole history. Returns whether an entry existed.
  pub fn remove(&mut self, user: &str) -> bool {
    let before = self.entries.len();
    self.entries.retain(|(u, _)| u != user);
    self.entries.len() != before
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn into_entries(self) -> Vec<(String, Vec<u32>)> {
    self.entries
  }
}

#[cfg(test)]
impl ScoreLedger {
  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
    self.entries.iter().map(|(u, s)| (u.as_str(), s.as_slice()))
  }
}

impl Serialize for ScoreLedger {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(self.entries.iter().map(|(u, s)| (u, s)))
  }
}

impl<'de> Deserialize<'de> for ScoreLedger {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct LedgerVisitor;

    impl<'de> Visitor<'de> for LedgerVisitor {
      type Value = ScoreLedger;

      fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of user name to list of scores")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ScoreLedger, A::Error> {
        let mut ledger = ScoreLedger::default();
        while let Some((user, scores)) = map.next_entry::<String, Vec<u32>>()? {
          // A repeated key replaces the earlier value in place.
          match ledger.entries.iter_mut().find(|(u, _)| *u == user) {
            Some((_, existing)) => *existing = scores,
            None => ledger.entries.push((user, scores)),
          }
        }
        Ok(ledger)
      }
    }

    deserializer.deserialize_map(LedgerVisitor)
  }
}

/// Durable per-user score history.
pub trait Ledger: Send + 'static {
  /// Current ledger; empty if nothing was ever stored.
  fn load(&self) -> Result<ScoreLedger, QuizError>;
  /// Append one round score to `user`, creating the entry if absent.
  fn append(&mut self, user: &str, score: u32) -> Result<(), QuizError>;
  /// Drop `user`'s entry entirely; no-op if absent.
  fn clear(&mut self, user: &str) -> Result<(), QuizError>;

  fn list(&self) -> Result<Vec<(String, Vec<u32>)>, QuizError> {
    Ok(self.load()?.into_entries())
  }
}

/// Ledger kept as a JSON document on disk.
#[derive(Clone, Debug)]
pub struct FileLedger {
  path: PathBuf,
}

impl FileLedger {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  #[instrument(level = "debug", skip(self, ledger), fields(path = %self.path.display(), users = ledger.len()))]
  fn store(&self, ledger: &ScoreLedger) -> Result<(), QuizError> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent).map_err(|e| storage_err("create directory", parent, e))?;
    }
    let body = serde_json::to_vec_pretty(ledger).map_err(|e| QuizError::Storage(e.to_string()))?;

    // Write beside the target then rename over it, so readers never see half a document.
    let tmp = self.path.with_extension("json.tmp");
    std::fs::write(&tmp, body).map_err(|e| storage_err("write", &tmp, e))?;
    std::fs::rename(&tmp, &self.path).map_err(|e| storage_err("replace", &self.path, e))?;
    Ok(())
  }
}

fn storage_err(action: &str, path: &Path, e: std::io::Error) -> QuizError {
  QuizError::Storage(format!("{} {}: {}", action, path.display(), e))
}

impl Ledger for FileLedger {
  fn load(&self) -> Result<ScoreLedger, QuizError> {
    match std::fs::read_to_string(&self.path) {
      Ok(s) if s.trim().is_empty() => Ok(ScoreLedger::default()),
      Ok(s) => serde_json::from_str(&s).map_err(|e| {
        warn!(target: "ledger", path = %self.path.display(), error = %e, "Ledger file is not a valid score document");
        QuizError::Storage(format!("parse {}: {}", self.path.display(), e))
      }),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ScoreLedger::default()),
      Err(e) => Err(storage_err("read", &self.path, e)),
    }
  }

  fn append(&mut self, user: &str, score: u32) -> Result<(), QuizError> {
    let mut ledger = self.load()?;
    ledger.push(user, score);
    self.store(&ledger)?;
    info!(target: "ledger", %user, score, rounds = ledger.get(user).map_or(0, |s| s.len()), "Score recorded");
    Ok(())
  }

  fn clear(&mut self, user: &str) -> Result<(), QuizError> {
    let mut ledger = self.load()?;
    if !ledger.remove(user) {
      debug!(target: "ledger", %user, "No history to clear");
      return Ok(());
    }
    self.store(&ledger)?;
    info!(target: "ledger", %user, "Score history cleared");
    Ok(())
  }
}

/// In-process ledger; nothing survives the process.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger {
  inner: ScoreLedger,
}

#[cfg(test)]
impl Ledger for MemoryLedger {
  fn load(&self) -> Result<ScoreLedger, QuizError> {
    Ok(self.inner.clone())
  }

  fn append(&mut self, user: &str, score: u32) -> Result<(), QuizError> {
    self.inner.push(user, score);
    Ok(())
  }

  fn clear(&mut self, user: &str) -> Result<(), QuizError> {
    self.inner.remove(user);
    Ok(())
  }
}
