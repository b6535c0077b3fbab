//! Error type shared by the question source, the controller and the ledger.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
  /// Transport failure: DNS, connect, timeout or a non-success HTTP status.
  Network(String),
  /// The trivia API answered, but not with the JSON shape we expect.
  MalformedResponse(String),
  /// The trivia API answered with a non-zero `response_code`.
  Upstream { code: u8 },
  /// Rejected user input (empty username).
  Validation(String),
  /// Submit arrived while no round was awaiting submission.
  NoActiveRound,
  /// Submit carried a round number that has since been superseded.
  StaleRound { expected: u64, got: u64 },
  /// Ledger document could not be read, parsed or written.
  Storage(String),
}

impl QuizError {
  /// Human readable meaning of an OpenTDB `response_code`.
  pub fn upstream_reason(code: u8) -> &'static str {
    match code {
      1 => "not enough questions for the requested amount",
      2 => "invalid parameter",
      3 => "session token not found",
      4 => "session token exhausted",
      5 => "rate limited, try again in a few seconds",
      _ => "unknown response code",
    }
  }

  /// Fetch failures are recoverable by asking for a new round.
  pub fn is_fetch_error(&self) -> bool {
    matches!(self, QuizError::Network(_) | QuizError::MalformedResponse(_) | QuizError::Upstream { .. })
  }
}

impl fmt::Display for QuizError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      QuizError::Network(e) => write!(f, "Could not reach the trivia service: {}", e),
      QuizError::MalformedResponse(e) => write!(f, "Unexpected response from the trivia service: {}", e),
      QuizError::Upstream { code } => {
        write!(f, "Trivia service refused the request (code {}): {}", code, Self::upstream_reason(*code))
      }
      QuizError::Validation(e) => write!(f, "{}", e),
      QuizError::NoActiveRound => write!(f, "No round is waiting for answers"),
      QuizError::StaleRound { expected, got } => {
        write!(f, "Answers were for round {} but the current round is {}", got, expected)
      }
      QuizError::Storage(e) => write!(f, "Score ledger error: {}", e),
    }
  }
}

impl std::error::Error for QuizError {}
