//! Open Trivia DB client: the production question source.
//!
//! One GET per round, no retries. The payload is parsed by `parse_payload`
//! so the shape checks can be exercised without the network.

use std::time::Duration;

use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::config::ApiConfig;
use crate::domain::Question;
use crate::error::QuizError;
use crate::source::QuestionSource;
use crate::util::{decode_entities, trunc_for_log};

#[derive(Clone)]
pub struct OpenTdb {
  pub client: reqwest::Client,
  pub base_url: String,
  pub question_type: String,
  pub category: Option<u32>,
  pub difficulty: Option<String>,
}

#[derive(Deserialize)]
struct ApiResponse {
  response_code: u8,
  results: Vec<ApiQuestion>,
}

#[derive(Deserialize)]
struct ApiQuestion {
  question: String,
  correct_answer: String,
  incorrect_answers: Vec<String>,
  #[serde(default)] category: String,
  #[serde(default)] difficulty: String,
}

impl OpenTdb {
  pub fn from_config(cfg: &ApiConfig) -> Result<Self, QuizError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs))
      .build()
      .map_err(|e| QuizError::Network(e.to_string()))?;

    Ok(Self {
      client,
      base_url: cfg.base_url.clone(),
      question_type: cfg.question_type.clone(),
      category: cfg.category,
      difficulty: cfg.difficulty.clone(),
    })
  }

  /// Query pairs for one round: amount, type, and the optional filters.
  pub fn query(&self, amount: usize) -> Vec<(&'static str, String)> {
    let mut q = vec![("amount", amount.to_string()), ("type", self.question_type.clone())];
    if let Some(cat) = self.category {
      q.push(("category", cat.to_string()));
    }
    if let Some(diff) = &self.difficulty {
      q.push(("difficulty", diff.clone()));
    }
    q
  }
}

impl QuestionSource for OpenTdb {
  #[instrument(level = "info", skip(self), fields(base_url = %self.base_url))]
  async fn fetch_round(&self, amount: usize) -> Result<Vec<Question>, QuizError> {
    let start = std::time::Instant::now();
    let res = self.client.get(&self.base_url)
      .header(USER_AGENT, "trivia-backend/0.1")
      .header(ACCEPT, "application/json")
      .query(&self.query(amount))
      .send().await
      .map_err(|e| QuizError::Network(e.to_string()))?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      error!(target: "round", %status, body = %trunc_for_log(&body, 200), "Trivia API returned an error status");
      return Err(QuizError::Network(format!("HTTP {}", status)));
    }

    let body = res.text().await.map_err(|e| QuizError::Network(e.to_string()))?;
    let questions = parse_payload(&body)?;
    info!(target: "round", elapsed = ?start.elapsed(), count = questions.len(), bytes = body.len(), "Fetched trivia questions");
    Ok(questions)
  }
}

/// Parse an OpenTDB JSON body into decoded questions.
pub fn parse_payload(body: &str) -> Result<Vec<Question>, QuizError> {
  let parsed: ApiResponse = serde_json::from_str(body)
    .map_err(|e| QuizError::MalformedResponse(e.to_string()))?;

  if parsed.response_code != 0 {
    return Err(QuizError::Upstream { code: parsed.response_code });
  }

  Ok(parsed.results.into_iter().map(|q| Question {
    prompt: decode_entities(&q.question),
    correct_answer: decode_entities(&q.correct_answer),
    incorrect_answers: q.incorrect_answers.iter().map(|a| decode_entities(a)).collect(),
    category: decode_entities(&q.category),
    difficulty: q.difficulty,
  }).collect())
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{extract::Query, routing::get, Router};
  use std::collections::HashMap;
  use tokio::net::TcpListener;

  const SAMPLE: &str = r#"{
    "response_code": 0,
    "results": [
      {
        "type": "multiple",
        "difficulty": "easy",
        "category": "Entertainment: Video Games",
        "question": "Which company created &quot;Pok&eacute;mon&quot;?",
        "correct_answer": "Game Freak",
        "incorrect_answers": ["Nintendo", "Capcom", "Konami&#039;s"]
      }
    ]
  }"#;

  #[test]
  fn parse_payload_decodes_every_string() {
    let qs = parse_payload(SAMPLE).unwrap();
    assert_eq!(qs.len(), 1);
    assert_eq!(qs[0].prompt, "Which company created \"Pokémon\"?");
    assert_eq!(qs[0].correct_answer, "Game Freak");
    assert_eq!(qs[0].incorrect_answers, vec!["Nintendo", "Capcom", "Konami's"]);
    assert_eq!(qs[0].category, "Entertainment: Video Games");
    assert_eq!(qs[0].difficulty, "easy");
  }

  #[test]
  fn missing_fields_are_malformed() {
    let body = r#"{"response_code":0,"results":[{"question":"q","incorrect_answers":[]}]}"#;
    assert!(matches!(parse_payload(body), Err(QuizError::MalformedResponse(_))));
    assert!(matches!(parse_payload("<html>busy</html>"), Err(QuizError::MalformedResponse(_))));
    assert!(matches!(parse_payload(r#"{"results":[]}"#), Err(QuizError::MalformedResponse(_))));
  }

  #[test]
  fn nonzero_response_code_is_upstream_error() {
    let body = r#"{"response_code":5,"results":[]}"#;
    assert_eq!(parse_payload(body), Err(QuizError::Upstream { code: 5 }));
  }

  #[test]
  fn query_includes_optional_filters() {
    let mut cfg = ApiConfig::default();
    let plain = OpenTdb::from_config(&cfg).unwrap();
    assert_eq!(plain.query(10), vec![("amount", "10".to_string()), ("type", "multiple".to_string())]);

    cfg.category = Some(9);
    cfg.difficulty = Some("hard".into());
    let filtered = OpenTdb::from_config(&cfg).unwrap();
    let q = filtered.query(3);
    assert!(q.contains(&("category", "9".to_string())));
    assert!(q.contains(&("difficulty", "hard".to_string())));
  }

  async fn spawn_stub(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{}/api.php", addr)
  }

  fn client_for(base_url: String) -> OpenTdb {
    let cfg = ApiConfig { base_url, timeout_secs: 5, ..ApiConfig::default() };
    OpenTdb::from_config(&cfg).unwrap()
  }

  #[tokio::test]
  async fn fetches_from_stub_server_with_query_parameters() {
    let app = Router::new().route(
      "/api.php",
      get(|Query(q): Query<HashMap<String, String>>| async move {
        assert_eq!(q.get("amount").map(String::as_str), Some("1"));
        assert_eq!(q.get("type").map(String::as_str), Some("multiple"));
        SAMPLE
      }),
    );
    let tdb = client_for(spawn_stub(app).await);

    let qs = tdb.fetch_round(1).await.unwrap();
    assert_eq!(qs.len(), 1);
    assert_eq!(qs[0].correct_answer, "Game Freak");
  }

  #[tokio::test]
  async fn error_status_is_network_error() {
    let app = Router::new().route(
      "/api.php",
      get(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let tdb = client_for(spawn_stub(app).await);

    match tdb.fetch_round(10).await {
      Err(QuizError::Network(msg)) => assert!(msg.contains("503")),
      other => panic!("expected network error, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn unreachable_host_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let tdb = client_for(format!("http://{}/api.php", addr));
    assert!(matches!(tdb.fetch_round(10).await, Err(QuizError::Network(_))));
  }
}
