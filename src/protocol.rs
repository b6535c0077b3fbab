//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Choices go out as plain text; which one is correct never leaves the server.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::controller::Round;
use crate::logic::{Snapshot, SubmitReport};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartRound,
    CurrentRound,
    SubmitAnswers {
        username: String,
        #[serde(default)]
        round: Option<u64>,
        #[serde(default, deserialize_with = "answers_by_group")]
        answers: BTreeMap<usize, String>,
    },
    NewPlayer {
        #[serde(default)]
        username: Option<String>,
    },
    Scores,
}

/// Answer maps are keyed by question group as JSON strings (`"0"`, `"1"`, ...).
/// Inside the tagged client enum serde hands keys over as strings, so they are
/// parsed here.
fn answers_by_group<'de, D: Deserializer<'de>>(de: D) -> Result<BTreeMap<usize, String>, D::Error> {
    BTreeMap::<String, String>::deserialize(de)?
        .into_iter()
        .map(|(key, text)| match key.trim().parse::<usize>() {
            Ok(group) => Ok((group, text)),
            Err(_) => Err(D::Error::custom(format!("answer key {:?} is not a question number", key))),
        })
        .collect()
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Round(RoundStatusOut),
    Graded(SubmitOut),
    Scores { scores: Vec<ScoreRow> },
    Error { message: String },
}

/// DTO used by both WS and HTTP for round delivery.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RoundOut {
    pub round: u64,
    pub questions: Vec<QuestionOut>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct QuestionOut {
    pub group: usize,
    pub prompt: String,
    pub category: String,
    pub difficulty: String,
    pub choices: Vec<String>,
}

/// Convert a rendered round (internal) to the public DTO.
pub fn to_out(r: &Round) -> RoundOut {
    RoundOut {
        round: r.seq,
        questions: r
            .model
            .groups
            .iter()
            .map(|g| QuestionOut {
                group: g.group_id,
                prompt: g.prompt.clone(),
                category: g.category.clone(),
                difficulty: g.difficulty.clone(),
                choices: g.choices.iter().map(|c| c.display_text.clone()).collect(),
            })
            .collect(),
    }
}

/// Where the round lifecycle stands, plus the round if one is on screen.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoundStatusOut {
    pub state: String,
    pub round: Option<RoundOut>,
    pub user: Option<String>,
    pub error: Option<String>,
}

impl From<&Snapshot> for RoundStatusOut {
    fn from(s: &Snapshot) -> Self {
        Self {
            state: s.state.to_string(),
            round: s.round.as_ref().map(to_out),
            user: s.user.clone(),
            error: s.error.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreRow {
    pub user: String,
    pub scores: Vec<u32>,
}

pub fn to_rows(scores: Vec<(String, Vec<u32>)>) -> Vec<ScoreRow> {
    scores.into_iter().map(|(user, scores)| ScoreRow { user, scores }).collect()
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
    pub username: String,
    #[serde(default)]
    pub round: Option<u64>,
    #[serde(default, deserialize_with = "answers_by_group")]
    pub answers: BTreeMap<usize, String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitOut {
    pub user: String,
    pub score: u32,
    pub out_of: u32,
    pub round: u64,
    pub next_round: Option<RoundOut>,
    pub next_error: Option<String>,
}

impl From<&SubmitReport> for SubmitOut {
    fn from(r: &SubmitReport) -> Self {
        Self {
            user: r.graded.user.clone(),
            score: r.graded.score,
            out_of: r.graded.out_of,
            round: r.graded.round_seq,
            next_round: r.next_round.as_ref().map(to_out),
            next_error: r.next_error.as_ref().map(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NewPlayerIn {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoresOut {
    pub scores: Vec<ScoreRow>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOut {
    pub message: String,
}
