use serde::{Deserialize, Serialize};

use crate::{
    domain::SessionId,
    score::{deserialize_optional_score, deserialize_score},
};

pub fn start_interview_route() -> &'static str {
    "/start-interview"
}

pub fn answer_route() -> &'static str {
    "/answer"
}

/// Prefix of `GET /summary/{session_id}`; the id is the single path segment after it.
pub fn summary_route_prefix() -> &'static str {
    "/summary"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartInterviewResponse {
    pub session_id: SessionId,
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub session_id: SessionId,
    pub answer: String,
}

/// Per-answer evaluation as returned by `POST /answer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(default, deserialize_with = "deserialize_score")]
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub related_concepts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub evaluation: Evaluation,
    /// Omitted by the evaluator on every turn but the last.
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_question: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEvaluation {
    #[serde(default, deserialize_with = "deserialize_score")]
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
}

/// Body of `GET /summary/{session_id}`.
///
/// `evaluations[i]` describes `answers[i]`. A short `evaluations` list is
/// tolerated; renderers fill the gap with placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(
        default,
        deserialize_with = "deserialize_optional_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub final_score: Option<f64>,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(default)]
    pub evaluations: Vec<ReportEvaluation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_feedback: Option<String>,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
