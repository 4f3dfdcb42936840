//! In-process reference evaluator.
//!
//! Serves the three interview endpoints over a fixed question bank with
//! sessions held in memory. Used by the client's integration tests and for
//! running the CLI without a real grading backend.

use std::{collections::HashMap, fs, path::Path, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{Path as UrlPath, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::{QuestionRecord, SessionId},
    error::{ApiError, ErrorCode},
    protocol::{
        answer_route, start_interview_route, summary_route_prefix, AnswerRequest, AnswerResponse,
        Evaluation, Report, StartInterviewResponse,
    },
};
use tokio::sync::RwLock;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;
use uuid::Uuid;

pub mod config;
pub mod scoring;

const MAX_BODY_BYTES: usize = 64 * 1024;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Default)]
struct StubSession {
    next_index: usize,
    answers: Vec<String>,
    evaluations: Vec<Evaluation>,
}

pub struct AppState {
    questions: Vec<QuestionRecord>,
    sessions: RwLock<HashMap<SessionId, StubSession>>,
}

impl AppState {
    pub fn new(questions: Vec<QuestionRecord>) -> Arc<Self> {
        Arc::new(Self {
            questions,
            sessions: RwLock::new(HashMap::new()),
        })
    }
}

pub fn builtin_questions() -> anyhow::Result<Vec<QuestionRecord>> {
    serde_json::from_str(include_str!("../data/questions.json"))
        .context("built-in question bank is malformed")
}

pub fn load_questions(path: &Path) -> anyhow::Result<Vec<QuestionRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse question bank {}", path.display()))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(start_interview_route(), post(start_interview))
        .route(answer_route(), post(submit_answer))
        .route(
            &format!("{}/:session_id", summary_route_prefix()),
            get(summary),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn unknown_session(session_id: &SessionId) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::not_found(format!("unknown session {session_id}"))),
    )
}

fn rejected(message: &str) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError::validation(message)))
}

async fn start_interview(State(state): State<Arc<AppState>>) -> ApiResult<StartInterviewResponse> {
    let Some(first) = state.questions.first() else {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(ErrorCode::Internal, "question bank is empty")),
        ));
    };

    let session_id = SessionId::new(Uuid::new_v4().to_string());
    state
        .sessions
        .write()
        .await
        .insert(session_id.clone(), StubSession::default());
    info!(%session_id, "interview started");

    Ok(Json(StartInterviewResponse {
        session_id,
        question: first.question.clone(),
    }))
}

async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnswerRequest>,
) -> ApiResult<AnswerResponse> {
    if req.answer.trim().is_empty() {
        return Err(rejected("answer cannot be empty"));
    }

    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&req.session_id)
        .ok_or_else(|| unknown_session(&req.session_id))?;

    let Some(record) = state.questions.get(session.next_index) else {
        return Err(rejected("interview already completed"));
    };

    let evaluation = scoring::evaluate_answer(record, &req.answer);
    info!(
        session_id = %req.session_id,
        question = session.next_index + 1,
        score = evaluation.score,
        "answer evaluated"
    );

    session.answers.push(req.answer);
    session.evaluations.push(evaluation.clone());
    session.next_index += 1;

    let next_question = state
        .questions
        .get(session.next_index)
        .map(|next| next.question.clone());
    Ok(Json(AnswerResponse {
        evaluation,
        done: next_question.is_none(),
        next_question,
    }))
}

async fn summary(
    State(state): State<Arc<AppState>>,
    UrlPath(session_id): UrlPath<SessionId>,
) -> ApiResult<Report> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&session_id)
        .ok_or_else(|| unknown_session(&session_id))?;
    Ok(Json(scoring::summarize(&session.answers, &session.evaluations)))
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
