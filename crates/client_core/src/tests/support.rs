//! Scripted evaluator double shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use shared::{
    domain::SessionId,
    protocol::{
        AnswerRequest, AnswerResponse, Evaluation, Report, ReportEvaluation,
        StartInterviewResponse,
    },
};
use tokio::sync::Notify;

use crate::{error::ClientError, evaluator::Evaluator};

type Scripted<T> = Mutex<VecDeque<Result<T, ClientError>>>;

#[derive(Default)]
pub struct ScriptedEvaluator {
    starts: Scripted<StartInterviewResponse>,
    answers: Scripted<AnswerResponse>,
    reports: Scripted<Option<Report>>,
    answer_gate: Option<Arc<Notify>>,
    start_gate: Option<Arc<Notify>>,
    report_gate: Option<Arc<Notify>>,
    pub start_calls: AtomicUsize,
    pub answer_calls: AtomicUsize,
    pub report_calls: AtomicUsize,
    pub answer_requests: Mutex<Vec<AnswerRequest>>,
    pub report_requests: Mutex<Vec<SessionId>>,
}

impl ScriptedEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_ok(self, session_id: &str, question: &str) -> Self {
        self.push_start(Ok(StartInterviewResponse {
            session_id: SessionId::new(session_id),
            question: question.to_string(),
        }))
    }

    pub fn push_start(self, result: Result<StartInterviewResponse, ClientError>) -> Self {
        self.starts.lock().expect("starts").push_back(result);
        self
    }

    pub fn answer_next(self, score: f64, feedback: &str, next_question: &str) -> Self {
        self.push_answer(Ok(AnswerResponse {
            evaluation: evaluation(score, feedback, &[]),
            done: false,
            next_question: Some(next_question.to_string()),
        }))
    }

    pub fn answer_done(self, score: f64, feedback: &str, concepts: &[&str]) -> Self {
        self.push_answer(Ok(AnswerResponse {
            evaluation: evaluation(score, feedback, concepts),
            done: true,
            next_question: None,
        }))
    }

    pub fn push_answer(self, result: Result<AnswerResponse, ClientError>) -> Self {
        self.answers.lock().expect("answers").push_back(result);
        self
    }

    pub fn push_report(self, result: Result<Option<Report>, ClientError>) -> Self {
        self.reports.lock().expect("reports").push_back(result);
        self
    }

    /// Every answer request waits for one `notify_one` on `gate`.
    pub fn gate_answers(mut self, gate: Arc<Notify>) -> Self {
        self.answer_gate = Some(gate);
        self
    }

    pub fn gate_starts(mut self, gate: Arc<Notify>) -> Self {
        self.start_gate = Some(gate);
        self
    }

    pub fn gate_reports(mut self, gate: Arc<Notify>) -> Self {
        self.report_gate = Some(gate);
        self
    }

    pub fn answer_call_count(&self) -> usize {
        self.answer_calls.load(Ordering::SeqCst)
    }

    pub fn start_call_count(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn report_call_count(&self) -> usize {
        self.report_calls.load(Ordering::SeqCst)
    }
}

pub fn evaluation(score: f64, feedback: &str, concepts: &[&str]) -> Evaluation {
    Evaluation {
        score,
        feedback: feedback.to_string(),
        related_concepts: concepts.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn report(answers: &[&str], evaluations: &[(f64, &str)]) -> Report {
    Report {
        final_score: None,
        answers: answers.iter().map(|a| a.to_string()).collect(),
        evaluations: evaluations
            .iter()
            .map(|(score, feedback)| ReportEvaluation {
                score: *score,
                feedback: feedback.to_string(),
            })
            .collect(),
        overall_feedback: None,
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    async fn start_session(&self) -> Result<StartInterviewResponse, ClientError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.start_gate {
            gate.notified().await;
        }
        self.starts
            .lock()
            .expect("starts")
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport("no scripted start".into())))
    }

    async fn submit_answer(&self, request: &AnswerRequest) -> Result<AnswerResponse, ClientError> {
        self.answer_calls.fetch_add(1, Ordering::SeqCst);
        self.answer_requests
            .lock()
            .expect("answer requests")
            .push(request.clone());
        if let Some(gate) = &self.answer_gate {
            gate.notified().await;
        }
        self.answers
            .lock()
            .expect("answers")
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport("no scripted answer".into())))
    }

    async fn fetch_report(&self, session_id: &SessionId) -> Result<Option<Report>, ClientError> {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        self.report_requests
            .lock()
            .expect("report requests")
            .push(session_id.clone());
        if let Some(gate) = &self.report_gate {
            gate.notified().await;
        }
        self.reports
            .lock()
            .expect("reports")
            .pop_front()
            .unwrap_or(Ok(None))
    }
}
