use std::{fmt, sync::Arc, time::Duration};

use shared::{
    domain::{ScoreBand, SessionId},
    protocol::Report,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    error::ClientError,
    evaluator::{Evaluator, RequestGuard},
    question_bank::QuestionBank,
    session::SessionController,
};

pub const SCORE_UNAVAILABLE: &str = "N/A";
pub const FEEDBACK_UNAVAILABLE: &str = "No evaluation available";
pub const QUESTION_UNAVAILABLE: &str = "Question text unavailable";

#[derive(Debug, Clone, PartialEq)]
pub enum ReportState {
    Idle,
    Loading,
    Loaded(Report),
    /// No report for the session, or fetching it failed.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// 1-based position in the interview.
    pub number: usize,
    pub question: String,
    pub answer: String,
    /// `None` when the evaluator returned no evaluation for this answer.
    pub score: Option<f64>,
    pub feedback: String,
}

impl ReportRow {
    pub fn band(&self) -> Option<ScoreBand> {
        self.score.map(ScoreBand::for_score)
    }

    pub fn score_label(&self) -> String {
        match self.score {
            Some(score) => format!("{score}/100"),
            None => SCORE_UNAVAILABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub final_score: Option<f64>,
    pub rows: Vec<ReportRow>,
    pub overall_feedback: Option<String>,
}

impl ReportView {
    /// Pairs answer `i` with evaluation `i` and question-bank entry `i`.
    /// Gaps in either are filled with placeholders instead of failing.
    pub fn build(report: &Report, questions: &QuestionBank) -> Self {
        if report.evaluations.len() < report.answers.len() {
            warn!(
                answers = report.answers.len(),
                evaluations = report.evaluations.len(),
                "report has fewer evaluations than answers"
            );
        }
        if report.answers.len() > questions.len() {
            warn!(
                answers = report.answers.len(),
                questions = questions.len(),
                "report has more answers than the question bank"
            );
        }

        let rows = report
            .answers
            .iter()
            .enumerate()
            .map(|(index, answer)| {
                let evaluation = report.evaluations.get(index);
                ReportRow {
                    number: index + 1,
                    question: questions
                        .question(index)
                        .unwrap_or(QUESTION_UNAVAILABLE)
                        .to_string(),
                    answer: answer.clone(),
                    score: evaluation.map(|e| e.score),
                    feedback: evaluation
                        .map(|e| e.feedback.clone())
                        .unwrap_or_else(|| FEEDBACK_UNAVAILABLE.to_string()),
                }
            })
            .collect();

        Self {
            final_score: report.final_score,
            rows,
            overall_feedback: report
                .overall_feedback
                .clone()
                .filter(|text| !text.trim().is_empty()),
        }
    }

    pub fn final_band(&self) -> Option<ScoreBand> {
        self.final_score.map(ScoreBand::for_score)
    }
}

impl fmt::Display for ReportView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Skills Assessment Report")?;
        if let (Some(score), Some(band)) = (self.final_score, self.final_band()) {
            writeln!(f, "Final Score: {score}/100 ({band})")?;
        }
        for row in &self.rows {
            writeln!(f)?;
            writeln!(f, "Question {}: {}", row.number, row.question)?;
            writeln!(f, "  Your answer: {}", row.answer)?;
            match row.band() {
                Some(band) => writeln!(f, "  Score: {} ({band})", row.score_label())?,
                None => writeln!(f, "  Score: {}", row.score_label())?,
            }
            writeln!(f, "  Feedback: {}", row.feedback)?;
        }
        if let Some(feedback) = &self.overall_feedback {
            writeln!(f)?;
            writeln!(f, "Overall Feedback:")?;
            writeln!(f, "{feedback}")?;
        }
        Ok(())
    }
}

/// Fetches and presents the final report for a completed session.
pub struct ReportRenderer {
    evaluator: Arc<dyn Evaluator>,
    questions: Arc<QuestionBank>,
    request_timeout: Duration,
    guard: RequestGuard,
    session_id: Option<SessionId>,
    state: ReportState,
    settled: bool,
}

impl ReportRenderer {
    pub fn new(
        evaluator: Arc<dyn Evaluator>,
        questions: Arc<QuestionBank>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            evaluator,
            questions,
            request_timeout,
            guard: RequestGuard::new(CancellationToken::new(), request_timeout),
            session_id: None,
            state: ReportState::Idle,
            settled: false,
        }
    }

    pub fn state(&self) -> &ReportState {
        &self.state
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Token that aborts the running or next `load`. Take it before awaiting
    /// `load`, since `load` borrows the renderer mutably.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.guard.cancel_token().clone()
    }

    /// Loads the report for `session_id`. Repeated calls with the same id
    /// reuse the settled result; a different id triggers a new fetch. A
    /// cancelled load ends in `Empty` but is not settled, so calling `load`
    /// again fetches once more with a fresh token.
    pub async fn load(&mut self, session_id: &SessionId) -> &ReportState {
        if self.settled && self.session_id.as_ref() == Some(session_id) {
            return &self.state;
        }

        self.session_id = Some(session_id.clone());
        self.state = ReportState::Loading;
        self.settled = false;

        let result = self.guard.run(self.evaluator.fetch_report(session_id)).await;
        self.settled = true;
        self.state = match result {
            Ok(Some(report)) => {
                info!(%session_id, answers = report.answers.len(), "report loaded");
                ReportState::Loaded(report)
            }
            Ok(None) => {
                info!(%session_id, "no report available for session");
                ReportState::Empty
            }
            Err(ClientError::Cancelled) => {
                info!(%session_id, "report load cancelled");
                self.settled = false;
                self.guard = RequestGuard::new(CancellationToken::new(), self.request_timeout);
                ReportState::Empty
            }
            Err(err) => {
                warn!(%session_id, error = %err, "failed to fetch report");
                ReportState::Empty
            }
        };
        &self.state
    }

    /// The rendered report, if one is loaded.
    pub fn view(&self) -> Option<ReportView> {
        match &self.state {
            ReportState::Loaded(report) => Some(ReportView::build(report, &self.questions)),
            _ => None,
        }
    }

    /// Discards all report state and hands back a controller for a fresh
    /// interview against the same evaluator.
    pub fn restart(self) -> Arc<SessionController> {
        info!(session_id = ?self.session_id, "restarting interview");
        SessionController::new(self.evaluator, self.request_timeout)
    }
}

#[cfg(test)]
#[path = "tests/report_tests.rs"]
mod tests;
