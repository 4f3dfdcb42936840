//! Interview session state machine.
//!
//! ```text
//! NotStarted --start--> AwaitingAnswer --submit--> Submitting --+--> AwaitingAnswer
//!                                                               +--> Completed
//! ```
//!
//! At most one evaluator request is in flight per controller. Every path out
//! of a request (success, failure, timeout, cancellation, or the caller
//! dropping the future) clears `pending` and leaves the session in a state
//! from which the user can act again.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::Utc;
use shared::{
    domain::{AnsweredTurn, SessionId},
    protocol::AnswerRequest,
    score::clamp_score,
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    error::ClientError,
    evaluator::{Evaluator, RequestGuard},
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    AwaitingAnswer,
    Submitting,
    Completed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotStarted => "not started",
            Self::AwaitingAnswer => "awaiting an answer",
            Self::Submitting => "submitting an answer",
            Self::Completed => "completed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started {
        session_id: SessionId,
        question: String,
    },
    TurnRecorded {
        session_id: SessionId,
        turn: AnsweredTurn,
    },
    /// Published once, when the evaluator reports the interview is done.
    /// Hosts switch to the report view for `session_id` on this event.
    Completed { session_id: SessionId },
    RequestFailed {
        operation: &'static str,
        message: String,
    },
}

/// Outcome of a successful submit.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    NextQuestion {
        turn: AnsweredTurn,
        question: String,
    },
    Completed {
        turn: AnsweredTurn,
        session_id: SessionId,
    },
}

impl SubmitOutcome {
    pub fn turn(&self) -> &AnsweredTurn {
        match self {
            Self::NextQuestion { turn, .. } | Self::Completed { turn, .. } => turn,
        }
    }
}

/// Read-only copy of the controller state for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub session_id: Option<SessionId>,
    pub current_question: Option<String>,
    pub history: Vec<AnsweredTurn>,
    pub pending: bool,
    pub draft: String,
}

struct SessionState {
    phase: SessionPhase,
    session_id: Option<SessionId>,
    current_question: Option<String>,
    history: Vec<AnsweredTurn>,
    pending: bool,
    draft: String,
    inflight: Option<CancellationToken>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: SessionPhase::NotStarted,
            session_id: None,
            current_question: None,
            history: Vec::new(),
            pending: false,
            draft: String::new(),
            inflight: None,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            session_id: self.session_id.clone(),
            current_question: self.current_question.clone(),
            history: self.history.clone(),
            pending: self.pending,
            draft: self.draft.clone(),
        }
    }
}

/// Tracks one outstanding evaluator request. Dropping it while still armed
/// (the caller abandoned the future) restores the pre-request state.
struct InflightRequest<'a> {
    state: &'a Mutex<SessionState>,
    revert_to: SessionPhase,
    armed: bool,
}

impl<'a> InflightRequest<'a> {
    fn finish(mut self) -> MutexGuard<'a, SessionState> {
        self.armed = false;
        let mut state = lock_state(self.state);
        state.pending = false;
        state.inflight = None;
        state
    }
}

impl Drop for InflightRequest<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock_state(self.state);
        state.pending = false;
        state.inflight = None;
        state.phase = self.revert_to;
        warn!(phase = %self.revert_to, "evaluator request abandoned before completion");
    }
}

fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SessionController {
    evaluator: Arc<dyn Evaluator>,
    request_timeout: Duration,
    inner: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(evaluator: Arc<dyn Evaluator>, request_timeout: Duration) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            evaluator,
            request_timeout,
            inner: Mutex::new(SessionState::new()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state().snapshot()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state().phase
    }

    pub fn is_pending(&self) -> bool {
        self.state().pending
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.state().session_id.clone()
    }

    pub fn current_question(&self) -> Option<String> {
        self.state().current_question.clone()
    }

    pub fn history(&self) -> Vec<AnsweredTurn> {
        self.state().history.clone()
    }

    pub fn draft(&self) -> String {
        self.state().draft.clone()
    }

    /// Replaces the input buffer. Ignored once the session is completed.
    pub fn set_draft(&self, text: impl Into<String>) {
        let mut state = self.state();
        if state.phase != SessionPhase::Completed {
            state.draft = text.into();
        }
    }

    /// Cancels the outstanding request, if any. The pending call returns
    /// [`ClientError::Cancelled`] and the session reverts as on a failure.
    pub fn cancel(&self) -> bool {
        match &self.state().inflight {
            Some(token) => {
                info!("cancelling in-flight evaluator request");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Requests a new session and returns its first question.
    pub async fn start(&self) -> Result<String, ClientError> {
        let (inflight, guard) = {
            let mut state = self.state();
            if state.pending {
                return Err(ClientError::Busy);
            }
            if state.phase != SessionPhase::NotStarted {
                return Err(ClientError::InvalidState {
                    operation: "start",
                    phase: state.phase,
                });
            }
            let guard = self.begin_request(&mut state);
            let inflight = InflightRequest {
                state: &self.inner,
                revert_to: SessionPhase::NotStarted,
                armed: true,
            };
            (inflight, guard)
        };

        info!("starting interview session");
        let result = guard.run(self.evaluator.start_session()).await;

        let mut state = inflight.finish();
        let started = result.and_then(|response| {
            if response.session_id.is_blank() {
                return Err(ClientError::Transport(
                    "evaluator returned an empty session id".to_string(),
                ));
            }
            Ok(response)
        });

        match started {
            Ok(response) => {
                if response.question.trim().is_empty() {
                    warn!(session_id = %response.session_id, "evaluator returned an empty first question");
                }
                state.session_id = Some(response.session_id.clone());
                state.current_question = Some(response.question.clone());
                state.phase = SessionPhase::AwaitingAnswer;
                drop(state);

                info!(session_id = %response.session_id, "interview session started");
                self.publish(SessionEvent::Started {
                    session_id: response.session_id,
                    question: response.question.clone(),
                });
                Ok(response.question)
            }
            Err(err) => {
                state.phase = SessionPhase::NotStarted;
                drop(state);
                self.report_failure("start", &err);
                Err(err)
            }
        }
    }

    /// Submits the current draft buffer.
    pub async fn submit_draft(&self) -> Result<SubmitOutcome, ClientError> {
        let draft = self.draft();
        self.submit(draft).await
    }

    /// Submits `answer_text` for the current question.
    ///
    /// The question is captured before the request goes out, so the recorded
    /// turn always pairs the answer with the question it was given for. The
    /// draft buffer holds the text until the evaluator accepts it.
    pub async fn submit(&self, answer_text: impl Into<String>) -> Result<SubmitOutcome, ClientError> {
        let answer = answer_text.into();
        let (inflight, guard, request, question, turn_number) = {
            let mut state = self.state();
            if state.pending {
                return Err(ClientError::Busy);
            }
            let session_id = match (state.phase, state.session_id.clone()) {
                (SessionPhase::AwaitingAnswer, Some(session_id)) => session_id,
                (phase, _) => {
                    return Err(ClientError::InvalidState {
                        operation: "submit an answer",
                        phase,
                    })
                }
            };
            if answer.trim().is_empty() {
                return Err(ClientError::Validation(
                    "please enter an answer before submitting".to_string(),
                ));
            }

            state.draft = answer.clone();
            state.phase = SessionPhase::Submitting;
            let guard = self.begin_request(&mut state);
            let question = state.current_question.clone().unwrap_or_default();
            let inflight = InflightRequest {
                state: &self.inner,
                revert_to: SessionPhase::AwaitingAnswer,
                armed: true,
            };
            let request = AnswerRequest { session_id, answer };
            let turn_number = state.history.len() + 1;
            (inflight, guard, request, question, turn_number)
        };

        info!(session_id = %request.session_id, turn = turn_number, "submitting answer");
        let result = guard.run(self.evaluator.submit_answer(&request)).await;

        let mut state = inflight.finish();
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                state.phase = SessionPhase::AwaitingAnswer;
                drop(state);
                self.report_failure("submit", &err);
                return Err(err);
            }
        };

        let AnswerRequest { session_id, answer } = request;
        let evaluation = response.evaluation;
        let turn = AnsweredTurn {
            question,
            answer,
            score: clamp_score(evaluation.score),
            feedback: evaluation.feedback,
            related_concepts: evaluation.related_concepts,
            submitted_at: Utc::now(),
        };
        state.history.push(turn.clone());
        state.draft.clear();

        if response.done {
            state.phase = SessionPhase::Completed;
            state.current_question = None;
            let turns = state.history.len();
            drop(state);

            info!(%session_id, turns, "interview completed");
            self.publish(SessionEvent::TurnRecorded {
                session_id: session_id.clone(),
                turn: turn.clone(),
            });
            self.publish(SessionEvent::Completed {
                session_id: session_id.clone(),
            });
            return Ok(SubmitOutcome::Completed { turn, session_id });
        }

        let next_question = match response.next_question {
            Some(question) if !question.trim().is_empty() => question,
            other => {
                warn!(%session_id, "evaluator omitted the next question on an unfinished session");
                other.unwrap_or_default()
            }
        };
        state.current_question = Some(next_question.clone());
        state.phase = SessionPhase::AwaitingAnswer;
        drop(state);

        self.publish(SessionEvent::TurnRecorded {
            session_id,
            turn: turn.clone(),
        });
        Ok(SubmitOutcome::NextQuestion {
            turn,
            question: next_question,
        })
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.inner)
    }

    fn begin_request(&self, state: &mut SessionState) -> RequestGuard {
        let token = CancellationToken::new();
        state.pending = true;
        state.inflight = Some(token.clone());
        RequestGuard::new(token, self.request_timeout)
    }

    fn report_failure(&self, operation: &'static str, err: &ClientError) {
        warn!(operation, error = %err, "evaluator request failed");
        self.publish(SessionEvent::RequestFailed {
            operation,
            message: err.to_string(),
        });
    }

    fn publish(&self, event: SessionEvent) {
        // Fails only when nobody is subscribed.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
