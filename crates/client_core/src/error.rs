use std::time::Duration;

use thiserror::Error;

use crate::session::SessionPhase;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("answer rejected: {0}")]
    Validation(String),
    #[error("evaluator request failed: {0}")]
    Transport(String),
    #[error("evaluator request timed out after {0:?}")]
    Timeout(Duration),
    #[error("evaluator request was cancelled")]
    Cancelled,
    #[error("another evaluator request is already in flight")]
    Busy,
    #[error("cannot {operation} while the session is {phase}")]
    InvalidState {
        operation: &'static str,
        phase: SessionPhase,
    },
    #[error("invalid client configuration: {0}")]
    Config(String),
    #[error("failed to load question bank: {0}")]
    QuestionBank(String),
}

impl ClientError {
    /// Whether repeating the same user action may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::Cancelled | Self::Busy
        )
    }

    pub(crate) fn malformed(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Transport(format!("malformed {context} response: {err}"))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
