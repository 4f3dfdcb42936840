//! Client side of the skills interview: talks to the evaluator, drives the
//! question/answer session and renders the final report.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod question_bank;
pub mod report;
pub mod session;

pub use config::{load_settings_from, ClientSettings, CredentialsMode};
pub use error::ClientError;
pub use evaluator::{Evaluator, HttpEvaluator, RequestGuard};
pub use question_bank::QuestionBank;
pub use report::{ReportRenderer, ReportRow, ReportState, ReportView};
pub use session::{SessionController, SessionEvent, SessionPhase, SessionSnapshot, SubmitOutcome};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
