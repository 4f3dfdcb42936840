use std::{future::Future, io::Write, sync::Arc};

use anyhow::Result;
use client_core::{ClientError, ReportRenderer, SessionController, SessionEvent, SubmitOutcome};
use shared::domain::SessionId;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

const QUIT_COMMAND: &str = ":quit";
const NO_REPORT_MESSAGE: &str = "No report found for this session.";

/// Line-oriented input. Ctrl-C while waiting for a line counts as closing
/// the input.
pub struct Prompt<R> {
    lines: Lines<R>,
}

impl Prompt<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> Prompt<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// `None` once the input is closed or the user presses Ctrl-C.
    pub async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{prompt}");
        std::io::stdout().flush()?;
        match unless_interrupted(self.lines.next_line(), ctrl_c()).await {
            Some(line) => Ok(line?),
            None => {
                println!();
                Ok(None)
            }
        }
    }

    pub async fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let Some(line) = self.read_line(prompt).await? else {
            return Ok(false);
        };
        Ok(match line.trim().to_ascii_lowercase().as_str() {
            "" => default,
            "y" | "yes" => true,
            _ => false,
        })
    }
}

/// Resolves when Ctrl-C is pressed. Never resolves if the handler cannot be
/// installed.
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// `None` if `interrupt` resolves before `work`.
async fn unless_interrupted<T>(
    work: impl Future<Output = T>,
    interrupt: impl Future<Output = ()>,
) -> Option<T> {
    tokio::select! {
        result = work => Some(result),
        () = interrupt => None,
    }
}

/// Awaits `request`, cancelling it through the controller on Ctrl-C. The
/// request still runs to completion so the controller settles its state.
async fn interruptible<T>(
    controller: &SessionController,
    request: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    tokio::pin!(request);
    match unless_interrupted(&mut request, ctrl_c()).await {
        Some(result) => result,
        None => {
            controller.cancel();
            request.await
        }
    }
}

/// Drives one interview from start to finish. Returns the session id once
/// the evaluator reports completion, or `None` when the user quits.
pub async fn run_interview<R: AsyncBufRead + Unpin>(
    controller: &Arc<SessionController>,
    prompt: &mut Prompt<R>,
) -> Result<Option<SessionId>> {
    let mut events = controller.subscribe_events();

    loop {
        match interruptible(controller, controller.start()).await {
            Ok(question) => {
                println!("\nQuestion 1: {question}");
                break;
            }
            Err(err) if err.is_retryable() => {
                println!("Could not start the interview: {err}");
                if !prompt.confirm("Retry? [Y/n] ", true).await? {
                    return Ok(None);
                }
            }
            Err(err) => return Err(err.into()),
        }
    }

    loop {
        let Some(line) = prompt
            .read_line(&format!("Your answer ({QUIT_COMMAND} or Ctrl-C to quit): "))
            .await?
        else {
            return Ok(None);
        };
        if line.trim() == QUIT_COMMAND {
            return Ok(None);
        }

        let result = if line.trim().is_empty() && !controller.draft().trim().is_empty() {
            println!("Resending your previous answer.");
            interruptible(controller, controller.submit_draft()).await
        } else {
            interruptible(controller, controller.submit(line)).await
        };

        let mut completed = None;
        while let Ok(event) = events.try_recv() {
            match event {
                SessionEvent::TurnRecorded { turn, .. } => {
                    println!("Score: {}/100", turn.score);
                    println!("Feedback: {}", turn.feedback);
                    if !turn.related_concepts.is_empty() {
                        println!("Related concepts: {}", turn.related_concepts.join(", "));
                    }
                }
                SessionEvent::Completed { session_id } => completed = Some(session_id),
                SessionEvent::RequestFailed { operation, message } => {
                    debug!(operation, %message, "request failed");
                }
                SessionEvent::Started { .. } => {}
            }
        }

        match result {
            Ok(SubmitOutcome::NextQuestion { question, .. }) => {
                println!("\nQuestion {}: {question}", controller.history().len() + 1);
            }
            Ok(SubmitOutcome::Completed { .. }) => {}
            Err(err @ ClientError::Validation(_)) => println!("{err}"),
            Err(err) if err.is_retryable() => {
                println!("Submitting failed: {err}");
                println!("Press Enter to resend your answer, or type a new one.");
            }
            Err(err) => return Err(err.into()),
        }

        if let Some(session_id) = completed {
            println!("\nInterview complete.");
            return Ok(Some(session_id));
        }
    }
}

pub async fn show_report(renderer: &mut ReportRenderer, session_id: &SessionId) {
    println!("Loading your report...");
    let cancel = renderer.cancel_handle();
    {
        let load = renderer.load(session_id);
        tokio::pin!(load);
        if unless_interrupted(&mut load, ctrl_c()).await.is_none() {
            cancel.cancel();
            load.await;
        }
    }
    match renderer.view() {
        Some(view) => println!("\n{view}"),
        None => println!("{NO_REPORT_MESSAGE}"),
    }
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
