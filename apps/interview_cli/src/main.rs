use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{ensure, Result};
use clap::Parser;
use client_core::{
    config::DEFAULT_SETTINGS_FILE, load_settings_from, ClientSettings, CredentialsMode, Evaluator,
    HttpEvaluator, QuestionBank, ReportRenderer, SessionController,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod shell;

use shell::{run_interview, show_report, Prompt};

/// Terminal front end for a skills interview.
#[derive(Parser, Debug)]
struct Args {
    /// Overrides the evaluator URL from the settings file and environment.
    #[arg(long)]
    evaluator_url: Option<String>,
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    /// JSON question bank used to label rows in the final report.
    #[arg(long)]
    questions: Option<PathBuf>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// `omit` or `include`.
    #[arg(long)]
    credentials: Option<CredentialsMode>,
}

fn resolve_settings(args: &Args) -> Result<ClientSettings> {
    let mut settings = load_settings_from(&args.config)?;
    if let Some(url) = &args.evaluator_url {
        settings = settings.with_evaluator_url(url)?;
    }
    if let Some(secs) = args.timeout_secs {
        ensure!(secs > 0, "--timeout-secs must be greater than zero");
        settings.request_timeout = Duration::from_secs(secs);
    }
    if let Some(mode) = args.credentials {
        settings.credentials = mode;
    }
    Ok(settings)
}

fn load_question_bank(path: Option<&PathBuf>) -> Result<QuestionBank> {
    match path {
        Some(path) => Ok(QuestionBank::from_path(path)?),
        None => {
            warn!("no question bank given; report rows will not show question text");
            Ok(QuestionBank::default())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let settings = resolve_settings(&args)?;
    let questions = Arc::new(load_question_bank(args.questions.as_ref())?);
    info!(
        evaluator = %settings.evaluator_url,
        credentials = %settings.credentials,
        timeout = ?settings.request_timeout,
        "starting interview client"
    );

    let evaluator: Arc<dyn Evaluator> = Arc::new(HttpEvaluator::new(&settings)?);
    let mut prompt = Prompt::stdin();
    let mut controller = SessionController::new(evaluator.clone(), settings.request_timeout);

    loop {
        let Some(session_id) = run_interview(&controller, &mut prompt).await? else {
            println!("Goodbye.");
            return Ok(());
        };

        let mut renderer =
            ReportRenderer::new(evaluator.clone(), questions.clone(), settings.request_timeout);
        show_report(&mut renderer, &session_id).await;

        if !prompt.confirm("Start a new interview? [y/N] ", false).await? {
            return Ok(());
        }
        controller = renderer.restart();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_CONFIG: &str = "/nonexistent/interview.toml";

    #[test]
    fn flags_override_settings() {
        let args = Args::parse_from([
            "interview_cli",
            "--config",
            MISSING_CONFIG,
            "--evaluator-url",
            "http://evaluator.test:9000",
            "--timeout-secs",
            "5",
            "--credentials",
            "omit",
        ]);
        let settings = resolve_settings(&args).expect("settings");
        assert_eq!(settings.evaluator_url.as_str(), "http://evaluator.test:9000/");
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.credentials, CredentialsMode::Omit);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let args = Args::parse_from([
            "interview_cli",
            "--config",
            MISSING_CONFIG,
            "--timeout-secs",
            "0",
        ]);
        assert!(resolve_settings(&args).is_err());
    }

    #[test]
    fn unknown_credentials_mode_fails_to_parse() {
        let parsed = Args::try_parse_from(["interview_cli", "--credentials", "sometimes"]);
        assert!(parsed.is_err());
    }
}
