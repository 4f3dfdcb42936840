use std::net::SocketAddr;

use evaluator_stub::{
    build_router, builtin_questions, config::load_settings, load_questions, AppState,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";

/// `RUST_LOG` when set and valid, otherwise `info`.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();

    let settings = load_settings()?;
    let questions = match settings.questions_path.as_deref() {
        Some(path) => load_questions(path)?,
        None => builtin_questions()?,
    };
    info!(questions = questions.len(), "question bank loaded");

    let app = build_router(AppState::new(questions));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "evaluator listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filter_defaults_to_info() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(log_filter().to_string(), DEFAULT_LOG_FILTER);
        }
    }
}
