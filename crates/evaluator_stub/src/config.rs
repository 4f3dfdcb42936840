use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_SETTINGS_FILE: &str = "evaluator.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct StubSettings {
    pub bind_addr: String,
    /// JSON question bank; the built-in Excel questions are used when unset.
    #[serde(default)]
    pub questions_path: Option<PathBuf>,
}

pub fn load_settings() -> anyhow::Result<StubSettings> {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE))
}

/// Defaults, then the optional toml file at `path`, then `APP__*` variables.
pub fn load_settings_from(path: &Path) -> anyhow::Result<StubSettings> {
    let settings = Config::builder()
        .set_default("bind_addr", DEFAULT_BIND_ADDR)?
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .with_context(|| format!("failed to read settings from {}", path.display()))?;

    settings
        .try_deserialize()
        .context("invalid evaluator settings")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
