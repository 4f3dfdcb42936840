use std::{collections::HashMap, fmt, fs, path::Path, str::FromStr, time::Duration};

use url::Url;

use crate::error::ClientError;

pub const DEFAULT_SETTINGS_FILE: &str = "interview.toml";
const DEFAULT_EVALUATOR_URL: &str = "http://127.0.0.1:8000/";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether cookies set by the evaluator are kept and replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialsMode {
    Omit,
    #[default]
    Include,
}

impl FromStr for CredentialsMode {
    type Err = ClientError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "omit" | "false" => Ok(Self::Omit),
            "include" | "true" => Ok(Self::Include),
            other => Err(ClientError::Config(format!(
                "unknown credentials mode '{other}' (expected 'omit' or 'include')"
            ))),
        }
    }
}

impl fmt::Display for CredentialsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Omit => f.write_str("omit"),
            Self::Include => f.write_str("include"),
        }
    }
}

/// Explicit evaluator configuration handed to every client component.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub evaluator_url: Url,
    pub credentials: CredentialsMode,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            evaluator_url: Url::parse(DEFAULT_EVALUATOR_URL).expect("default evaluator url"),
            credentials: CredentialsMode::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientSettings {
    pub fn with_evaluator_url(mut self, raw: &str) -> Result<Self, ClientError> {
        self.evaluator_url = parse_evaluator_url(raw)?;
        Ok(self)
    }
}

/// Defaults, then the optional settings file, then environment overrides.
pub fn load_settings_from(path: &Path) -> Result<ClientSettings, ClientError> {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(&raw).map_err(|err| {
            ClientError::Config(format!("failed to parse '{}': {err}", path.display()))
        })?;
        apply_file_settings(&mut settings, &file_cfg)?;
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file_settings(
    settings: &mut ClientSettings,
    file_cfg: &HashMap<String, toml::Value>,
) -> Result<(), ClientError> {
    if let Some(v) = file_cfg.get("evaluator_url").and_then(toml::Value::as_str) {
        settings.evaluator_url = parse_evaluator_url(v)?;
    }
    if let Some(v) = file_cfg.get("credentials").and_then(toml::Value::as_str) {
        settings.credentials = v.parse()?;
    }
    if let Some(v) = file_cfg.get("request_timeout_secs") {
        let secs = v
            .as_integer()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| ClientError::Config(format!("invalid request_timeout_secs: {v}")))?;
        settings.request_timeout = Duration::from_secs(secs as u64);
    }
    Ok(())
}

pub(crate) fn apply_env_overrides(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ClientError> {
    if let Some(v) = lookup("INTERVIEW_EVALUATOR_URL") {
        settings.evaluator_url = parse_evaluator_url(&v)?;
    }
    if let Some(v) = lookup("APP__EVALUATOR_URL") {
        settings.evaluator_url = parse_evaluator_url(&v)?;
    }

    if let Some(v) = lookup("APP__CREDENTIALS") {
        settings.credentials = v.parse()?;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout = parse_timeout_secs(&v)?;
    }

    Ok(())
}

pub fn parse_timeout_secs(raw: &str) -> Result<Duration, ClientError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ClientError::Config(format!(
            "request timeout must be a positive number of seconds, got '{raw}'"
        ))),
    }
}

/// Parses the evaluator base address. The path always ends in `/` so that
/// endpoint routes join underneath it instead of replacing its last segment.
pub fn parse_evaluator_url(raw: &str) -> Result<Url, ClientError> {
    let raw = raw.trim();
    let mut url = Url::parse(raw)
        .map_err(|err| ClientError::Config(format!("invalid evaluator url '{raw}': {err}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::Config(format!(
            "evaluator url '{raw}' must use http or https"
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
