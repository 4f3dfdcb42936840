use std::{future::Future, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::SessionId,
    error::ApiError,
    protocol::{
        answer_route, start_interview_route, summary_route_prefix, AnswerRequest, AnswerResponse,
        Report, StartInterviewResponse,
    },
};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::{
    config::{ClientSettings, CredentialsMode},
    error::ClientError,
};

/// Remote service that issues sessions, scores answers and builds reports.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn start_session(&self) -> Result<StartInterviewResponse, ClientError>;
    async fn submit_answer(&self, request: &AnswerRequest) -> Result<AnswerResponse, ClientError>;
    /// `Ok(None)` means the evaluator has no report for this session.
    async fn fetch_report(&self, session_id: &SessionId) -> Result<Option<Report>, ClientError>;
}

/// Deadline and cancellation applied to a single evaluator call.
#[derive(Debug, Clone)]
pub struct RequestGuard {
    cancel: CancellationToken,
    timeout: Duration,
}

impl RequestGuard {
    pub fn new(cancel: CancellationToken, timeout: Duration) -> Self {
        Self { cancel, timeout }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub async fn run<T, F>(&self, call: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, call) => match outcome {
                Ok(result) => result,
                Err(_) => Err(ClientError::Timeout(self.timeout)),
            },
        }
    }
}

pub struct HttpEvaluator {
    http: Client,
    base_url: Url,
}

impl HttpEvaluator {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let mut builder = Client::builder().timeout(settings.request_timeout);
        if settings.credentials == CredentialsMode::Include {
            builder = builder.cookie_store(true);
        }
        let http = builder
            .build()
            .map_err(|err| ClientError::Config(format!("failed to build http client: {err}")))?;
        Ok(Self {
            http,
            base_url: settings.evaluator_url.clone(),
        })
    }

    fn endpoint(&self, route: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(route.trim_start_matches('/'))
            .map_err(|err| ClientError::Config(format!("invalid evaluator route '{route}': {err}")))
    }

    fn summary_endpoint(&self, session_id: &SessionId) -> Result<Url, ClientError> {
        let mut url = self.endpoint(&format!("{}/", summary_route_prefix()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Config("evaluator url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(session_id.as_str());
        Ok(url)
    }
}

#[async_trait]
impl Evaluator for HttpEvaluator {
    async fn start_session(&self) -> Result<StartInterviewResponse, ClientError> {
        let url = self.endpoint(start_interview_route())?;
        debug!(%url, "requesting new interview session");
        let res = self.http.post(url).send().await?;
        let res = ensure_success(res).await?;
        res.json()
            .await
            .map_err(|err| ClientError::malformed("start interview", err))
    }

    async fn submit_answer(&self, request: &AnswerRequest) -> Result<AnswerResponse, ClientError> {
        let url = self.endpoint(answer_route())?;
        debug!(%url, session_id = %request.session_id, "submitting answer");
        let res = self.http.post(url).json(request).send().await?;
        let res = ensure_success(res).await?;
        res.json()
            .await
            .map_err(|err| ClientError::malformed("answer", err))
    }

    async fn fetch_report(&self, session_id: &SessionId) -> Result<Option<Report>, ClientError> {
        let url = self.summary_endpoint(session_id)?;
        debug!(%url, "fetching interview report");
        let res = self.http.get(url).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let res = ensure_success(res).await?;
        let body = res.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice::<Option<Report>>(&body)
            .map_err(|err| ClientError::malformed("summary", err))
    }
}

async fn ensure_success(res: Response) -> Result<Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => format!("{:?}: {}", api_error.code, api_error.message),
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body,
    };
    Err(ClientError::Transport(format!("{status}: {detail}")))
}

#[cfg(test)]
#[path = "tests/evaluator_tests.rs"]
mod tests;
