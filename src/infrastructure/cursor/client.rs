//! HTTP client for the Cursor background-agent API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use std::time::Duration;

use super::error::CursorApiError;
use super::types::{
    AgentPrompt, AgentResponse, AgentSource, AgentTarget, LaunchAgentRequest,
};
use crate::domain::errors::DomainResult;
use crate::domain::models::{AgentReport, AgentRunStatus, CursorConfig, RetryConfig};
use crate::domain::ports::{AgentLaunch, CursorAgent, LaunchRequest};
use crate::infrastructure::http::RetryPolicy;

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// HTTP implementation of the coding-agent port.
///
/// Status and cancel calls are retried under the configured backoff policy.
/// Launch is never retried: the endpoint is not idempotent and a retried
/// request could start a second run.
///
/// The API key is checked per request, not at construction, so a deck that
/// never dispatches works without one.
pub struct HttpCursorAgent {
    http_client: ReqwestClient,
    base_url: String,
    api_key: Option<String>,
    retry_policy: RetryPolicy,
}

impl HttpCursorAgent {
    pub fn new(config: &CursorConfig, retry: &RetryConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            retry_policy: RetryPolicy::from(retry),
        })
    }

    fn bearer(&self) -> Result<&str, CursorApiError> {
        self.api_key.as_deref().ok_or(CursorApiError::InvalidApiKey)
    }

    async fn post_launch(
        &self,
        body: &LaunchAgentRequest,
    ) -> Result<AgentResponse, CursorApiError> {
        let response = self
            .http_client
            .post(format!("{}/v0/agents", self.base_url))
            .bearer_auth(self.bearer()?)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        Err(classify_status(status, text))
    }

    async fn get_agent(&self, agent_id: &str) -> Result<AgentResponse, CursorApiError> {
        let response = self
            .http_client
            .get(format!("{}/v0/agents/{agent_id}", self.base_url))
            .bearer_auth(self.bearer()?)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(CursorApiError::AgentNotFound(agent_id.to_string()));
        }

        let text = response.text().await.unwrap_or_default();
        Err(classify_status(status, text))
    }

    async fn post_cancel(&self, agent_id: &str) -> Result<(), CursorApiError> {
        let response = self
            .http_client
            .post(format!("{}/v0/agents/{agent_id}/cancel", self.base_url))
            .bearer_auth(self.bearer()?)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::NOT_FOUND {
            return Err(CursorApiError::AgentNotFound(agent_id.to_string()));
        }

        let text = response.text().await.unwrap_or_default();
        Err(classify_status(status, text))
    }
}

#[async_trait]
impl CursorAgent for HttpCursorAgent {
    async fn launch(&self, request: LaunchRequest) -> DomainResult<AgentLaunch> {
        let body = LaunchAgentRequest {
            prompt: AgentPrompt {
                text: request.instructions,
            },
            source: AgentSource {
                repository: request.repository,
                git_ref: request.base_branch,
            },
            model: Some(request.model),
            target: AgentTarget {
                auto_create_pr: request.auto_create_pr,
                branch_name: None,
            },
        };

        let response = self.post_launch(&body).await?;
        let status = parse_run_status(&response.status)?;

        Ok(AgentLaunch {
            agent_id: response.id,
            status,
            branch_name: response.target.and_then(|t| t.branch_name),
        })
    }

    async fn status(&self, agent_id: &str) -> DomainResult<AgentReport> {
        let response = self
            .retry_policy
            .execute(|| self.get_agent(agent_id))
            .await?;
        Ok(into_report(response)?)
    }

    async fn cancel(&self, agent_id: &str) -> DomainResult<()> {
        self.retry_policy
            .execute(|| self.post_cancel(agent_id))
            .await?;
        Ok(())
    }
}

fn classify_status(status: StatusCode, body: String) -> CursorApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CursorApiError::InvalidApiKey,
        StatusCode::TOO_MANY_REQUESTS => CursorApiError::RateLimitExceeded,
        StatusCode::BAD_REQUEST => CursorApiError::InvalidRequest(body),
        s if s.is_server_error() => CursorApiError::ServerError(status, body),
        _ => CursorApiError::UnknownError(status, body),
    }
}

fn parse_run_status(raw: &str) -> Result<AgentRunStatus, CursorApiError> {
    raw.parse().map_err(|_| {
        CursorApiError::MalformedResponse(format!("unrecognized run status: {raw}"))
    })
}

fn into_report(response: AgentResponse) -> Result<AgentReport, CursorApiError> {
    let status = parse_run_status(&response.status)?;
    let (branch_name, pr_url) = match response.target {
        Some(target) => (target.branch_name, target.pr_url),
        None => (None, None),
    };
    let pr_number = pr_url.as_deref().and_then(parse_pr_number);

    Ok(AgentReport {
        cursor_agent_id: response.id,
        status,
        branch_name,
        pr_url,
        pr_number,
        summary: response.summary,
    })
}

/// Extract the pull request number from a GitHub-style PR URL.
fn parse_pr_number(url: &str) -> Option<i64> {
    let (_, rest) = url.split_once("/pull/")?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
