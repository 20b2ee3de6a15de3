//! HTTP client for the prompt transformation service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use std::time::Duration;

use super::error::TransformApiError;
use super::types::{TransformApiRequest, TransformApiResponse};
use crate::domain::errors::DomainResult;
use crate::domain::models::{RetryConfig, TransformConfig};
use crate::domain::ports::{PromptTransformer, TransformRequest};
use crate::infrastructure::http::RetryPolicy;

/// Minimum input length the service accepts.
const MIN_IDEA_CHARS: usize = 3;

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// HTTP implementation of the transformation port.
///
/// Retries transient failures under the configured backoff policy. The
/// caller owns the overall deadline, so a slow endpoint is eventually cut
/// off by the orchestrator even while a retry sleeps here.
pub struct HttpTransformer {
    http_client: ReqwestClient,
    base_url: String,
    api_key: Option<String>,
    provider: String,
    model: String,
    retry_policy: RetryPolicy,
}

impl HttpTransformer {
    pub fn new(config: &TransformConfig, retry: &RetryConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            provider: config.provider.clone(),
            model: config.model.clone(),
            retry_policy: RetryPolicy::from(retry),
        })
    }

    async fn send_request(
        &self,
        request: &TransformApiRequest,
    ) -> Result<TransformApiResponse, TransformApiError> {
        let mut builder = self
            .http_client
            .post(format!("{}/transform-prompt", self.base_url))
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED => TransformApiError::InvalidApiKey,
            StatusCode::NOT_FOUND => TransformApiError::NotFound,
            StatusCode::TOO_MANY_REQUESTS => TransformApiError::RateLimitExceeded,
            StatusCode::BAD_REQUEST => TransformApiError::InvalidRequest(body),
            s if s.is_server_error() => TransformApiError::ServerError(status, body),
            _ => TransformApiError::UnknownError(status, body),
        })
    }
}

#[async_trait]
impl PromptTransformer for HttpTransformer {
    async fn transform(&self, request: TransformRequest) -> DomainResult<String> {
        if request.text.trim().chars().count() < MIN_IDEA_CHARS {
            return Err(TransformApiError::InvalidRequest(
                "Please add more context to your idea for better generation.".to_string(),
            )
            .into());
        }

        let wire = TransformApiRequest {
            raw_idea: request.text,
            knowledge_context: request.knowledge_context,
            provider: self.provider.clone(),
            model: self.model.clone(),
        };

        let response = self
            .retry_policy
            .execute(|| self.send_request(&wire))
            .await?;

        if response.success == Some(false) {
            return Err(TransformApiError::ServiceError(
                response
                    .error
                    .unwrap_or_else(|| "unspecified failure".to_string()),
            )
            .into());
        }

        match response.transformed_prompt {
            Some(prompt) if !prompt.trim().is_empty() => Ok(prompt),
            _ => Err(TransformApiError::EmptyResult.into()),
        }
    }
}
