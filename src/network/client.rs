//! HTTP client for the Perplexity chat completions API

use super::error::ApiError;
use super::models::{ChatRequest, ChatResponse};
use crate::config::ApiSettings;
use anyhow::Result;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

/// HTTP client wrapper bound to one endpoint and API key
#[derive(Clone)]
pub struct PerplexityClient {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl PerplexityClient {
    /// Create a new client from API settings
    pub fn with_settings(settings: &ApiSettings) -> Result<Self> {
        let timeout = settings.timeout()?;
        let client = Client::builder().timeout(timeout).gzip(true).build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            timeout,
        })
    }

    /// Endpoint requests are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Timeout applied to each call as a whole
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute one completion request.
    ///
    /// No retries are attempted. Dropping the returned future abandons the
    /// in-flight request.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        let start = Instant::now();
        debug!(
            "POST {} model={} content_len={}",
            self.endpoint,
            request.model,
            request.content().len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, format!("perplexity-rs/{}", crate::VERSION))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        debug!(
            "Perplexity responded {} in {:?} ({} bytes)",
            status,
            start.elapsed(),
            body.len()
        );

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}
