//! The correction oracle: a model that rewrites text with fixed grammar.
//!
//! [`OllamaClient`] speaks the Ollama HTTP API:
//! - `GET {base}/api/tags` lists installed models
//! - `POST {base}/api/generate` with `stream: false` returns one completion

use serde::{Deserialize, Serialize};

use crate::config::{ConnectionConfig, RetryPolicy};
use crate::error::OracleError;
use crate::prompts::{SYSTEM_PROMPT, correction_prompt};

/// Something that can correct text and say which models it offers.
#[trait_variant::make(CorrectionOracle: Send)]
pub trait LocalCorrectionOracle {
    /// Corrected version of `text`, produced by `model`.
    async fn correct(&self, text: &str, model: &str) -> Result<String, OracleError>;

    /// Names of the models the oracle can use.
    async fn list_models(&self) -> Result<Vec<String>, OracleError>;
}

/// Outcome of a connection check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    /// Reachable and offering at least one model.
    pub connected: bool,
    pub models: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionStatus {
    pub fn from_models(models: Vec<String>) -> Self {
        Self {
            connected: !models.is_empty(),
            models,
            error: None,
        }
    }

    pub fn from_error(err: &OracleError) -> Self {
        Self {
            connected: false,
            models: Vec::new(),
            error: Some(err.user_message()),
        }
    }
}

/// Check the oracle by listing its models.
pub async fn check_connection<O: CorrectionOracle + Sync>(oracle: &O) -> ConnectionStatus {
    match oracle.list_models().await {
        Ok(models) => ConnectionStatus::from_models(models),
        Err(e) => ConnectionStatus::from_error(&e),
    }
}

/// List models until the oracle offers some or attempts run out, sleeping
/// `delay` between tries. Errors that retrying cannot fix end the loop early.
async fn list_with_retry<O: CorrectionOracle + Sync>(
    oracle: &O,
    retry: RetryPolicy,
) -> Result<Vec<String>, OracleError> {
    let attempts = retry.attempts();
    let mut last = Ok(Vec::new());
    for attempt in 1..=attempts {
        match oracle.list_models().await {
            Ok(models) if !models.is_empty() => {
                tracing::info!(attempt, models = models.len(), "connected to oracle");
                return Ok(models);
            }
            Ok(models) => {
                tracing::warn!(attempt, "oracle reachable but offers no models");
                last = Ok(models);
            }
            Err(e) => {
                tracing::warn!(attempt, attempts, error = %e, "connection attempt failed");
                if !e.is_transient() {
                    return Err(e);
                }
                last = Err(e);
            }
        }
        if attempt < attempts {
            tokio::time::sleep(retry.delay).await;
        }
    }
    last
}

/// Check the oracle with retries; see [`check_connection`].
pub async fn connect<O: CorrectionOracle + Sync>(
    oracle: &O,
    retry: RetryPolicy,
) -> ConnectionStatus {
    match list_with_retry(oracle, retry).await {
        Ok(models) => ConnectionStatus::from_models(models),
        Err(e) => ConnectionStatus::from_error(&e),
    }
}

/// First model the oracle offers, retrying like [`connect`].
///
/// The last error is returned as is, so callers can still tell an auth
/// failure from an unreachable server.
pub async fn first_model<O: CorrectionOracle + Sync>(
    oracle: &O,
    retry: RetryPolicy,
) -> Result<String, OracleError> {
    list_with_retry(oracle, retry)
        .await?
        .into_iter()
        .next()
        .ok_or(OracleError::NoModel)
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// HTTP client for an Ollama-compatible server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    config: ConnectionConfig,
}

impl OllamaClient {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn with_client(client: reqwest::Client, config: ConnectionConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, OracleError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| OracleError::from_reqwest(url, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(OracleError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))
    }
}

impl CorrectionOracle for OllamaClient {
    async fn correct(&self, text: &str, model: &str) -> Result<String, OracleError> {
        let url = self.config.endpoint("api/generate");
        let body = GenerateRequest {
            model,
            system: SYSTEM_PROMPT,
            prompt: correction_prompt(text),
            stream: false,
        };
        tracing::info!(model, chars = text.chars().count(), "requesting correction");
        let response: GenerateResponse = self.send(&url, self.client.post(&url).json(&body)).await?;
        tracing::debug!(chars = response.response.chars().count(), "correction received");
        Ok(response.response)
    }

    async fn list_models(&self) -> Result<Vec<String>, OracleError> {
        let url = self.config.endpoint("api/tags");
        let tags: TagsResponse = self.send(&url, self.client.get(&url)).await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}
