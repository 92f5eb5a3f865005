use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default Ollama endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Configuration for the local Ollama client
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: f64,
    /// Temperature (0.0 = deterministic)
    pub temperature: f64,
    /// Token budget per response
    pub num_predict: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            timeout_secs: 180.0,
            temperature: 0.0,
            num_predict: 1200,
        }
    }
}

impl OllamaConfig {
    pub fn new(base_url: impl Into<String>, timeout_secs: f64) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs,
            ..Default::default()
        }
    }

    /// Defaults overridden by OLLAMA_URL / OLLAMA_TIMEOUT when set
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            config.base_url = url;
        }
        if let Ok(timeout) = std::env::var("OLLAMA_TIMEOUT") {
            config.timeout_secs = timeout
                .trim()
                .parse()
                .with_context(|| format!("OLLAMA_TIMEOUT is not a number: {timeout}"))?;
        }
        Ok(config)
    }

    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Result<Duration> {
        if !(self.timeout_secs.is_finite() && self.timeout_secs > 0.0) {
            anyhow::bail!("--timeout must be > 0");
        }
        Duration::try_from_secs_f64(self.timeout_secs)
            .with_context(|| format!("--timeout is out of range: {}", self.timeout_secs))
    }

    /// Reject settings that would make every request fail
    pub fn validate(&self) -> Result<()> {
        self.timeout()?;
        if self.base_url.trim().is_empty() {
            anyhow::bail!("--ollama-url must not be empty");
        }
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Errors talking to the model server
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Ollama response missing message content.")]
    MissingContent,
}

/// A chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Anything that can answer a chat request with raw text.
///
/// Requests are issued one at a time; implementations need not be
/// reentrant.
#[allow(async_fn_in_trait)]
pub trait ChatGateway {
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, GatewayError>;
}

/// Ollama HTTP client
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout()?)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Fetch installed model names from /api/tags
    pub async fn list_models(&self) -> Result<Vec<String>, GatewayError> {
        let response = self
            .client
            .get(self.config.endpoint("/api/tags"))
            .header("content-type", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags
            .models
            .into_iter()
            .filter_map(|m| m.name.filter(|n| !n.is_empty()).or(m.model))
            .filter(|name| !name.is_empty())
            .collect())
    }
}

impl ChatGateway for OllamaClient {
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model,
            messages,
            stream: false,
            think: false,
            format: "json",
            options: ChatOptions {
                temperature: self.config.temperature,
                num_predict: self.config.num_predict,
            },
        };

        let response = self
            .client
            .post(self.config.endpoint("/api/chat"))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        let body: ChatResponse = response.json().await?;
        body.message
            .and_then(|m| m.content)
            .and_then(|c| match c {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .ok_or(GatewayError::MissingContent)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    think: bool,
    format: &'a str,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    model: Option<String>,
}
