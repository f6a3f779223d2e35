//! Ollama API client.

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;
use crate::message::Prompt;

use super::config::OllamaConfig;

/// Ollama chat request.
#[derive(Debug, Clone, Serialize)]
pub(super) struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
}

/// Ollama message format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct OllamaMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// Ollama error response.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct OllamaErrorResponse {
    pub error: String,
}

/// Ollama API client.
#[derive(Debug, Clone)]
pub struct Ollama {
    pub(super) config: Arc<OllamaConfig>,
    pub(super) http_client: Client,
}

impl Ollama {
    /// Name reported in logs and provider errors.
    pub const PROVIDER: &'static str = "ollama";

    /// Create a new Ollama client with the given configuration.
    ///
    /// # Errors
    ///
    /// Fails if the base URL is not an absolute `http(s)` URL or the HTTP
    /// client cannot be built.
    pub fn new(config: OllamaConfig) -> Result<Self, UpstreamError> {
        let url = url::Url::parse(&config.base_url).map_err(|e| {
            UpstreamError::internal(format!("Invalid base URL {:?}: {e}", config.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(UpstreamError::internal(format!(
                "Unsupported base URL scheme: {}",
                url.scheme()
            )));
        }

        // The total timeout is applied per request: a streamed generation
        // may legitimately outlive it as long as chunks keep arriving.
        let http_client = Client::builder()
            .connect_timeout(config.request_timeout())
            .build()
            .map_err(|e| UpstreamError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }

    /// Create a client with default configuration.
    ///
    /// # Errors
    ///
    /// See [`Ollama::new`].
    pub fn with_defaults() -> Result<Self, UpstreamError> {
        Self::new(OllamaConfig::default())
    }

    /// Create a client from environment variables.
    ///
    /// # Errors
    ///
    /// See [`Ollama::new`].
    pub fn from_env() -> Result<Self, UpstreamError> {
        Self::new(OllamaConfig::from_env())
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Build the chat API URL.
    pub(super) fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the request body for a single-turn chat.
    pub(super) fn build_body(&self, prompt: &Prompt, stream: bool) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.config.model.clone(),
            messages: vec![OllamaMessage {
                role: "user".to_owned(),
                content: prompt.as_str().to_owned(),
            }],
            stream,
            keep_alive: self.config.keep_alive.clone(),
        }
    }

    /// Parse an error response from Ollama.
    pub(super) fn parse_error(status: u16, body: &str) -> UpstreamError {
        if let Ok(error_response) = serde_json::from_str::<OllamaErrorResponse>(body) {
            return UpstreamError::provider(Self::PROVIDER, error_response.error);
        }
        UpstreamError::http_status(status, body)
    }
}
