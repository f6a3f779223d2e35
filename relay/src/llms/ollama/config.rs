//! Ollama client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the Ollama client.
///
/// Built once at startup and handed to [`Ollama::new`](super::Ollama::new);
/// the client never changes it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Model to generate with.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Controls how long the model stays loaded in memory (e.g., "5m", "0" to unload immediately).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
}

impl OllamaConfig {
    /// Default Ollama API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:11434";
    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "qwen3:0.6b";
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// Reads from:
    /// - `OLLAMA_BASE_URL` - Optional base URL
    /// - `OLLAMA_MODEL` - Optional model
    /// - `OLLAMA_TIMEOUT` - Optional timeout in seconds
    /// - `OLLAMA_KEEP_ALIVE` - Optional keep alive duration
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies any `OLLAMA_*` environment variables on top of `self`.
    ///
    /// Unparseable timeouts are ignored with a warning.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var("OLLAMA_BASE_URL") {
            self.base_url = base_url;
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            self.model = model;
        }
        if let Ok(timeout) = std::env::var("OLLAMA_TIMEOUT") {
            match timeout.parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(e) => tracing::warn!(value = %timeout, "ignoring OLLAMA_TIMEOUT: {e}"),
            }
        }
        if let Ok(keep_alive) = std::env::var("OLLAMA_KEEP_ALIVE") {
            self.keep_alive = Some(keep_alive);
        }
        self
    }

    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the keep alive duration.
    #[must_use]
    pub fn keep_alive(mut self, duration: impl Into<String>) -> Self {
        self.keep_alive = Some(duration.into());
        self
    }

    /// The request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            model: Self::DEFAULT_MODEL.to_owned(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            keep_alive: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = OllamaConfig::default();

        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "qwen3:0.6b");
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert!(config.keep_alive.is_none());
    }

    #[test]
    fn builder_methods() {
        let config = OllamaConfig::new()
            .base_url("http://gpu-server:11434")
            .model("llama3")
            .timeout(5)
            .keep_alive("5m");

        assert_eq!(config.base_url, "http://gpu-server:11434");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.keep_alive.as_deref(), Some("5m"));
    }

    #[test]
    fn deserializes_partial_table() {
        let config: OllamaConfig = serde_json::from_str(r#"{"model":"llama3"}"#).unwrap();

        assert_eq!(config.model, "llama3");
        assert_eq!(config.base_url, OllamaConfig::DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, OllamaConfig::DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn keep_alive_omitted_when_unset() {
        let json = serde_json::to_string(&OllamaConfig::default()).unwrap();
        assert!(!json.contains("keep_alive"));
    }
}
