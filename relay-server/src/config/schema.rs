//! Configuration schema definitions.

use std::net::{Ipv4Addr, SocketAddr};

use relay::llms::OllamaConfig;
use relay::session::DEFAULT_CHANNEL_CAPACITY;
use relay::transport::StreamTransport;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// HTTP listener configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Model runtime configuration.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Streaming configuration.
    #[serde(default)]
    pub relay: RelayConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8080))
}

/// Streaming configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// How `/api/chat/stream` delivers output.
    #[serde(default)]
    pub stream_transport: StreamTransport,

    /// Events buffered between the upstream reader and a slow client.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            stream_transport: StreamTransport::default(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

const fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl AppConfig {
    /// Validate the configuration and return any issues found.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        match url::Url::parse(&self.ollama.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => issues.push(ConfigIssue::error(
                "ollama.base_url",
                format!("Unsupported scheme {:?}, expected http or https", url.scheme()),
            )),
            Err(e) => issues.push(ConfigIssue::error(
                "ollama.base_url",
                format!("Invalid URL {:?}: {e}", self.ollama.base_url),
            )),
        }

        if self.ollama.model.trim().is_empty() {
            issues.push(ConfigIssue::error("ollama.model", "Model must not be empty"));
        }

        if self.ollama.timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                "ollama.timeout_secs",
                "Timeout is 0, every upstream request will time out immediately",
            ));
        }

        if self.relay.channel_capacity == 0 {
            issues.push(ConfigIssue::error(
                "relay.channel_capacity",
                "Channel capacity must be at least 1",
            ));
        }

        issues
    }

    /// Check if the configuration is valid (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate()
            .iter()
            .all(|issue| issue.level != IssueLevel::Error)
    }

    /// Merge `OLLAMA_*` environment variables into the configuration.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        self.ollama = self.ollama.with_env_overrides();
        self
    }
}

/// Configuration validation issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Issue severity level.
    pub level: IssueLevel,
    /// Configuration path (e.g., "ollama.model").
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

impl ConfigIssue {
    /// Create an error-level issue.
    #[must_use]
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a warning-level issue.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            IssueLevel::Error => "ERROR",
            IssueLevel::Warning => "WARN",
        };
        write!(f, "[{}] {}: {}", prefix, self.path, self.message)
    }
}

/// Severity level for configuration issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// The server refuses to start.
    Error,
    /// Suspicious but usable.
    Warning,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind.to_string(), "127.0.0.1:8080");
        assert_eq!(config.ollama.model, "qwen3:0.6b");
        assert_eq!(config.relay.stream_transport, StreamTransport::Incremental);
        assert_eq!(config.relay.channel_capacity, 64);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_parse_sample_config() {
        let toml_str = r#"
[server]
bind = "0.0.0.0:9000"

[ollama]
base_url = "http://gpu-box:11434"
model = "llama3"
keep_alive = "5m"

[relay]
stream_transport = "buffered"
"#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind.port(), 9000);
        assert_eq!(config.ollama.base_url, "http://gpu-box:11434");
        assert_eq!(config.ollama.timeout_secs, 60);
        assert_eq!(config.ollama.keep_alive.as_deref(), Some("5m"));
        assert_eq!(config.relay.stream_transport, StreamTransport::BufferedSimulated);
        assert_eq!(config.relay.channel_capacity, 64);
    }

    #[test]
    fn test_rejects_unknown_section() {
        assert!(toml::from_str::<AppConfig>("[agents]\nmodel = \"x\"\n").is_err());
    }

    #[test]
    fn test_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_empty(), "Default config should have no issues");
        assert!(config.is_valid());
    }

    #[test]
    fn test_validation_zero_timeout_is_warning() {
        let mut config = AppConfig::default();
        config.ollama.timeout_secs = 0;
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].level, IssueLevel::Warning);
        assert!(config.is_valid());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = AppConfig::default();
        config.ollama.base_url = "ftp://host".to_owned();
        config.ollama.model = " ".to_owned();
        config.relay.channel_capacity = 0;

        let paths: Vec<_> = config.validate().into_iter().map(|i| i.path).collect();
        assert_eq!(
            paths,
            ["ollama.base_url", "ollama.model", "relay.channel_capacity"]
        );
        assert!(!config.is_valid());
    }

    #[test]
    fn test_issue_display() {
        let issue = ConfigIssue::error("ollama.model", "Model must not be empty");
        assert_eq!(issue.to_string(), "[ERROR] ollama.model: Model must not be empty");
    }
}
