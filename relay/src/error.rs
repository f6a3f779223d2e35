//! Error types for the relay.
//!
//! - [`UpstreamError`] covers every failure talking to the model runtime
//!   (connection, timeout, status, malformed payload, broken stream).
//! - [`ValidationError`] collects per-field messages for rejected request
//!   parameters.
//! - [`Error`] wraps both for callers that do not care which one occurred.

use std::collections::BTreeMap;
use std::fmt;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the relay.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The model runtime failed.
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// A request parameter was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Prefix of the user-facing message returned when a generation fails.
pub const APOLOGY_PREFIX: &str = "Sorry, an error occurred while processing your request: ";

/// Error returned when the model runtime could not produce a completion.
///
/// The [`Display`](fmt::Display) output is the human-readable cause; it is
/// what callers embed in apology strings and error frames.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct UpstreamError {
    /// The error kind.
    pub kind: UpstreamErrorKind,
    /// Human-readable cause.
    pub message: String,
}

/// Categories of upstream failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum UpstreamErrorKind {
    /// Connection refused, DNS failure, reset.
    Network,
    /// The runtime did not answer within the configured timeout.
    Timeout,
    /// Non-success HTTP status without a structured error body.
    HttpStatus,
    /// The runtime reported an error (`{"error": "..."}`).
    Provider,
    /// The response body could not be decoded.
    ResponseFormat,
    /// The incremental stream broke off or carried an invalid line.
    Stream,
    /// Client construction or other local failure.
    Internal,
}

impl UpstreamError {
    fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Network, message)
    }

    /// Create a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Timeout, message)
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn http_status(status: u16, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {body}")
        };
        Self::new(UpstreamErrorKind::HttpStatus, message)
    }

    /// Create a provider-reported error.
    #[must_use]
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        Self::new(
            UpstreamErrorKind::Provider,
            format!("[{provider}] {}", message.into()),
        )
    }

    /// Create a response format error.
    #[must_use]
    pub fn response_format(expected: impl fmt::Display, got: impl fmt::Display) -> Self {
        Self::new(
            UpstreamErrorKind::ResponseFormat,
            format!("Expected {expected}, got {got}"),
        )
    }

    /// Create a streaming error.
    #[must_use]
    pub fn stream(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Stream, message)
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Internal, message)
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> UpstreamErrorKind {
        self.kind
    }

    /// Returns `true` if the runtime did not answer in time.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, UpstreamErrorKind::Timeout)
    }

    /// User-facing apology embedding the cause.
    #[must_use]
    pub fn apology(&self) -> String {
        format!("{APOLOGY_PREFIX}{}", self.message)
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for UpstreamError {}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("Request timed out")
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {err}"))
        } else if err.is_decode() {
            Self::response_format("valid response body", err)
        } else {
            Self::network(err.to_string())
        }
    }
}

/// A request parameter was missing or invalid.
///
/// Messages are keyed by field name so the HTTP layer can report exactly the
/// offending fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("Parameter validation failed: {}", self.summary())]
pub struct ValidationError {
    fields: BTreeMap<String, String>,
}

impl ValidationError {
    /// Create an error for a single field.
    #[must_use]
    pub fn field(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::default().with_field(name, message)
    }

    /// Create an error for a required parameter that was not supplied.
    #[must_use]
    pub fn missing(name: impl Into<String>) -> Self {
        Self::field(name, "must not be null")
    }

    /// Add another offending field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.fields.insert(name.into(), message.into());
        self
    }

    /// Per-field messages, ordered by field name.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    fn summary(&self) -> String {
        self.fields
            .iter()
            .map(|(field, message)| format!("{field} {message}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
