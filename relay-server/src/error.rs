//! Server and API error types.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use relay::error::{UpstreamError, ValidationError};
use serde::Serialize;

use crate::config::ConfigError;
use crate::util::timestamp_ms;

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Failures that stop the server from starting or running.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServerError {
    /// Loading or rendering the configuration failed.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The configuration has error-level issues.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The model client could not be built.
    #[error("failed to create model client: {0}")]
    Client(#[from] UpstreamError),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying cause.
        source: std::io::Error,
    },

    /// The HTTP server stopped with an error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Errors returned to HTTP clients as structured JSON.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request parameters were rejected (400).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Anything unexpected (500).
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ValidationBody<'a> {
    message: &'static str,
    errors: &'a BTreeMap<String, String>,
    timestamp: u64,
}

#[derive(Serialize)]
struct InternalBody<'a> {
    message: &'static str,
    error: &'a str,
    timestamp: u64,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Validation(err) => {
                tracing::warn!("rejected request: {err}");
                let body = ValidationBody {
                    message: "Parameter validation failed",
                    errors: err.fields(),
                    timestamp: timestamp_ms(),
                };
                (status, Json(body)).into_response()
            }
            Self::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                let body = InternalBody {
                    message: "Internal server error",
                    error: msg,
                    timestamp: timestamp_ms(),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
