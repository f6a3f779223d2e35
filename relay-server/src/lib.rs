//! HTTP front end for the relay.
//!
//! Exposes a synchronous and a streaming chat endpoint over a single
//! [`ModelClient`](relay::client::ModelClient), plus a health check.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod util;

pub use error::{ApiError, Result, ServerError};
pub use routes::router;
pub use state::AppState;
