//! Relay - streaming text generation from a local Ollama model.
//!
//! This crate holds everything below the HTTP surface: the Ollama adapter,
//! the lazily-opened chunk stream, the bounded stream session that relays
//! chunks to a consumer, text escaping and frame encoding.

pub mod client;
pub mod error;
pub mod escape;
pub mod frame;
pub mod llms;
pub mod message;
pub mod prelude;
pub mod session;
pub mod stream;
pub mod transport;

pub use error::{Error, Result, UpstreamError, UpstreamErrorKind, ValidationError};
