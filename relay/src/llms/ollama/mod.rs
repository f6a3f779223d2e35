//! Ollama API client implementation.
//!
//! Talks to the `/api/chat` endpoint of a local Ollama server, either as a
//! single JSON response or as an NDJSON stream.

mod chat;
mod client;
mod config;
mod stream;

pub use client::Ollama;
pub use config::OllamaConfig;
