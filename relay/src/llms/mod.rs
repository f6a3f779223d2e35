//! Model runtime backends.
//!
//! - [`ollama`] - Ollama local LLM server

pub mod ollama;

pub use ollama::{Ollama, OllamaConfig};
