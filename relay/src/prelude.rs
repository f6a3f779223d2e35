//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use relay::prelude::*;
//! ```

pub use crate::client::{ModelClient, SharedModelClient};
pub use crate::error::{Error, UpstreamError, UpstreamErrorKind, ValidationError};
pub use crate::frame::{Frame, FrameKind};
pub use crate::llms::{Ollama, OllamaConfig};
pub use crate::message::{Chunk, Completion, Prompt};
pub use crate::session::{SessionEvent, SessionState, StreamSession};
pub use crate::stream::ChunkStream;
pub use crate::transport::{FrameStream, StreamTransport};
