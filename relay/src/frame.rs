//! Server-sent event frames.
//!
//! Every unit the streaming endpoint flushes is one [`Frame`], encoded as
//! `event:` (optional) and `data:` lines followed by a blank line.

use bytes::Bytes;

use crate::escape::{escape_html, escape_json};

/// Message carried by the `start` frame of a buffered stream.
pub const START_MESSAGE: &str = "Generating response...";
/// Message carried by the `end` frame of a buffered stream.
pub const END_MESSAGE: &str = "Generation complete";

/// Value of the `type` field in a JSON frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Generation accepted.
    Start,
    /// One unit of completion text.
    Content,
    /// Generation finished.
    End,
    /// Generation failed.
    Error,
}

impl FrameKind {
    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Content => "content",
            Self::End => "end",
            Self::Error => "error",
        }
    }
}

/// One flushed unit of a streamed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    event: Option<&'static str>,
    data: String,
}

impl Frame {
    /// Event name used for failure frames of the incremental transport.
    pub const ERROR_EVENT: &'static str = "error";

    /// A data frame carrying HTML-escaped text.
    #[must_use]
    pub fn html(text: &str) -> Self {
        Self {
            event: None,
            data: escape_html(text),
        }
    }

    /// A data frame carrying `{"type":..,"message":..}`.
    #[must_use]
    pub fn json(kind: FrameKind, message: &str) -> Self {
        Self {
            event: None,
            data: format!(
                "{{\"type\":\"{}\",\"message\":\"{}\"}}",
                kind.as_str(),
                escape_json(message)
            ),
        }
    }

    /// A named `error` event carrying the HTML-escaped failure cause.
    #[must_use]
    pub fn error(cause: &str) -> Self {
        Self {
            event: Some(Self::ERROR_EVENT),
            data: escape_html(cause),
        }
    }

    /// The event name, if any.
    #[must_use]
    pub const fn event(&self) -> Option<&'static str> {
        self.event
    }

    /// The frame payload.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Encode the frame for the wire.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut out = String::with_capacity(self.data.len() + 16);
        if let Some(event) = self.event {
            out.push_str("event: ");
            out.push_str(event);
            out.push('\n');
        }
        out.push_str("data: ");
        out.push_str(&self.data);
        out.push_str("\n\n");
        Bytes::from(out)
    }
}
