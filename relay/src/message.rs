//! Request-scoped text values: the caller's [`Prompt`], the model's
//! [`Completion`] and the incremental [`Chunk`]s of a streamed completion.

use std::fmt;

use crate::error::ValidationError;

/// Text supplied by the caller.
///
/// A prompt is always present; an empty string is a valid prompt. Requests
/// without one are rejected through [`Prompt::try_from`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    /// Name of the request parameter carrying the prompt.
    pub const FIELD: &'static str = "prompt";

    /// Creates a prompt from text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the prompt text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<Option<String>> for Prompt {
    type Error = ValidationError;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        value
            .map(Self)
            .ok_or_else(|| ValidationError::missing(Self::FIELD))
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Full text returned by the model for a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion(String);

impl Completion {
    /// Returns the completion text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.0
    }

    /// Consumes the completion and returns its text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.0
    }
}

impl From<String> for Completion {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Completion {
    fn from(text: &str) -> Self {
        Self(text.to_owned())
    }
}

/// One incremental fragment of a completion, in generation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk(String);

impl Chunk {
    /// Creates a chunk.
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the chunk text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the chunk carries no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
