//! Ollama NDJSON stream parsing.

use serde::Deserialize;

use crate::error::UpstreamError;

use super::client::{Ollama, OllamaMessage};

/// Ollama streaming response line.
#[derive(Debug, Clone, Deserialize)]
struct OllamaStreamLine {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// A decoded stream line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum StreamLine {
    /// Partial output; may be empty.
    Content(String),
    /// Final line of a successful generation.
    Done { reason: Option<String> },
}

/// Parse one NDJSON line. Blank lines yield `None`.
pub(super) fn parse_stream_line(line: &[u8]) -> Option<Result<StreamLine, UpstreamError>> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    let parsed = match serde_json::from_slice::<OllamaStreamLine>(line) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(
                "Failed to parse Ollama chunk: {e}, line: {}",
                String::from_utf8_lossy(line)
            );
            return Some(Err(UpstreamError::stream(format!("Parse error: {e}"))));
        }
    };

    if let Some(error) = parsed.error {
        return Some(Err(UpstreamError::provider(Ollama::PROVIDER, error)));
    }

    if parsed.done {
        return Some(Ok(StreamLine::Done {
            reason: parsed.done_reason,
        }));
    }

    let content = parsed.message.map(|m| m.content).unwrap_or_default();
    Some(Ok(StreamLine::Content(content)))
}

/// Longest NDJSON line accepted from the runtime.
pub(super) const MAX_LINE_BYTES: usize = 1 << 20;

/// Reassembles NDJSON lines from arbitrarily split network reads.
#[derive(Debug, Default)]
pub(super) struct LineBuffer {
    pending: Vec<u8>,
    /// Bytes of `pending` already known to hold no newline.
    scanned: usize,
}

impl LineBuffer {
    /// Append bytes and return every line they complete.
    ///
    /// Fails once a line grows past [`MAX_LINE_BYTES`].
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<Vec<u8>>, UpstreamError> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[self.scanned..].iter().position(|&b| b == b'\n') {
            let end = self.scanned + offset;
            Self::check_len(end - start)?;
            lines.push(self.pending[start..end].to_vec());
            start = end + 1;
            self.scanned = start;
        }

        self.pending.drain(..start);
        self.scanned = self.pending.len();
        Self::check_len(self.pending.len())?;
        Ok(lines)
    }

    /// Take whatever is left after the final read.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        self.scanned = 0;
        if self.pending.iter().all(u8::is_ascii_whitespace) {
            self.pending.clear();
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    fn check_len(len: usize) -> Result<(), UpstreamError> {
        if len > MAX_LINE_BYTES {
            return Err(UpstreamError::stream(format!(
                "stream line exceeds {MAX_LINE_BYTES} bytes"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::UpstreamErrorKind;

    fn parse(line: &str) -> Result<StreamLine, UpstreamError> {
        parse_stream_line(line.as_bytes()).expect("should be Some")
    }

    mod parse_stream_line {
        use super::*;

        #[test]
        fn empty_line_returns_none() {
            assert!(parse_stream_line(b"").is_none());
        }

        #[test]
        fn whitespace_only_returns_none() {
            assert!(parse_stream_line(b"   ").is_none());
            assert!(parse_stream_line(b"\t").is_none());
            assert!(parse_stream_line(b"\r").is_none());
        }

        #[test]
        fn parses_text_content() {
            let line = r#"{"message":{"role":"assistant","content":"Hello"},"done":false}"#;
            assert_eq!(parse(line).unwrap(), StreamLine::Content("Hello".to_owned()));
        }

        #[test]
        fn parses_text_with_escapes() {
            let line = r#"{"message":{"content":"He said \"hi\"\n"},"done":false}"#;
            assert_eq!(
                parse(line).unwrap(),
                StreamLine::Content("He said \"hi\"\n".to_owned())
            );
        }

        #[test]
        fn parses_unicode() {
            let line = r#"{"message":{"content":"你好世界 🌍"},"done":false}"#;
            assert_eq!(
                parse(line).unwrap(),
                StreamLine::Content("你好世界 🌍".to_owned())
            );
        }

        #[test]
        fn trims_surrounding_whitespace() {
            let line = "  {\"message\":{\"content\":\"Hi\"},\"done\":false}\r";
            assert!(parse(line).is_ok());
        }

        #[test]
        fn missing_message_is_empty_content() {
            assert_eq!(
                parse(r#"{"done":false}"#).unwrap(),
                StreamLine::Content(String::new())
            );
        }

        #[test]
        fn done_line() {
            let line = r#"{"message":{"content":""},"done":true,"done_reason":"stop"}"#;
            assert_eq!(
                parse(line).unwrap(),
                StreamLine::Done {
                    reason: Some("stop".to_owned())
                }
            );
        }

        #[test]
        fn error_line_is_provider_error() {
            let err = parse(r#"{"error":"model 'x' not found"}"#).unwrap_err();

            assert_eq!(err.kind(), UpstreamErrorKind::Provider);
            assert!(err.to_string().contains("model 'x' not found"));
        }

        #[test]
        fn malformed_json_is_stream_error() {
            let err = parse(r#"{"message":{"content":"Hi"}"#).unwrap_err();
            assert_eq!(err.kind(), UpstreamErrorKind::Stream);
        }
    }

    mod line_buffer {
        use super::*;

        #[test]
        fn splits_complete_lines() {
            let mut buffer = LineBuffer::default();
            let lines = buffer.push(b"one\ntwo\n").unwrap();

            assert_eq!(lines, [b"one".to_vec(), b"two".to_vec()]);
            assert!(buffer.finish().is_none());
        }

        #[test]
        fn joins_lines_across_reads() {
            let mut buffer = LineBuffer::default();

            assert!(buffer.push(b"{\"message\":{\"con").unwrap().is_empty());
            let lines = buffer.push(b"tent\":\"Hi\"},\"done\":false}\n{\"do").unwrap();

            assert_eq!(lines.len(), 1);
            assert_eq!(
                parse_stream_line(&lines[0]).unwrap().unwrap(),
                StreamLine::Content("Hi".to_owned())
            );

            let lines = buffer.push(b"ne\":true}\n").unwrap();
            assert_eq!(
                parse_stream_line(&lines[0]).unwrap().unwrap(),
                StreamLine::Done { reason: None }
            );
        }

        #[test]
        fn keeps_multibyte_characters_intact() {
            let text = "{\"message\":{\"content\":\"🌍\"},\"done\":false}\n".as_bytes();
            let (head, tail) = text.split_at(27);
            let mut buffer = LineBuffer::default();

            assert!(buffer.push(head).unwrap().is_empty());
            let lines = buffer.push(tail).unwrap();
            assert_eq!(
                parse_stream_line(&lines[0]).unwrap().unwrap(),
                StreamLine::Content("🌍".to_owned())
            );
        }

        #[test]
        fn long_line_in_many_small_reads() {
            let content = "x".repeat(10_000);
            let text = format!("{{\"message\":{{\"content\":\"{content}\"}},\"done\":false}}\n");
            let mut buffer = LineBuffer::default();
            let mut lines = Vec::new();
            for piece in text.as_bytes().chunks(7) {
                lines.extend(buffer.push(piece).unwrap());
            }

            assert_eq!(lines.len(), 1);
            assert_eq!(
                parse_stream_line(&lines[0]).unwrap().unwrap(),
                StreamLine::Content(content)
            );
            assert!(buffer.finish().is_none());
        }

        #[test]
        fn rejects_oversized_unterminated_line() {
            let mut buffer = LineBuffer::default();
            let piece = vec![b'a'; MAX_LINE_BYTES / 2];

            assert!(buffer.push(&piece).unwrap().is_empty());
            assert!(buffer.push(&piece).unwrap().is_empty());
            let err = buffer.push(b"a").unwrap_err();
            assert_eq!(err.kind(), UpstreamErrorKind::Stream);
        }

        #[test]
        fn rejects_oversized_complete_line() {
            let mut line = vec![b'a'; MAX_LINE_BYTES + 1];
            line.push(b'\n');

            let err = LineBuffer::default().push(&line).unwrap_err();
            assert!(err.to_string().contains("exceeds"));
        }

        #[test]
        fn finish_returns_unterminated_tail() {
            let mut buffer = LineBuffer::default();
            buffer.push(b"{\"done\":true}").unwrap();

            assert_eq!(buffer.finish(), Some(b"{\"done\":true}".to_vec()));
            assert!(buffer.finish().is_none());
        }
    }
}
