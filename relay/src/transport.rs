//! Streaming transports.
//!
//! Both variants turn one prompt into a [`FrameStream`]; callers do not
//! branch on which one is active.
//!
//! - [`StreamTransport::Incremental`] relays chunks through a
//!   [`StreamSession`] as soon as the model produces them.
//! - [`StreamTransport::BufferedSimulated`] waits for the full completion and
//!   replays it one character per frame. It exists for clients that expect
//!   the JSON framing; it offers no real-time delivery.

use std::fmt;
use std::str::FromStr;

use futures::StreamExt;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::client::SharedModelClient;
use crate::error::UpstreamError;
use crate::frame::{END_MESSAGE, Frame, FrameKind, START_MESSAGE};
use crate::message::Prompt;
use crate::session::{SessionEvent, StreamSession};

/// Frames of one streamed response.
///
/// An `Err` item means the transport must abort the response instead of
/// ending it cleanly.
pub type FrameStream = BoxStream<'static, Result<Frame, UpstreamError>>;

/// Strategy used by the streaming endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamTransport {
    /// True incremental relay.
    #[default]
    Incremental,
    /// Buffer the whole completion, then flush it character by character.
    #[serde(rename = "buffered")]
    BufferedSimulated,
}

impl StreamTransport {
    /// Wire name used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::BufferedSimulated => "buffered",
        }
    }

    /// Relay a generation for `prompt` as frames.
    ///
    /// Nothing is sent upstream until the returned stream is polled, and
    /// dropping it abandons the generation.
    #[must_use]
    pub fn relay(self, client: SharedModelClient, prompt: Prompt, capacity: usize) -> FrameStream {
        match self {
            Self::Incremental => incremental(client, prompt, capacity),
            Self::BufferedSimulated => buffered(client, prompt),
        }
    }
}

impl fmt::Display for StreamTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incremental" => Ok(Self::Incremental),
            "buffered" => Ok(Self::BufferedSimulated),
            other => Err(format!(
                "unknown stream transport {other:?}, expected \"incremental\" or \"buffered\""
            )),
        }
    }
}

fn incremental(client: SharedModelClient, prompt: Prompt, capacity: usize) -> FrameStream {
    async_stream::stream! {
        let mut session = StreamSession::open(client.stream(&prompt), capacity);
        let mut chunks = 0_usize;

        while let Some(event) = session.next().await {
            match event {
                SessionEvent::Chunk(chunk) => {
                    chunks += 1;
                    yield Ok(Frame::html(chunk.text()));
                }
                SessionEvent::Completed => {
                    info!(chunks, "stream response completed");
                }
                SessionEvent::Failed(err) => {
                    error!(chunks, "stream response failed: {err}");
                    yield Ok(Frame::error(&err.to_string()));
                    // Return Pending once so the server flushes buffered
                    // frames before the body error aborts the connection.
                    tokio::task::yield_now().await;
                    yield Err(err);
                }
            }
        }
    }
    .boxed()
}

fn buffered(client: SharedModelClient, prompt: Prompt) -> FrameStream {
    async_stream::stream! {
        match client.complete(&prompt).await {
            Ok(completion) => {
                yield Ok::<_, UpstreamError>(Frame::json(FrameKind::Start, START_MESSAGE));
                let mut buf = [0_u8; 4];
                for c in completion.text().chars() {
                    yield Ok(Frame::json(FrameKind::Content, c.encode_utf8(&mut buf)));
                }
                yield Ok(Frame::json(FrameKind::End, END_MESSAGE));
            }
            Err(err) => {
                error!("buffered stream failed: {err}");
                yield Ok(Frame::json(FrameKind::Error, &err.apology()));
            }
        }
    }
    .boxed()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::client::ModelClient;
    use crate::message::{Chunk, Completion};
    use crate::stream::ChunkStream;

    /// Answers every prompt with the same scripted output.
    struct Scripted {
        chunks: Vec<&'static str>,
        failure: Option<UpstreamError>,
    }

    #[async_trait]
    impl ModelClient for Scripted {
        async fn complete(&self, _prompt: &Prompt) -> Result<Completion, UpstreamError> {
            match &self.failure {
                Some(err) => Err(err.clone()),
                None => Ok(Completion::from(self.chunks.concat())),
            }
        }

        fn stream(&self, _prompt: &Prompt) -> ChunkStream {
            let mut items: Vec<_> = self.chunks.iter().map(|c| Ok(Chunk::new(*c))).collect();
            if let Some(err) = &self.failure {
                items.push(Err(err.clone()));
            }
            ChunkStream::new(futures::stream::iter(items))
        }

        fn provider_name(&self) -> &'static str {
            "scripted"
        }

        fn model(&self) -> &str {
            "test"
        }
    }

    fn client(chunks: &[&'static str], failure: Option<UpstreamError>) -> SharedModelClient {
        Arc::new(Scripted {
            chunks: chunks.to_vec(),
            failure,
        })
    }

    async fn frames(
        transport: StreamTransport,
        client: SharedModelClient,
    ) -> Vec<Result<Frame, UpstreamError>> {
        transport.relay(client, Prompt::new("hi"), 4).collect().await
    }

    fn json_message(frame: &Frame) -> (String, String) {
        let value: serde_json::Value = serde_json::from_str(frame.data()).unwrap();
        (
            value["type"].as_str().unwrap().to_owned(),
            value["message"].as_str().unwrap().to_owned(),
        )
    }

    mod incremental {
        use super::*;

        #[tokio::test]
        async fn one_frame_per_chunk() {
            let frames = frames(
                StreamTransport::Incremental,
                client(&["Hello", "\n", "<think>x</think>"], None),
            )
            .await;
            let data: Vec<_> = frames
                .iter()
                .map(|f| f.as_ref().unwrap().data().to_owned())
                .collect();

            assert_eq!(data, ["Hello", "<br/>", "&lt;think&gt;x&lt;/think&gt;"]);
        }

        #[tokio::test]
        async fn failure_ends_with_error_frame_then_err() {
            let frames = frames(
                StreamTransport::Incremental,
                client(&["partial"], Some(UpstreamError::stream("connection reset"))),
            )
            .await;

            assert_eq!(frames.len(), 3);
            assert_eq!(frames[0].as_ref().unwrap().data(), "partial");
            let error_frame = frames[1].as_ref().unwrap();
            assert_eq!(error_frame.event(), Some(Frame::ERROR_EVENT));
            assert_eq!(error_frame.data(), "connection reset");
            assert_eq!(
                frames[2].as_ref().unwrap_err(),
                &UpstreamError::stream("connection reset")
            );
        }

        #[tokio::test]
        async fn empty_generation_yields_no_frames() {
            let frames = frames(StreamTransport::Incremental, client(&[], None)).await;
            assert!(frames.is_empty());
        }
    }

    mod buffered {
        use super::*;

        #[tokio::test]
        async fn start_characters_end() {
            let frames = frames(
                StreamTransport::BufferedSimulated,
                client(&["a\"", "é"], None),
            )
            .await;
            let messages: Vec<_> = frames
                .iter()
                .map(|f| json_message(f.as_ref().unwrap()))
                .collect();

            assert_eq!(
                messages,
                [
                    ("start".to_owned(), START_MESSAGE.to_owned()),
                    ("content".to_owned(), "a".to_owned()),
                    ("content".to_owned(), "\"".to_owned()),
                    ("content".to_owned(), "é".to_owned()),
                    ("end".to_owned(), END_MESSAGE.to_owned()),
                ]
            );
        }

        #[tokio::test]
        async fn failure_is_a_single_error_frame() {
            let frames = frames(
                StreamTransport::BufferedSimulated,
                client(&[], Some(UpstreamError::network("Connection failed"))),
            )
            .await;

            assert_eq!(frames.len(), 1);
            let (kind, message) = json_message(frames[0].as_ref().unwrap());
            assert_eq!(kind, "error");
            assert_eq!(
                message,
                "Sorry, an error occurred while processing your request: Connection failed"
            );
        }
    }

    mod selection {
        use super::*;

        #[test]
        fn parses_names() {
            assert_eq!("incremental".parse(), Ok(StreamTransport::Incremental));
            assert_eq!("buffered".parse(), Ok(StreamTransport::BufferedSimulated));
            assert!("batch".parse::<StreamTransport>().is_err());
        }

        #[test]
        fn deserializes_config_names() {
            let t: StreamTransport = serde_json::from_str("\"buffered\"").unwrap();
            assert_eq!(t, StreamTransport::BufferedSimulated);
            assert_eq!(StreamTransport::default(), StreamTransport::Incremental);
        }

        #[test]
        fn display_matches_config_name() {
            assert_eq!(StreamTransport::BufferedSimulated.to_string(), "buffered");
        }
    }
}
