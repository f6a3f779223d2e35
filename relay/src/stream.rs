//! Incremental generation output.
//!
//! A [`ChunkStream`] is a lazy, finite, non-restartable sequence of
//! [`Chunk`]s terminated by exactly one terminal event: the end of the stream
//! on success, or a single `Err` on failure. Once terminated it yields
//! nothing more, whatever the underlying source does.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{BoxStream, FusedStream};
use futures::{Stream, StreamExt};

use crate::error::UpstreamError;
use crate::message::{Chunk, Completion};

/// Stream of chunks produced by a model client.
pub struct ChunkStream {
    inner: BoxStream<'static, Result<Chunk, UpstreamError>>,
    terminated: bool,
}

impl ChunkStream {
    /// Wraps a source stream.
    ///
    /// The source is polled until it ends or yields its first error.
    pub fn new<S>(source: S) -> Self
    where
        S: Stream<Item = Result<Chunk, UpstreamError>> + Send + 'static,
    {
        Self {
            inner: source.boxed(),
            terminated: false,
        }
    }

    /// A stream that yields the given chunks and then completes.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Chunk>,
        I::IntoIter: Send + 'static,
    {
        Self::new(futures::stream::iter(chunks.into_iter().map(Ok)))
    }

    /// A stream that fails immediately.
    #[must_use]
    pub fn failed(err: UpstreamError) -> Self {
        Self::new(futures::stream::once(async move { Err(err) }))
    }

    /// Drains the stream, concatenating chunks in order.
    ///
    /// # Errors
    ///
    /// Returns the stream's terminal error, if any.
    pub async fn collect_completion(mut self) -> Result<Completion, UpstreamError> {
        let mut text = String::new();
        while let Some(chunk) = self.next().await {
            text.push_str(chunk?.text());
        }
        Ok(Completion::from(text))
    }
}

impl Stream for ChunkStream {
    type Item = Result<Chunk, UpstreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.terminated {
            return Poll::Ready(None);
        }

        match self.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => Poll::Ready(Some(Ok(chunk))),
            Poll::Ready(Some(Err(err))) => {
                self.terminated = true;
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                self.terminated = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl FusedStream for ChunkStream {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl fmt::Debug for ChunkStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkStream")
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}
