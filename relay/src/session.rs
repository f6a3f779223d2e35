//! Per-request stream sessions.
//!
//! A [`StreamSession`] moves chunks from a [`ChunkStream`] across a bounded
//! channel: a spawned producer task drives the upstream stream, the session
//! itself is the consumer. Dropping the session cancels the producer, which
//! drops the upstream stream and with it the in-flight request.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::UpstreamError;
use crate::message::Chunk;
use crate::stream::ChunkStream;

/// Default capacity of the producer/consumer handoff.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Chunks may still arrive.
    Open,
    /// The generation finished successfully.
    Completed,
    /// The generation failed.
    Errored,
}

/// What the consumer observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A chunk of output.
    Chunk(Chunk),
    /// The generation finished successfully.
    Completed,
    /// The generation failed.
    Failed(UpstreamError),
}

impl SessionEvent {
    const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Chunk(_))
    }
}

/// Consumer side of one streamed generation.
///
/// Yields zero or more [`SessionEvent::Chunk`]s followed by exactly one
/// terminal event, then `None`.
#[derive(Debug)]
pub struct StreamSession {
    rx: mpsc::Receiver<SessionEvent>,
    state: SessionState,
    cancel: CancellationToken,
    producer: JoinHandle<()>,
}

impl StreamSession {
    /// Open a session over `chunks`.
    ///
    /// `capacity` bounds how many events may wait for a slow consumer; the
    /// producer stops polling upstream while the buffer is full. Must be
    /// called from within a tokio runtime.
    #[must_use]
    pub fn open(chunks: ChunkStream, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let cancel = CancellationToken::new();
        let producer = tokio::spawn(produce(chunks, tx, cancel.clone()));

        debug!(capacity, "stream session opened");

        Self {
            rx,
            state: SessionState::Open,
            cancel,
            producer,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Token cancelled when the session is torn down.
    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Stream for StreamSession {
    type Item = SessionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.state != SessionState::Open {
            return Poll::Ready(None);
        }

        let event = match self.rx.poll_recv(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Some(event)) => event,
            // Producer went away without a terminal event (it panicked or
            // was aborted); report instead of ending silently.
            Poll::Ready(None) => {
                SessionEvent::Failed(UpstreamError::stream("stream producer stopped unexpectedly"))
            }
        };

        match event {
            SessionEvent::Completed => self.state = SessionState::Completed,
            SessionEvent::Failed(_) => self.state = SessionState::Errored,
            SessionEvent::Chunk(_) => {}
        }

        Poll::Ready(Some(event))
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        if self.state == SessionState::Open {
            debug!("stream session torn down before completion");
        }
        self.cancel.cancel();
        self.producer.abort();
    }
}

async fn produce(
    mut chunks: ChunkStream,
    tx: mpsc::Sender<SessionEvent>,
    cancel: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            next = chunks.next() => next,
        };

        let event = match next {
            Some(Ok(chunk)) => {
                trace!(len = chunk.text().len(), "chunk produced");
                SessionEvent::Chunk(chunk)
            }
            Some(Err(err)) => SessionEvent::Failed(err),
            None => SessionEvent::Completed,
        };
        let terminal = event.is_terminal();

        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            sent = tx.send(event) => sent.is_ok(),
        };

        if !sent || terminal {
            return;
        }
    }
}
