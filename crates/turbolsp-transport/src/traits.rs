//! Minimal transport seams.
//!
//! The dispatcher consumes these traits instead of a concrete transport so
//! tests can run the full endpoint over in-memory pipes. A transport splits
//! into a read half (owned by the dispatch loop) and a write half (owned by
//! the endpoint's writer task).

use async_trait::async_trait;
use turbolsp_protocol::Message;

use crate::error::TransportResult;

/// The inbound half: a sequence of decoded envelopes.
#[async_trait]
pub trait MessageStream: Send {
    /// Receive the next frame.
    ///
    /// Returns `None` at end-of-stream. An `Err` is fatal to the session;
    /// callers must not poll again after one.
    async fn recv(&mut self) -> Option<TransportResult<Message>>;
}

/// The outbound half: writes one frame at a time.
#[async_trait]
pub trait MessageSink: Send {
    /// Encode and write one frame, flushing it to the peer.
    ///
    /// # Errors
    ///
    /// Any write failure is fatal to the session.
    async fn send(&mut self, message: Message) -> TransportResult<()>;
}

/// A bidirectional frame source that can be torn into its two halves.
pub trait Transport: Send {
    /// The read half handed to the dispatch loop.
    type Reader: MessageStream + 'static;
    /// The write half handed to the writer task.
    type Writer: MessageSink + 'static;

    /// Split into independently owned halves.
    fn into_split(self) -> (Self::Reader, Self::Writer);
}
