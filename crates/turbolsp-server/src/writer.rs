//! Outbound frame ordering.
//!
//! All outbound traffic — handler replies, server-originated calls and
//! notifications, synthesized error replies — funnels through one unbounded
//! FIFO channel drained by a single writer task that owns the transport's
//! write half. That task is the only writer, so frames are totally ordered
//! and never interleave, and no registry lock is ever held around a
//! transport write.
//!
//! The sending side, [`MessageWriter`], is synchronous and clonable: it can
//! be used from `Drop` impls (a dropped reply handle synthesizes its error
//! reply here) and from worker tasks that finished after the dispatch loop.

use tokio::sync::mpsc;
use tracing::{debug, trace};
use turbolsp_protocol::{Message, Notification, Request, RequestId, Response, ResponseError};
use turbolsp_transport::{MessageSink, TransportResult};

use serde_json::Value;

/// Clonable handle that enqueues outbound frames.
#[derive(Debug, Clone)]
pub struct MessageWriter {
    tx: mpsc::UnboundedSender<Message>,
}

impl MessageWriter {
    /// Create a writer handle and the receiving end for the writer task.
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue a server-originated notification.
    pub fn notify(&self, method: impl Into<String>, params: Option<Value>) {
        self.enqueue(Message::from(Notification::new(method, params)));
    }

    /// Enqueue a server-originated call.
    pub fn call(&self, id: RequestId, method: impl Into<String>, params: Option<Value>) {
        self.enqueue(Message::from(Request::new(id, method, params)));
    }

    /// Enqueue the reply to an inbound call.
    pub fn reply(&self, id: RequestId, outcome: Result<Value, ResponseError>) {
        self.enqueue(Message::from(Response::from_outcome(id, outcome)));
    }

    fn enqueue(&self, message: Message) {
        // Send only fails after teardown, when the writer task is gone and
        // the frame has nowhere to go.
        if self.tx.send(message).is_err() {
            debug!("transport writer closed; dropping outbound frame");
        }
    }
}

/// Drain the outbound queue into the transport's write half.
///
/// Runs until every [`MessageWriter`] clone is dropped or a write fails;
/// write failures are fatal to the session and reported to `serve`.
pub(crate) async fn write_loop<W: MessageSink>(
    mut sink: W,
    mut rx: mpsc::UnboundedReceiver<Message>,
) -> TransportResult<()> {
    while let Some(message) = rx.recv().await {
        sink.send(message).await?;
        trace!("outbound frame written");
    }
    Ok(())
}
