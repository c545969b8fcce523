//! The reply-once capability for inbound calls.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, error, warn};
use turbolsp_protocol::{ErrorCode, RequestId, ResponseError};

use serde_json::Value;

use crate::writer::MessageWriter;

/// The capability to send the one reply for an inbound call.
///
/// Move-only: handlers receive it, may stash it in a closure or spawned task,
/// and must eventually invoke it exactly once. The contract is enforced at
/// runtime:
///
/// - a second invocation is logged and ignored;
/// - dropping the handle without replying synthesizes an
///   `InternalError("server failed to reply")` so the client is never wedged
///   waiting on a request the server forgot.
///
/// During endpoint teardown the destructor stays silent instead — the
/// legitimate case is a handle parked in an outbound-call continuation whose
/// client reply never arrived.
#[derive(Debug)]
pub struct ReplyOnce {
    id: RequestId,
    method: String,
    started_at: Instant,
    replied: AtomicBool,
    writer: MessageWriter,
    tearing_down: Arc<AtomicBool>,
}

impl ReplyOnce {
    pub(crate) fn new(
        id: RequestId,
        method: String,
        writer: MessageWriter,
        tearing_down: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            method,
            started_at: Instant::now(),
            replied: AtomicBool::new(false),
            writer,
            tearing_down,
        }
    }

    /// The id of the call this handle answers.
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// The method of the call this handle answers.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Reply with a result.
    pub fn ok(&self, result: Value) {
        self.finish(Ok(result));
    }

    /// Reply with an error.
    pub fn error(&self, error: ResponseError) {
        self.finish(Err(error));
    }

    /// Reply `RequestCancelled`; handlers that observed their cancellation
    /// token should use this.
    pub fn cancelled(&self) {
        self.finish(Err(ResponseError::new(
            ErrorCode::RequestCancelled,
            "request cancelled",
        )));
    }

    fn finish(&self, outcome: Result<Value, ResponseError>) {
        if self.replied.swap(true, Ordering::AcqRel) {
            warn!(method = %self.method, id = %self.id, "replied twice; ignoring second reply");
            return;
        }
        let elapsed = self.started_at.elapsed();
        match &outcome {
            Ok(result) => debug!(
                method = %self.method,
                id = %self.id,
                elapsed_ms = elapsed.as_millis() as u64,
                result = ?result,
                "request completed"
            ),
            Err(err) => debug!(
                method = %self.method,
                id = %self.id,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %err,
                "request failed"
            ),
        }
        self.writer.reply(self.id.clone(), outcome);
    }
}

impl Drop for ReplyOnce {
    fn drop(&mut self) {
        if self.replied.load(Ordering::Acquire) {
            return;
        }
        if self.tearing_down.load(Ordering::Acquire) {
            // Endpoint teardown: the frame is silently abandoned.
            return;
        }
        error!(method = %self.method, id = %self.id, "handler dropped without replying");
        self.writer.reply(
            self.id.clone(),
            Err(ResponseError::new(
                ErrorCode::InternalError,
                "server failed to reply",
            )),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use turbolsp_protocol::{Message, ResponsePayload};

    fn handle(
        id: i64,
        tearing_down: &Arc<AtomicBool>,
    ) -> (ReplyOnce, tokio::sync::mpsc::UnboundedReceiver<Message>) {
        let (writer, rx) = MessageWriter::channel();
        (
            ReplyOnce::new(
                RequestId::Number(id),
                "test/method".to_string(),
                writer,
                Arc::clone(tearing_down),
            ),
            rx,
        )
    }

    fn expect_reply(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Message>) -> ResponsePayload {
        match rx.try_recv().expect("expected a reply frame") {
            Message::Response(response) => response.payload,
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn test_single_reply_is_written() {
        let tearing_down = Arc::new(AtomicBool::new(false));
        let (reply, mut rx) = handle(1, &tearing_down);
        reply.ok(json!({"value": 42}));
        drop(reply);

        assert!(matches!(
            expect_reply(&mut rx),
            ResponsePayload::Result { .. }
        ));
        assert!(rx.try_recv().is_err(), "exactly one frame expected");
    }

    #[test]
    fn test_double_reply_is_ignored() {
        let tearing_down = Arc::new(AtomicBool::new(false));
        let (reply, mut rx) = handle(2, &tearing_down);
        reply.ok(json!(1));
        reply.ok(json!(2));
        drop(reply);

        match expect_reply(&mut rx) {
            ResponsePayload::Result { result } => assert_eq!(result, json!(1)),
            other => panic!("expected first result, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_drop_without_reply_synthesizes_internal_error() {
        let tearing_down = Arc::new(AtomicBool::new(false));
        let (reply, mut rx) = handle(3, &tearing_down);
        drop(reply);

        match expect_reply(&mut rx) {
            ResponsePayload::Error { error } => {
                assert_eq!(error.error_code(), ErrorCode::InternalError);
                assert_eq!(error.message, "server failed to reply");
            }
            other => panic!("expected synthesized error, got {other:?}"),
        }
    }

    #[test]
    fn test_drop_during_teardown_is_silent() {
        let tearing_down = Arc::new(AtomicBool::new(true));
        let (reply, mut rx) = handle(4, &tearing_down);
        drop(reply);
        assert!(rx.try_recv().is_err(), "teardown must abandon the frame");
    }

    #[test]
    fn test_cancelled_reply() {
        let tearing_down = Arc::new(AtomicBool::new(false));
        let (reply, mut rx) = handle(5, &tearing_down);
        reply.cancelled();
        drop(reply);

        match expect_reply(&mut rx) {
            ResponsePayload::Error { error } => {
                assert_eq!(error.error_code(), ErrorCode::RequestCancelled);
            }
            other => panic!("expected cancellation error, got {other:?}"),
        }
    }
}
