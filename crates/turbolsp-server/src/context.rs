//! Per-message ambient values.
//!
//! Every envelope is dispatched under a fresh [`RequestContext`] carrying the
//! negotiated offset encoding, a cancellation token (calls only), and a trace
//! span keyed by method name. Contexts are cheap to clone and are captured by
//! any concurrent work a handler spawns; the cancel-registry entry for a call
//! lives exactly as long as the last clone of its context.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Span;
use turbolsp_protocol::OffsetEncoding;

use crate::cancel::CancelGuard;

/// Ambient values for one dispatched message.
#[derive(Clone)]
pub struct RequestContext {
    method: Arc<str>,
    offset_encoding: OffsetEncoding,
    cancel: Option<CancellationToken>,
    span: Span,
    // Shared by all clones; the registry entry is reaped when the last clone
    // of the handler context drops.
    _cancel_guard: Option<Arc<CancelGuard>>,
}

impl RequestContext {
    pub(crate) fn for_call(
        method: &str,
        offset_encoding: OffsetEncoding,
        cancel: CancellationToken,
        guard: CancelGuard,
        span: Span,
    ) -> Self {
        Self {
            method: Arc::from(method),
            offset_encoding,
            cancel: Some(cancel),
            span,
            _cancel_guard: Some(Arc::new(guard)),
        }
    }

    pub(crate) fn for_notification(
        method: &str,
        offset_encoding: OffsetEncoding,
        span: Span,
    ) -> Self {
        Self {
            method: Arc::from(method),
            offset_encoding,
            cancel: None,
            span,
            _cancel_guard: None,
        }
    }

    /// The method this context was created for.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The offset encoding negotiated with the client.
    pub fn offset_encoding(&self) -> OffsetEncoding {
        self.offset_encoding
    }

    /// The cancellation token, present for calls only.
    pub fn cancellation_token(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// True if the client cancelled this call.
    ///
    /// Cancellation is cooperative: handlers check this (or await
    /// [`cancelled`](Self::cancelled)) at their own suspension points.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Resolves when the client cancels this call; pends forever for
    /// notifications.
    pub async fn cancelled(&self) {
        match &self.cancel {
            Some(token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    }

    /// The trace span for this message.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Derive a context for a sub-operation: same ambient values, child span.
    pub fn child(&self, operation: &str) -> Self {
        let mut derived = self.clone();
        derived.span = tracing::debug_span!(parent: &self.span, "sub_operation", operation);
        derived
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("offset_encoding", &self.offset_encoding)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}
