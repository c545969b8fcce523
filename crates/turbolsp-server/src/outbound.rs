//! Server-to-client calls awaiting replies.
//!
//! The registry is a bounded FIFO: continuations are stored in arrival order
//! and the oldest is evicted when the bound is exceeded, so a client that
//! never answers cannot grow server memory without limit. The population is
//! small (bounded by the cap), so `claim` is a linear scan — do not "improve"
//! this to a hash map, FIFO eviction order is part of the contract.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::warn;
use turbolsp_protocol::{ErrorCode, ResponseError};

use serde_json::Value;

/// Invoked with the client's reply, or with an error if the call was evicted
/// or the endpoint shut down first.
pub type Continuation = Box<dyn FnOnce(Result<Value, ResponseError>) + Send + 'static>;

struct OutboundEntry {
    id: i64,
    continuation: Continuation,
}

struct OutboundInner {
    next_id: i64,
    pending: VecDeque<OutboundEntry>,
}

/// Tracks server-originated calls until the client replies.
pub struct OutboundRegistry {
    inner: Mutex<OutboundInner>,
    max_in_flight: usize,
}

impl OutboundRegistry {
    /// Create a registry bounded at `max_in_flight` pending calls.
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            inner: Mutex::new(OutboundInner {
                next_id: 0,
                pending: VecDeque::new(),
            }),
            max_in_flight,
        }
    }

    /// Store a continuation and allocate the id to send with the call.
    ///
    /// If the registry is over its bound afterwards, the oldest entry is
    /// evicted and — outside the lock — its continuation receives an error
    /// naming the request that went unanswered.
    pub fn register(&self, continuation: Continuation) -> i64 {
        let (id, evicted) = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.pending.push_back(OutboundEntry { id, continuation });
            let evicted = if inner.pending.len() > self.max_in_flight {
                inner.pending.pop_front()
            } else {
                None
            };
            (id, evicted)
        };

        if let Some(entry) = evicted {
            warn!(id = entry.id, "evicting pending client-bound call");
            (entry.continuation)(Err(ResponseError::new(
                ErrorCode::InternalError,
                format!(
                    "failed to receive a client reply for request ({})",
                    entry.id
                ),
            )));
        }
        id
    }

    /// Remove and return the continuation for a reply that just arrived.
    ///
    /// Scans from the head; returns `None` for unknown ids (already evicted,
    /// already claimed, or never issued).
    pub fn claim(&self, id: i64) -> Option<Continuation> {
        let mut inner = self.inner.lock();
        let index = inner.pending.iter().position(|entry| entry.id == id)?;
        inner.pending.remove(index).map(|entry| entry.continuation)
    }

    /// Number of calls awaiting replies.
    pub fn len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// True if nothing is awaiting a reply.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_register_allocates_sequential_ids() {
        let registry = OutboundRegistry::new(10);
        assert_eq!(registry.register(Box::new(|_| {})), 0);
        assert_eq!(registry.register(Box::new(|_| {})), 1);
        assert_eq!(registry.register(Box::new(|_| {})), 2);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_claim_removes_matching_entry() {
        let registry = OutboundRegistry::new(10);
        let delivered = Arc::new(AtomicUsize::new(0));

        let id = {
            let delivered = Arc::clone(&delivered);
            registry.register(Box::new(move |outcome| {
                assert!(outcome.is_ok());
                delivered.fetch_add(1, Ordering::SeqCst);
            }))
        };

        let continuation = registry.claim(id).expect("entry should exist");
        continuation(Ok(serde_json::json!("reply")));
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
        assert!(registry.claim(id).is_none(), "claim is one-shot");
    }

    #[test]
    fn test_overflow_evicts_oldest_with_error() {
        let registry = OutboundRegistry::new(2);
        let evicted = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..3 {
            let evicted = Arc::clone(&evicted);
            registry.register(Box::new(move |outcome| {
                evicted.lock().push(outcome);
            }));
        }

        assert_eq!(registry.len(), 2, "bound must hold after eviction");
        let outcomes = evicted.lock();
        assert_eq!(outcomes.len(), 1, "exactly the oldest was evicted");
        let err = outcomes[0].as_ref().unwrap_err();
        assert!(
            err.message
                .contains("failed to receive a client reply for request (0)"),
            "unexpected message: {}",
            err.message
        );
    }

    #[test]
    fn test_claim_after_eviction_misses() {
        let registry = OutboundRegistry::new(1);
        registry.register(Box::new(|_| {}));
        registry.register(Box::new(|_| {}));
        assert!(registry.claim(0).is_none(), "evicted id must not be claimable");
        assert!(registry.claim(1).is_some());
    }
}
