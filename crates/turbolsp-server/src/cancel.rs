//! Client-driven cancellation of inbound calls.
//!
//! Each inbound call registers a fresh [`CancellationToken`] under its
//! stringified id. Clients are allowed to reuse ids: the later registration
//! overwrites the earlier, which makes the earlier call uncancellable from
//! the client's side (it still runs to completion). To keep cleanup correct
//! under reuse, every registration also gets a cookie, and the drop-guard
//! erases the entry only while the cookie still matches — a finished
//! predecessor must not wipe out its successor's entry.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use turbolsp_protocol::RequestId;

struct CancelEntry {
    token: CancellationToken,
    cookie: u32,
}

#[derive(Default)]
struct CancelInner {
    entries: HashMap<String, CancelEntry>,
    next_cookie: u32,
}

/// Maps in-flight inbound call ids to their cancel signals.
#[derive(Default)]
pub struct CancelRegistry {
    inner: Mutex<CancelInner>,
}

impl CancelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh cancel signal for an inbound call.
    ///
    /// Returns the token handlers observe and a guard that erases the entry
    /// when the handler context exits. An existing entry under the same id is
    /// overwritten.
    pub fn register(self: &Arc<Self>, id: &RequestId) -> (CancellationToken, CancelGuard) {
        let key = id.to_string();
        let token = CancellationToken::new();
        let cookie = {
            let mut inner = self.inner.lock();
            let cookie = inner.next_cookie;
            inner.next_cookie = inner.next_cookie.wrapping_add(1);
            inner.entries.insert(
                key.clone(),
                CancelEntry {
                    token: token.clone(),
                    cookie,
                },
            );
            cookie
        };
        let guard = CancelGuard {
            registry: Arc::clone(self),
            key,
            cookie,
        };
        (token, guard)
    }

    /// Fire the cancel signal for an id, if it is still in flight.
    ///
    /// The signal is idempotent; cancelling a completed (and reaped) request
    /// is a no-op.
    pub fn cancel(&self, id: &RequestId) {
        let key = id.to_string();
        let inner = self.inner.lock();
        match inner.entries.get(&key) {
            Some(entry) => entry.token.cancel(),
            None => debug!(id = %id, "cancel for unknown request; ignoring"),
        }
    }

    /// Number of in-flight entries (test introspection).
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// True if no calls are in flight.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Erases a registration when the handler context exits.
///
/// The erase only happens while the guard's cookie matches the live entry,
/// so a predecessor finishing late cannot remove its successor.
pub struct CancelGuard {
    registry: Arc<CancelRegistry>,
    key: String,
    cookie: u32,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        let mut inner = self.registry.inner.lock();
        if let Some(entry) = inner.entries.get(&self.key)
            && entry.cookie == self.cookie
        {
            inner.entries.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_fires_registered_token() {
        let registry = Arc::new(CancelRegistry::new());
        let (token, _guard) = registry.register(&RequestId::Number(1));
        assert!(!token.is_cancelled());

        registry.cancel(&RequestId::Number(1));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_unknown_id_is_noop() {
        let registry = Arc::new(CancelRegistry::new());
        registry.cancel(&RequestId::Number(404));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_guard_erases_entry() {
        let registry = Arc::new(CancelRegistry::new());
        let (_token, guard) = registry.register(&RequestId::Number(1));
        assert_eq!(registry.len(), 1);
        drop(guard);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_id_reuse_cancels_only_the_later_registration() {
        let registry = Arc::new(CancelRegistry::new());
        let (first_token, _first_guard) = registry.register(&RequestId::Number(5));
        let (second_token, _second_guard) = registry.register(&RequestId::Number(5));

        registry.cancel(&RequestId::Number(5));
        assert!(!first_token.is_cancelled(), "earlier call must stay uncancellable");
        assert!(second_token.is_cancelled());
    }

    #[test]
    fn test_stale_guard_does_not_erase_successor() {
        let registry = Arc::new(CancelRegistry::new());
        let (_first_token, first_guard) = registry.register(&RequestId::Number(5));
        let (second_token, _second_guard) = registry.register(&RequestId::Number(5));

        // Predecessor finishes late; its guard must leave the live entry alone.
        drop(first_guard);
        assert_eq!(registry.len(), 1);

        registry.cancel(&RequestId::Number(5));
        assert!(second_token.is_cancelled());
    }

    #[test]
    fn test_string_and_number_ids_do_not_collide_with_themselves() {
        // Stringified keys: "7" (number) and "7" (string) intentionally map
        // to the same slot, matching the wire-level reuse semantics.
        let registry = Arc::new(CancelRegistry::new());
        let (number_token, _g1) = registry.register(&RequestId::Number(7));
        let (string_token, _g2) = registry.register(&RequestId::from("7"));

        registry.cancel(&RequestId::Number(7));
        assert!(!number_token.is_cancelled());
        assert!(string_token.is_cancelled());
    }
}
