//! Property tests for the two request registries.
//!
//! The bounded outbound registry must never exceed its cap and must deliver
//! exactly one eviction error per evicted continuation, in FIFO order; the
//! cancellation registry must keep id-reuse semantics (only the latest
//! registration is cancellable, stale cleanups never remove a successor).

use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use turbolsp_protocol::{RequestId, ResponseError};
use turbolsp_server::{CancelRegistry, OutboundRegistry};

type Outcomes = Arc<Mutex<Vec<Result<serde_json::Value, ResponseError>>>>;

proptest! {
    #[test]
    fn outbound_bound_holds_and_evicts_fifo(
        max in 1usize..8,
        registrations in 1usize..50,
    ) {
        let registry = OutboundRegistry::new(max);
        let evicted: Outcomes = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..registrations {
            let evicted = Arc::clone(&evicted);
            registry.register(Box::new(move |outcome| {
                evicted.lock().unwrap().push(outcome);
            }));
            prop_assert!(registry.len() <= max);
        }

        let outcomes = evicted.lock().unwrap();
        prop_assert_eq!(outcomes.len(), registrations.saturating_sub(max));

        // Evictions happen oldest-first, and each names its own request id.
        for (index, outcome) in outcomes.iter().enumerate() {
            let error = outcome.as_ref().expect_err("evictions deliver errors");
            prop_assert!(
                error.message.contains(&format!("request ({index})")),
                "eviction {} carried message {:?}",
                index,
                error.message
            );
        }
    }

    #[test]
    fn outbound_register_claim_interleavings(ops in vec(any::<bool>(), 1..60)) {
        const MAX: usize = 4;
        let registry = OutboundRegistry::new(MAX);
        let mut live: VecDeque<i64> = VecDeque::new();
        let mut next_id = 0i64;

        for register in ops {
            if register {
                let id = registry.register(Box::new(|_| {}));
                prop_assert_eq!(id, next_id, "ids are allocated monotonically");
                next_id += 1;
                live.push_back(id);
                if live.len() > MAX {
                    live.pop_front();
                }
            } else if let Some(id) = live.pop_front() {
                prop_assert!(registry.claim(id).is_some());
                prop_assert!(registry.claim(id).is_none(), "claim is one-shot");
            }
            prop_assert!(registry.len() <= MAX);
            prop_assert_eq!(registry.len(), live.len());
        }
    }

    #[test]
    fn cancel_only_hits_the_latest_registration(registrations in 1usize..6) {
        let registry = Arc::new(CancelRegistry::new());
        let id = RequestId::Number(1);

        let mut handles = Vec::new();
        for _ in 0..registrations {
            handles.push(registry.register(&id));
        }

        registry.cancel(&id);
        for (index, (token, _guard)) in handles.iter().enumerate() {
            prop_assert_eq!(
                token.is_cancelled(),
                index == registrations - 1,
                "only the latest registration may observe the signal"
            );
        }

        // Predecessors finishing late must not reap the live entry.
        let last = handles.pop().expect("at least one registration");
        drop(handles);
        prop_assert_eq!(registry.len(), 1);
        drop(last);
        prop_assert!(registry.is_empty());
    }
}
