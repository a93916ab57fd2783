//! Correlation registry for in-flight calls.
//!
//! Maps an outstanding request's `MessageId` to a take-once completion
//! slot. The slot leaves the map before it is completed, so a timeout, a
//! late response, and a disconnect can race over the same entry and the
//! losers find nothing left to settle: every call reaches exactly one
//! terminal state.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;

use crate::error::{Result, WardenError};
use crate::protocol::Response;

type Slot = oneshot::Sender<Result<Response>>;

/// Pending calls keyed by the originating request's `MessageId`.
///
/// Responses may arrive in any order relative to their requests; dispatch
/// is strictly by id, never by arrival sequence.
#[derive(Default)]
pub struct PendingRegistry {
    entries: Mutex<HashMap<String, Slot>>,
}

impl PendingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh entry and hand back the receiver the caller awaits.
    pub fn register(&self, id: &str) -> oneshot::Receiver<Result<Response>> {
        let (tx, rx) = oneshot::channel();
        self.lock().insert(id.to_string(), tx);
        rx
    }

    /// Complete the entry for `id`, if one is still pending.
    ///
    /// Returns whether an entry existed. A response whose `RequestId`
    /// matches nothing is the caller's cue to drop it.
    pub fn resolve(&self, id: &str, response: Response) -> bool {
        match self.lock().remove(id) {
            Some(slot) => {
                // The caller may have stopped waiting in between.
                let _ = slot.send(Ok(response));
                true
            }
            None => false,
        }
    }

    /// Drop an entry without completing it.
    ///
    /// Used by the timeout and write-failure paths. Returns whether an
    /// entry existed.
    pub fn remove(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Reject every pending entry with a connection-closed error and
    /// leave the registry empty.
    pub fn reject_all(&self) {
        let drained: Vec<Slot> = self.lock().drain().map(|(_, slot)| slot).collect();
        for slot in drained {
            let _ = slot.send(Err(WardenError::ConnectionClosed));
        }
    }

    /// Number of calls still awaiting a response.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.entries.lock().expect("pending registry mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_resolve_completes_waiter() {
        let registry = PendingRegistry::new();
        let rx = registry.register("a");

        assert!(registry.resolve("a", Response::ok("a", None)));

        let response = rx.await.unwrap().unwrap();
        assert_eq!(response.request_id, "a");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolve_unknown_id_is_noop() {
        let registry = PendingRegistry::new();
        let _rx = registry.register("a");

        assert!(!registry.resolve("b", Response::ok("b", None)));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_order_resolution_matches_by_id() {
        let registry = PendingRegistry::new();
        let rx_a = registry.register("a");
        let rx_b = registry.register("b");
        let rx_c = registry.register("c");

        // Deliver in reverse order.
        assert!(registry.resolve("c", Response::ok("c", None)));
        assert!(registry.resolve("a", Response::ok("a", None)));
        assert!(registry.resolve("b", Response::ok("b", None)));

        assert_eq!(rx_a.await.unwrap().unwrap().request_id, "a");
        assert_eq!(rx_b.await.unwrap().unwrap().request_id, "b");
        assert_eq!(rx_c.await.unwrap().unwrap().request_id, "c");
    }

    #[test]
    fn test_remove_then_resolve_is_noop() {
        let registry = PendingRegistry::new();
        let _rx = registry.register("a");

        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert!(!registry.resolve("a", Response::ok("a", None)));
    }

    #[tokio::test]
    async fn test_reject_all_broadcasts_and_empties() {
        let registry = PendingRegistry::new();
        let receivers: Vec<_> = (0..5)
            .map(|i| registry.register(&format!("id-{}", i)))
            .collect();

        registry.reject_all();

        assert!(registry.is_empty());
        for rx in receivers {
            let outcome = rx.await.unwrap();
            assert!(matches!(outcome, Err(WardenError::ConnectionClosed)));
        }
    }

    /// A call that times out and whose response arrives later must not
    /// settle twice, and vice versa.
    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_late_response_single_terminal_state() {
        let registry = PendingRegistry::new();
        let rx = registry.register("a");

        // Caller-side timeout path: the timer fires, the entry is removed.
        let outcome = tokio::time::timeout(Duration::from_secs(30), rx).await;
        assert!(outcome.is_err());
        assert!(registry.remove("a"));

        // The response arriving afterwards finds nothing to resolve.
        assert!(!registry.resolve("a", Response::ok("a", None)));

        // A fresh call with the registry in this state still works.
        let rx = registry.register("b");
        assert!(registry.resolve("b", Response::ok("b", None)));
        assert_eq!(rx.await.unwrap().unwrap().request_id, "b");
    }
}
