//! Per-client request supersession.
//!
//! A client that draws a new polygon while the previous one is still being
//! processed only cares about the newest result. [`RequestSupervisor::begin`]
//! cancels the client's in-flight request and hands out a fresh token.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct Slot {
    generation: u64,
    token: CancellationToken,
}

struct Inner {
    slots: DashMap<String, Slot>,
    next_generation: AtomicU64,
    root: CancellationToken,
}

/// Tracks the current request of each client.
///
/// Cloning shares the same table.
#[derive(Clone)]
pub struct RequestSupervisor {
    inner: Arc<Inner>,
}

impl Default for RequestSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestSupervisor {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: DashMap::new(),
                next_generation: AtomicU64::new(0),
                root: CancellationToken::new(),
            }),
        }
    }

    /// Starts a request for `client_id`, cancelling the previous one.
    pub fn begin(&self, client_id: &str) -> RequestTicket {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = self.inner.root.child_token();

        let previous = self.inner.slots.insert(
            client_id.to_string(),
            Slot {
                generation,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            debug!(client_id, "Superseding in-flight request");
            previous.token.cancel();
        }

        RequestTicket {
            supervisor: self.clone(),
            client_id: client_id.to_string(),
            generation,
            token,
        }
    }

    /// A token for a request with no client identity; only shutdown cancels it.
    pub fn untracked(&self) -> CancellationToken {
        self.inner.root.child_token()
    }

    /// Number of clients with a request in flight.
    pub fn active(&self) -> usize {
        self.inner.slots.len()
    }

    /// Cancels every in-flight request.
    pub fn shutdown(&self) {
        self.inner.root.cancel();
    }
}

/// Handle for one in-flight request.
///
/// Dropping it clears the client's slot unless a newer request took over.
pub struct RequestTicket {
    supervisor: RequestSupervisor,
    client_id: String,
    generation: u64,
    token: CancellationToken,
}

impl RequestTicket {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_superseded(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for RequestTicket {
    fn drop(&mut self) {
        let generation = self.generation;
        self.supervisor
            .inner
            .slots
            .remove_if(&self.client_id, |_, slot| slot.generation == generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_cancels_previous() {
        let supervisor = RequestSupervisor::new();
        let first = supervisor.begin("client-a");
        let second = supervisor.begin("client-a");

        assert!(first.is_superseded());
        assert!(!second.is_superseded());
        assert_eq!(supervisor.active(), 1);
    }

    #[test]
    fn test_clients_are_independent() {
        let supervisor = RequestSupervisor::new();
        let a = supervisor.begin("a");
        let b = supervisor.begin("b");

        assert!(!a.is_superseded());
        assert!(!b.is_superseded());
        assert_eq!(supervisor.active(), 2);
    }

    #[test]
    fn test_stale_ticket_drop_keeps_newer_slot() {
        let supervisor = RequestSupervisor::new();
        let first = supervisor.begin("a");
        let second = supervisor.begin("a");

        drop(first);
        assert_eq!(supervisor.active(), 1);

        drop(second);
        assert_eq!(supervisor.active(), 0);
    }

    #[test]
    fn test_shutdown_cancels_everything() {
        let supervisor = RequestSupervisor::new();
        let ticket = supervisor.begin("a");
        let anonymous = supervisor.untracked();

        supervisor.shutdown();
        assert!(ticket.is_superseded());
        assert!(anonymous.is_cancelled());
    }
}
