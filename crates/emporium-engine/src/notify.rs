//! # Event Delivery
//!
//! In-process implementations of the `EventNotifier` trait, plus the
//! per-store scope filter subscribers apply.
//!
//! ## Fan-Out
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                     BroadcastNotifier Fan-Out                        │
//! │                                                                      │
//! │  workflow ──publish──► broadcast::Sender ──┬──► subscriber (store A) │
//! │  (after commit)                            ├──► subscriber (store B) │
//! │                                            └──► subscriber (admin)   │
//! │                                                                      │
//! │  Each subscriber filters with can_observe(); admins see every        │
//! │  store, everyone else only their own.                                │
//! │                                                                      │
//! │  Delivery is best-effort: no subscribers and lagged receivers are    │
//! │  logged, never surfaced to the publishing workflow.                  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::broadcast;
use tracing::debug;

use emporium_core::policy::Actor;
use emporium_core::{DomainEvent, EventNotifier};

/// Default broadcast channel capacity. Slow subscribers past this depth
/// start losing the oldest events (broadcast semantics), which is
/// acceptable for best-effort notification delivery.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

// =============================================================================
// Broadcast Notifier
// =============================================================================

/// Fans committed domain events out to in-process subscribers over a tokio
/// broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<DomainEvent>,
}

impl BroadcastNotifier {
    /// Creates a notifier with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        BroadcastNotifier { tx }
    }

    /// Subscribes to the full event stream. Callers filter with
    /// [`can_observe`] for per-store delivery.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers (diagnostics).
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        BroadcastNotifier::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventNotifier for BroadcastNotifier {
    fn publish(&self, event: DomainEvent) {
        debug!(
            kind = event.kind(),
            store_id = event.store_id(),
            "Publishing domain event"
        );

        // send() only errors when there are no receivers; that is a normal
        // condition for best-effort delivery, not a failure.
        if self.tx.send(event).is_err() {
            debug!("No subscribers for domain event");
        }
    }
}

// =============================================================================
// Null Notifier
// =============================================================================

/// Drops every event. For tests and batch tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl EventNotifier for NullNotifier {
    fn publish(&self, _event: DomainEvent) {}
}

// =============================================================================
// Scope Filter
// =============================================================================

/// Whether an actor may observe an event: admins observe every store,
/// everyone else only events scoped to their own store.
pub fn can_observe(actor: &Actor, event: &DomainEvent) -> bool {
    actor.is_admin() || actor.belongs_to(event.store_id())
}

// =============================================================================
// Unit Tests
// =============================================================================
