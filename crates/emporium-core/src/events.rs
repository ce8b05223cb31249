//! # Domain Events
//!
//! Event payloads emitted by the workflows after a transaction commits, and
//! the `EventNotifier` trait the workflows publish through.
//!
//! ## Delivery Contract
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                     Event Delivery Contract                          │
//! │                                                                      │
//! │  Workflow                 Notifier                  Subscribers      │
//! │  ────────                 ────────                  ───────────      │
//! │  BEGIN                                                               │
//! │  ... writes ...                                                      │
//! │  COMMIT ─── only after commit ──► publish(event) ──► fan-out         │
//! │                                      │                               │
//! │                                      └── failure is logged, never    │
//! │                                          propagated to the caller    │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Events carry denormalized snapshots so consumers never need a follow-up
//! read, and a store id as routing scope for per-store delivery.

use serde::{Deserialize, Serialize};

use crate::types::{Order, OrderItem, Payment, Product, Store, User};

// =============================================================================
// Snapshots
// =============================================================================

/// An order together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// A payment together with its bound order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSnapshot {
    pub payment: Payment,
    pub order: Order,
}

/// One order line joined with the product it references. The product is
/// optional because it may have been soft-deleted since the order was taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub item: OrderItem,
    pub product: Option<Product>,
}

/// The full denormalized picture of a completed payment, for notification
/// consumers that render receipts without further reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCompletedSnapshot {
    pub payment: Payment,
    pub order: Order,
    pub lines: Vec<LineSnapshot>,
    pub cashier: Option<User>,
    pub store: Option<Store>,
}

// =============================================================================
// Domain Event
// =============================================================================

/// A committed state change, broadcast to interested parties.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    OrderCreated(OrderSnapshot),
    OrderUpdated(OrderSnapshot),
    OrderCancelled(OrderSnapshot),
    PaymentCreated(PaymentSnapshot),
    PaymentCompleted(PaymentCompletedSnapshot),
}

impl DomainEvent {
    /// Stable event kind label, matching the serialized `type` tag.
    pub const fn kind(&self) -> &'static str {
        match self {
            DomainEvent::OrderCreated(_) => "order_created",
            DomainEvent::OrderUpdated(_) => "order_updated",
            DomainEvent::OrderCancelled(_) => "order_cancelled",
            DomainEvent::PaymentCreated(_) => "payment_created",
            DomainEvent::PaymentCompleted(_) => "payment_completed",
        }
    }

    /// The owning store, used as routing scope for per-store delivery.
    pub fn store_id(&self) -> &str {
        match self {
            DomainEvent::OrderCreated(s)
            | DomainEvent::OrderUpdated(s)
            | DomainEvent::OrderCancelled(s) => &s.order.store_id,
            DomainEvent::PaymentCreated(s) => &s.payment.store_id,
            DomainEvent::PaymentCompleted(s) => &s.payment.store_id,
        }
    }
}

// =============================================================================
// Notifier Trait
// =============================================================================

/// Receives domain events for asynchronous delivery to interested parties.
///
/// Implementations MUST be non-blocking and infallible from the caller's
/// perspective: the workflows publish strictly after commit, and a delivery
/// problem is the implementation's to log, never the workflow's to handle.
pub trait EventNotifier: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderStatus, PaymentStatus};
    use chrono::Utc;

    fn order(store_id: &str) -> Order {
        Order {
            id: "o-1".to_string(),
            store_id: store_id.to_string(),
            seller_id: "u-seller".to_string(),
            cashier_id: None,
            order_number: "ORD-TEST0001".to_string(),
            customer_name: None,
            customer_phone: None,
            subtotal_cents: 1000,
            tax_cents: 0,
            discount_cents: 0,
            total_cents: 1000,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_event_kind_and_scope() {
        let event = DomainEvent::OrderCreated(OrderSnapshot {
            order: order("s-42"),
            items: vec![],
        });

        assert_eq!(event.kind(), "order_created");
        assert_eq!(event.store_id(), "s-42");
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = DomainEvent::OrderCancelled(OrderSnapshot {
            order: order("s-1"),
            items: vec![],
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "order_cancelled");
        assert_eq!(json["order"]["store_id"], "s-1");
    }
}
