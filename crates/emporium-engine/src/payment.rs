//! # Payment Workflow
//!
//! Creates payments bound to pending orders, transitions payment status and
//! on completion drives the bound order to completed in the same
//! transaction.
//!
//! ## State Machine
//! ```text
//! pending ──► completed ──► refunded
//!    │
//!    └──────► failed
//! ```
//!
//! ## Order Coupling
//! ```text
//! create_payment:    payment(pending) inserted  +  order → processing
//! complete_payment:  payment → completed        +  order → completed/paid
//!
//! Each pair commits as ONE transaction; no reader ever observes a
//! completed payment on an unpaid order.
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use emporium_core::events::{LineSnapshot, PaymentCompletedSnapshot, PaymentSnapshot};
use emporium_core::policy::{self, Actor};
use emporium_core::validation::{validate_amount_cents, validate_transaction_reference};
use emporium_core::{
    CoreError, DomainEvent, EventNotifier, OrderStatus, Payment, PaymentMethod, PaymentState,
    INVOICE_NUMBER_PREFIX,
};
use emporium_db::repository::{generate_id, generate_reference, payment as payment_repo};
use emporium_db::{Database, DbError};

use crate::error::{EngineError, EngineResult};
use crate::order::OrderWorkflow;

// =============================================================================
// Boundary DTOs
// =============================================================================

/// Input to `create_payment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: String,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub transaction_reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input to `update_payment`. Fields left as `None` are not touched.
///
/// Status is deliberately absent: transitions go exclusively through
/// `complete_payment`, `fail_payment` and `refund_payment`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentPatch {
    pub amount_cents: Option<i64>,
    pub payment_method: Option<PaymentMethod>,
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Workflow
// =============================================================================

/// Payment lifecycle workflow.
#[derive(Clone)]
pub struct PaymentWorkflow {
    db: Database,
    notifier: Arc<dyn EventNotifier>,
}

impl PaymentWorkflow {
    /// Creates a new PaymentWorkflow publishing to the given notifier.
    pub fn new(db: Database, notifier: Arc<dyn EventNotifier>) -> Self {
        PaymentWorkflow { db, notifier }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Records a payment against a pending order.
    ///
    /// ## Flow
    /// 1. Policy: cashier role, store scope of the bound order
    /// 2. `OrderNotPending` unless the order is pending
    /// 3. One transaction: order → processing with the cashier assigned
    ///    (guarded, so a concurrent payment loses cleanly), payment inserted
    ///    as pending with a fresh invoice number
    /// 4. Publish `PaymentCreated` after commit
    pub async fn create_payment(
        &self,
        actor: &Actor,
        req: CreatePaymentRequest,
    ) -> EngineResult<PaymentSnapshot> {
        policy::require_cashier(actor)?;

        let order = self
            .db
            .orders()
            .get_by_id(&req.order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", &req.order_id))?;

        policy::require_store_access(actor, &order.store_id)?;

        validate_amount_cents(req.amount_cents)?;
        validate_transaction_reference(&req.transaction_reference)?;

        if order.status != OrderStatus::Pending {
            return Err(CoreError::OrderNotPending {
                order_id: order.id,
                status: order.status.as_str().to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let payment = Payment {
            id: generate_id(),
            order_id: order.id.clone(),
            store_id: order.store_id.clone(),
            cashier_id: actor.user_id.clone(),
            invoice_number: generate_reference(INVOICE_NUMBER_PREFIX),
            amount_cents: req.amount_cents,
            payment_method: req.payment_method,
            transaction_reference: req.transaction_reference,
            status: PaymentState::Pending,
            notes: req.notes,
            created_at: now,
            updated_at: now,
            paid_at: None,
        };

        debug!(
            payment_id = %payment.id,
            invoice_number = %payment.invoice_number,
            order_id = %order.id,
            "Creating payment"
        );

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let rows =
            emporium_db::repository::order::mark_processing(&mut tx, &order.id, &actor.user_id)
                .await?;
        if rows == 0 {
            // The order left pending between the read and the write.
            let status = emporium_db::repository::order::get_for_update(&mut tx, &order.id)
                .await?
                .map(|o| o.status.as_str().to_string())
                .unwrap_or_else(|| "missing".to_string());
            return Err(CoreError::OrderNotPending {
                order_id: order.id,
                status,
            }
            .into());
        }

        payment_repo::insert_payment(&mut tx, &payment).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            payment_id = %payment.id,
            invoice_number = %payment.invoice_number,
            amount_cents = payment.amount_cents,
            "Payment created, order processing"
        );

        let order = self
            .db
            .orders()
            .get_by_id(&payment.order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", &payment.order_id))?;

        let snapshot = PaymentSnapshot {
            payment,
            order,
        };
        self.notifier
            .publish(DomainEvent::PaymentCreated(snapshot.clone()));

        Ok(snapshot)
    }

    // =========================================================================
    // Complete
    // =========================================================================

    /// Completes a pending payment and drives the bound order to
    /// completed/paid in the same transaction.
    ///
    /// Publishes `PaymentCompleted` with a fully denormalized snapshot
    /// (payment, order, items with products, cashier, store).
    pub async fn complete_payment(
        &self,
        actor: &Actor,
        payment_id: &str,
    ) -> EngineResult<PaymentCompletedSnapshot> {
        policy::require_cashier(actor)?;

        let payment = self
            .db
            .payments()
            .get_by_id(payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", payment_id))?;

        policy::require_store_access(actor, &payment.store_id)?;

        if payment.status != PaymentState::Pending {
            return Err(CoreError::PaymentNotPending {
                payment_id: payment_id.to_string(),
                status: payment.status.as_str().to_string(),
            }
            .into());
        }

        let now = Utc::now();

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let rows = payment_repo::mark_completed(&mut tx, payment_id, now).await?;
        if rows == 0 {
            let status = payment_repo::get_for_update(&mut tx, payment_id)
                .await?
                .map(|p| p.status.as_str().to_string())
                .unwrap_or_else(|| "missing".to_string());
            return Err(CoreError::PaymentNotPending {
                payment_id: payment_id.to_string(),
                status,
            }
            .into());
        }

        let order =
            OrderWorkflow::transition_to_completed(&mut tx, &payment.order_id, &actor.user_id, now)
                .await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            payment_id = %payment_id,
            order_id = %order.id,
            "Payment completed, order settled"
        );

        let snapshot = self.completed_snapshot(payment_id, order).await?;
        self.notifier
            .publish(DomainEvent::PaymentCompleted(snapshot.clone()));

        Ok(snapshot)
    }

    /// Marks a pending payment failed.
    ///
    /// The order stays processing; re-opening it for another attempt is an
    /// operator action through the order workflow.
    pub async fn fail_payment(&self, actor: &Actor, payment_id: &str) -> EngineResult<Payment> {
        policy::require_cashier(actor)?;

        let payment = self
            .db
            .payments()
            .get_by_id(payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", payment_id))?;

        policy::require_store_access(actor, &payment.store_id)?;

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let rows = payment_repo::mark_failed(&mut tx, payment_id).await?;
        if rows == 0 {
            return Err(CoreError::PaymentNotPending {
                payment_id: payment_id.to_string(),
                status: payment.status.as_str().to_string(),
            }
            .into());
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(payment_id = %payment_id, "Payment failed");
        self.reload(payment_id).await
    }

    /// Refunds a completed payment. Admin only; money state only, no
    /// inventory or order reversal.
    pub async fn refund_payment(&self, actor: &Actor, payment_id: &str) -> EngineResult<Payment> {
        policy::require_admin(actor)?;

        let payment = self
            .db
            .payments()
            .get_by_id(payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", payment_id))?;

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let rows = payment_repo::mark_refunded(&mut tx, payment_id).await?;
        if rows == 0 {
            return Err(CoreError::PaymentNotPending {
                payment_id: payment_id.to_string(),
                status: payment.status.as_str().to_string(),
            }
            .into());
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(payment_id = %payment_id, "Payment refunded");
        self.reload(payment_id).await
    }

    // =========================================================================
    // Update / Delete
    // =========================================================================

    /// Patches a payment's detail fields (amount, method, reference, notes).
    pub async fn update_payment(
        &self,
        actor: &Actor,
        payment_id: &str,
        patch: PaymentPatch,
    ) -> EngineResult<Payment> {
        let payment = self
            .db
            .payments()
            .get_by_id(payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", payment_id))?;

        policy::require_store_access(actor, &payment.store_id)?;

        if let Some(amount) = patch.amount_cents {
            validate_amount_cents(amount)?;
        }
        validate_transaction_reference(&patch.transaction_reference)?;

        let mut updated = payment;
        if let Some(amount) = patch.amount_cents {
            updated.amount_cents = amount;
        }
        if let Some(method) = patch.payment_method {
            updated.payment_method = method;
        }
        if let Some(reference) = patch.transaction_reference {
            updated.transaction_reference = Some(reference);
        }
        if let Some(notes) = patch.notes {
            updated.notes = Some(notes);
        }

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
        payment_repo::update_details(&mut tx, &updated).await?;
        tx.commit().await.map_err(DbError::from)?;

        debug!(payment_id = %payment_id, "Payment updated");
        self.reload(payment_id).await
    }

    /// Deletes a payment. Completed payments are immutable.
    pub async fn delete_payment(&self, actor: &Actor, payment_id: &str) -> EngineResult<()> {
        let payment = self
            .db
            .payments()
            .get_by_id(payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", payment_id))?;

        policy::require_store_access(actor, &payment.store_id)?;

        if payment.status == PaymentState::Completed {
            return Err(CoreError::PaymentImmutable {
                payment_id: payment_id.to_string(),
            }
            .into());
        }

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
        let rows = payment_repo::delete_payment(&mut tx, payment_id).await?;
        if rows == 0 {
            return Err(CoreError::not_found("Payment", payment_id).into());
        }
        tx.commit().await.map_err(DbError::from)?;

        info!(payment_id = %payment_id, "Payment deleted");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a payment, store-scoped.
    pub async fn get_payment(&self, actor: &Actor, payment_id: &str) -> EngineResult<Payment> {
        let payment = self
            .db
            .payments()
            .get_by_id(payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", payment_id))?;

        policy::require_store_access(actor, &payment.store_id)?;
        Ok(payment)
    }

    /// Lists payments of one store, newest first.
    pub async fn list_payments(
        &self,
        actor: &Actor,
        store_id: &str,
        status: Option<PaymentState>,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
        limit: u32,
    ) -> EngineResult<Vec<Payment>> {
        policy::require_store_access(actor, store_id)?;

        let payments = self
            .db
            .payments()
            .list_for_store(store_id, status, date_from, date_to, limit)
            .await?;
        Ok(payments)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn reload(&self, payment_id: &str) -> EngineResult<Payment> {
        self.db
            .payments()
            .get_by_id(payment_id)
            .await?
            .ok_or_else(|| EngineError::from(CoreError::not_found("Payment", payment_id)))
    }

    /// Assembles the denormalized snapshot published with
    /// `PaymentCompleted`.
    async fn completed_snapshot(
        &self,
        payment_id: &str,
        order: emporium_core::Order,
    ) -> EngineResult<PaymentCompletedSnapshot> {
        let payment = self.reload(payment_id).await?;

        let items = self.db.orders().get_items(&order.id).await?;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = self.db.products().get_by_id(&item.product_id).await?;
            lines.push(LineSnapshot { item, product });
        }

        let cashier = self.db.users().get_by_id(&payment.cashier_id).await?;
        let store = self.db.stores().get_by_id(&payment.store_id).await?;

        Ok(PaymentCompletedSnapshot {
            payment,
            order,
            lines,
            cashier,
            store,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NullNotifier;
    use crate::order::{CreateOrderRequest, OrderLine, OrderWorkflow};
    use crate::testutil::{fixture, seed_product, Fixture};
    use emporium_core::events::OrderSnapshot;
    use emporium_core::PaymentStatus;

    fn workflows(db: &Database) -> (OrderWorkflow, PaymentWorkflow) {
        let notifier: Arc<dyn EventNotifier> = Arc::new(NullNotifier);
        (
            OrderWorkflow::new(db.clone(), notifier.clone()),
            PaymentWorkflow::new(db.clone(), notifier),
        )
    }

    async fn seed_order(fx: &Fixture, orders: &OrderWorkflow, total: i64) -> OrderSnapshot {
        let product = seed_product(
            &fx.db,
            &fx.store.id,
            &fx.category.id,
            &format!("PAY-{}", generate_id()[..6].to_uppercase()),
            total,
            10,
        )
        .await;

        orders
            .create_order(
                &fx.seller,
                CreateOrderRequest {
                    store_id: fx.store.id.clone(),
                    items: vec![OrderLine {
                        product_id: product.id,
                        quantity: 1,
                    }],
                    customer_name: None,
                    customer_phone: None,
                    tax_cents: 0,
                    discount_cents: 0,
                    notes: None,
                },
            )
            .await
            .unwrap()
    }

    fn payment_request(order_id: &str, amount_cents: i64) -> CreatePaymentRequest {
        CreatePaymentRequest {
            order_id: order_id.to_string(),
            amount_cents,
            payment_method: PaymentMethod::Cash,
            transaction_reference: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_payment_moves_order_to_processing() {
        let fx = fixture().await;
        let (orders, payments) = workflows(&fx.db);
        let order = seed_order(&fx, &orders, 2500).await.order;

        let snapshot = payments
            .create_payment(&fx.cashier, payment_request(&order.id, 2500))
            .await
            .unwrap();

        assert_eq!(snapshot.payment.status, PaymentState::Pending);
        assert!(snapshot.payment.invoice_number.starts_with("INV-"));
        assert_eq!(snapshot.order.status, OrderStatus::Processing);
        assert_eq!(
            snapshot.order.cashier_id.as_deref(),
            Some(fx.cashier.user_id.as_str())
        );
    }

    #[tokio::test]
    async fn test_create_payment_requires_pending_order() {
        let fx = fixture().await;
        let (orders, payments) = workflows(&fx.db);
        let order = seed_order(&fx, &orders, 2500).await.order;

        payments
            .create_payment(&fx.cashier, payment_request(&order.id, 2500))
            .await
            .unwrap();

        // A second payment hits a processing order.
        let err = payments
            .create_payment(&fx.cashier, payment_request(&order.id, 2500))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::OrderNotPending { .. })
        ));
    }

    #[tokio::test]
    async fn test_complete_payment_settles_order_atomically() {
        let fx = fixture().await;
        let (orders, payments) = workflows(&fx.db);
        let order = seed_order(&fx, &orders, 2500).await.order;

        let created = payments
            .create_payment(&fx.cashier, payment_request(&order.id, 2500))
            .await
            .unwrap();

        let snapshot = payments
            .complete_payment(&fx.cashier, &created.payment.id)
            .await
            .unwrap();

        assert_eq!(snapshot.payment.status, PaymentState::Completed);
        assert!(snapshot.payment.paid_at.is_some());
        assert_eq!(snapshot.order.status, OrderStatus::Completed);
        assert_eq!(snapshot.order.payment_status, PaymentStatus::Paid);
        assert!(snapshot.order.completed_at.is_some());

        // Denormalized payload: lines join products, cashier and store ride
        // along for notification consumers.
        assert_eq!(snapshot.lines.len(), 1);
        assert!(snapshot.lines[0].product.is_some());
        assert!(snapshot.cashier.is_some());
        assert!(snapshot.store.is_some());

        // Completing twice fails.
        let err = payments
            .complete_payment(&fx.cashier, &created.payment.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::PaymentNotPending { .. })
        ));
    }

    #[tokio::test]
    async fn test_complete_payment_policy() {
        let fx = fixture().await;
        let (orders, payments) = workflows(&fx.db);
        let order = seed_order(&fx, &orders, 1000).await.order;
        let created = payments
            .create_payment(&fx.cashier, payment_request(&order.id, 1000))
            .await
            .unwrap();

        // Sellers cannot complete payments.
        let err = payments
            .complete_payment(&fx.seller, &created.payment.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_fail_payment_leaves_order_processing() {
        let fx = fixture().await;
        let (orders, payments) = workflows(&fx.db);
        let order = seed_order(&fx, &orders, 1000).await.order;
        let created = payments
            .create_payment(&fx.cashier, payment_request(&order.id, 1000))
            .await
            .unwrap();

        let failed = payments
            .fail_payment(&fx.cashier, &created.payment.id)
            .await
            .unwrap();
        assert_eq!(failed.status, PaymentState::Failed);

        let order = fx.db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_refund_requires_admin_and_completed() {
        let fx = fixture().await;
        let (orders, payments) = workflows(&fx.db);
        let order = seed_order(&fx, &orders, 1000).await.order;
        let created = payments
            .create_payment(&fx.cashier, payment_request(&order.id, 1000))
            .await
            .unwrap();

        // Pending payment cannot be refunded.
        let err = payments
            .refund_payment(&fx.admin, &created.payment.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::PaymentNotPending { .. })
        ));

        payments
            .complete_payment(&fx.cashier, &created.payment.id)
            .await
            .unwrap();

        // Cashiers cannot refund.
        let err = payments
            .refund_payment(&fx.cashier, &created.payment.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Unauthorized { .. })
        ));

        let refunded = payments
            .refund_payment(&fx.admin, &created.payment.id)
            .await
            .unwrap();
        assert_eq!(refunded.status, PaymentState::Refunded);
    }

    #[tokio::test]
    async fn test_update_payment_cannot_touch_status() {
        let fx = fixture().await;
        let (orders, payments) = workflows(&fx.db);
        let order = seed_order(&fx, &orders, 1000).await.order;
        let created = payments
            .create_payment(&fx.cashier, payment_request(&order.id, 1000))
            .await
            .unwrap();

        let updated = payments
            .update_payment(
                &fx.cashier,
                &created.payment.id,
                PaymentPatch {
                    amount_cents: Some(900),
                    payment_method: Some(PaymentMethod::Card),
                    transaction_reference: Some("AUTH-1234".to_string()),
                    notes: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.amount_cents, 900);
        assert_eq!(updated.payment_method, PaymentMethod::Card);
        // The patch surface has no status field; still pending.
        assert_eq!(updated.status, PaymentState::Pending);
    }

    #[tokio::test]
    async fn test_delete_payment_immutable_when_completed() {
        let fx = fixture().await;
        let (orders, payments) = workflows(&fx.db);
        let order = seed_order(&fx, &orders, 1000).await.order;
        let created = payments
            .create_payment(&fx.cashier, payment_request(&order.id, 1000))
            .await
            .unwrap();

        payments
            .complete_payment(&fx.cashier, &created.payment.id)
            .await
            .unwrap();

        let err = payments
            .delete_payment(&fx.admin, &created.payment.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::PaymentImmutable { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_pending_payment() {
        let fx = fixture().await;
        let (orders, payments) = workflows(&fx.db);
        let order = seed_order(&fx, &orders, 1000).await.order;
        let created = payments
            .create_payment(&fx.cashier, payment_request(&order.id, 1000))
            .await
            .unwrap();

        payments
            .delete_payment(&fx.cashier, &created.payment.id)
            .await
            .unwrap();

        assert!(fx
            .db
            .payments()
            .get_by_id(&created.payment.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_create_payment_rejects_negative_amount() {
        let fx = fixture().await;
        let (orders, payments) = workflows(&fx.db);
        let order = seed_order(&fx, &orders, 1000).await.order;

        let err = payments
            .create_payment(&fx.cashier, payment_request(&order.id, -5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Validation(_))
        ));
    }
}
