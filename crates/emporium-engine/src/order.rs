//! # Order Workflow
//!
//! Builds orders from requested line items, validates them against the
//! inventory ledger, computes monetary totals and manages the order state
//! machine.
//!
//! ## State Machine
//! ```text
//! pending ──► processing ──► completed   (terminal)
//!    │             │
//!    └─────────────┴───────► cancelled   (terminal, stock restored)
//! ```
//!
//! ## Atomicity
//! `create_order` commits the order row, every item row, every stock
//! decrement and every movement row as ONE transaction; a failed reservation
//! on the fifth line rolls back the four before it. `cancel_order` likewise
//! couples the status flip with the stock releases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use std::sync::Arc;
use tracing::{debug, info};

use emporium_core::events::OrderSnapshot;
use emporium_core::money::{grand_total, Money};
use emporium_core::policy::{self, Actor};
use emporium_core::validation::{
    validate_charge_cents, validate_customer_name, validate_customer_phone, validate_line_count,
    validate_quantity,
};
use emporium_core::{
    CoreError, DomainEvent, EventNotifier, Order, OrderItem, OrderStatus, PaymentStatus,
    ORDER_NUMBER_PREFIX,
};
use emporium_db::repository::{generate_id, generate_reference, order as order_repo};
use emporium_db::{Database, DbError};

use crate::error::{EngineError, EngineResult};
use crate::inventory::InventoryLedger;

// =============================================================================
// Boundary DTOs
// =============================================================================

/// One requested line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Input to `create_order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub store_id: String,
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub tax_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input to `update_order`. Fields left as `None` are not touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Workflow
// =============================================================================

/// Order lifecycle workflow.
#[derive(Clone)]
pub struct OrderWorkflow {
    db: Database,
    notifier: Arc<dyn EventNotifier>,
}

impl OrderWorkflow {
    /// Creates a new OrderWorkflow publishing to the given notifier.
    pub fn new(db: Database, notifier: Arc<dyn EventNotifier>) -> Self {
        OrderWorkflow { db, notifier }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Creates an order from requested line items.
    ///
    /// ## Flow
    /// 1. Policy: seller role, store scope
    /// 2. Validation: line count, quantities, tax/discount, customer fields
    /// 3. One transaction: per line, load product (store ownership, price
    ///    snapshot) and reserve stock; insert order + items
    /// 4. Publish `OrderCreated` after commit
    ///
    /// Duplicate product ids in the request are merged into a single line.
    pub async fn create_order(
        &self,
        actor: &Actor,
        req: CreateOrderRequest,
    ) -> EngineResult<OrderSnapshot> {
        policy::require_seller(actor)?;
        policy::require_store_access(actor, &req.store_id)?;

        validate_line_count(req.items.len())?;
        for line in &req.items {
            validate_quantity(line.quantity)?;
        }
        validate_charge_cents("tax_amount", req.tax_cents)?;
        validate_charge_cents("discount_amount", req.discount_cents)?;
        validate_customer_name(&req.customer_name)?;
        validate_customer_phone(&req.customer_phone)?;

        let lines = merge_lines(req.items);
        for (_, quantity) in &lines {
            validate_quantity(*quantity)?;
        }

        let order_id = generate_id();
        let order_number = generate_reference(ORDER_NUMBER_PREFIX);
        let now = Utc::now();

        debug!(order_id = %order_id, order_number = %order_number, lines = lines.len(), "Creating order");

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let mut subtotal = Money::zero();
        let mut items = Vec::with_capacity(lines.len());

        for (product_id, quantity) in &lines {
            let product = emporium_db::repository::product::get_for_update(&mut tx, product_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Product", product_id))?;

            if product.store_id != req.store_id {
                return Err(CoreError::ForeignProduct {
                    product_id: product.id,
                    store_id: req.store_id,
                }
                .into());
            }

            InventoryLedger::reserve(&mut tx, product_id, *quantity, Some(&order_id)).await?;

            let unit_price = product.price();
            let line_total = unit_price.multiply_quantity(*quantity);
            subtotal += line_total;

            items.push(OrderItem {
                id: generate_id(),
                order_id: order_id.clone(),
                product_id: product.id,
                quantity: *quantity,
                unit_price_cents: unit_price.cents(),
                total_price_cents: line_total.cents(),
                created_at: now,
            });
        }

        let total = grand_total(
            subtotal,
            Money::from_cents(req.tax_cents),
            Money::from_cents(req.discount_cents),
        );

        let order = Order {
            id: order_id.clone(),
            store_id: req.store_id,
            seller_id: actor.user_id.clone(),
            cashier_id: None,
            order_number,
            customer_name: req.customer_name,
            customer_phone: req.customer_phone,
            subtotal_cents: subtotal.cents(),
            tax_cents: req.tax_cents,
            discount_cents: req.discount_cents,
            total_cents: total.cents(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            notes: req.notes,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        order_repo::insert_order(&mut tx, &order).await?;
        for item in &items {
            order_repo::insert_item(&mut tx, item).await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total_cents = order.total_cents,
            items = items.len(),
            "Order created"
        );

        let snapshot = OrderSnapshot { order, items };
        self.notifier
            .publish(DomainEvent::OrderCreated(snapshot.clone()));

        Ok(snapshot)
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Patches an order's customer fields, notes and status.
    ///
    /// ## Rules
    /// - Completed orders are immutable
    /// - Cancelled orders refuse status changes (terminal)
    /// - A patch to `completed` stamps `completed_at`
    /// - A patch to `cancelled` runs the full stock-release path, exactly
    ///   like `cancel_order`
    pub async fn update_order(
        &self,
        actor: &Actor,
        order_id: &str,
        patch: OrderPatch,
    ) -> EngineResult<OrderSnapshot> {
        let order = self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;

        policy::require_store_access(actor, &order.store_id)?;

        validate_customer_name(&patch.customer_name)?;
        validate_customer_phone(&patch.customer_phone)?;

        if order.status == OrderStatus::Completed {
            return Err(CoreError::OrderImmutable {
                order_id: order_id.to_string(),
                status: order.status.as_str().to_string(),
            }
            .into());
        }

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        // Re-read inside the transaction so the state machine decision and
        // the write observe the same row.
        let current = order_repo::get_for_update(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;

        let target_status = patch.status.unwrap_or(current.status);

        if current.status.is_terminal() && target_status != current.status {
            return Err(CoreError::OrderImmutable {
                order_id: order_id.to_string(),
                status: current.status.as_str().to_string(),
            }
            .into());
        }

        let mut updated = current.clone();
        if let Some(name) = patch.customer_name {
            updated.customer_name = Some(name);
        }
        if let Some(phone) = patch.customer_phone {
            updated.customer_phone = Some(phone);
        }
        if let Some(notes) = patch.notes {
            updated.notes = Some(notes);
        }

        if target_status == OrderStatus::Cancelled && current.status != OrderStatus::Cancelled {
            // Cancelling through update takes the same release path as
            // cancel_order; skipping it would leak the reserved stock.
            let rows = order_repo::mark_cancelled(&mut tx, order_id).await?;
            if rows == 0 {
                return Err(CoreError::OrderImmutable {
                    order_id: order_id.to_string(),
                    status: current.status.as_str().to_string(),
                }
                .into());
            }
            release_items(&mut tx, order_id).await?;
        }

        updated.status = target_status;
        if target_status == OrderStatus::Completed && current.status != OrderStatus::Completed {
            updated.completed_at = Some(Utc::now());
        }

        order_repo::update_details(&mut tx, &updated).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(order_id = %order_id, status = ?updated.status, "Order updated");

        let snapshot = self.snapshot(order_id).await?;
        self.notifier
            .publish(DomainEvent::OrderUpdated(snapshot.clone()));

        Ok(snapshot)
    }

    // =========================================================================
    // Cancel
    // =========================================================================

    /// Cancels an order and restores every reserved quantity.
    ///
    /// Fails with `OrderImmutable` when the order is already terminal, which
    /// is also what makes a double release impossible.
    pub async fn cancel_order(&self, actor: &Actor, order_id: &str) -> EngineResult<OrderSnapshot> {
        let order = self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;

        policy::require_store_access(actor, &order.store_id)?;

        if order.status.is_terminal() {
            return Err(CoreError::OrderImmutable {
                order_id: order_id.to_string(),
                status: order.status.as_str().to_string(),
            }
            .into());
        }

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let rows = order_repo::mark_cancelled(&mut tx, order_id).await?;
        if rows == 0 {
            // Lost a race with a concurrent transition; report the fresh state.
            let status = order_repo::get_for_update(&mut tx, order_id)
                .await?
                .map(|o| o.status.as_str().to_string())
                .unwrap_or_else(|| "missing".to_string());
            return Err(CoreError::OrderImmutable {
                order_id: order_id.to_string(),
                status,
            }
            .into());
        }

        release_items(&mut tx, order_id).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(order_id = %order_id, "Order cancelled, stock restored");

        let snapshot = self.snapshot(order_id).await?;
        self.notifier
            .publish(DomainEvent::OrderCancelled(snapshot.clone()));

        Ok(snapshot)
    }

    // =========================================================================
    // Completion (driven by the payment workflow)
    // =========================================================================

    /// Drives an order to completed/paid inside the caller's transaction.
    ///
    /// Invoked by the payment workflow when a payment completes, so the
    /// payment update and the order cascade commit together.
    pub async fn transition_to_completed(
        conn: &mut SqliteConnection,
        order_id: &str,
        cashier_id: &str,
        completed_at: DateTime<Utc>,
    ) -> EngineResult<Order> {
        let rows = order_repo::mark_completed(conn, order_id, cashier_id, completed_at).await?;

        if rows == 0 {
            return match order_repo::get_for_update(conn, order_id).await? {
                Some(order) => Err(CoreError::OrderImmutable {
                    order_id: order_id.to_string(),
                    status: order.status.as_str().to_string(),
                }
                .into()),
                None => Err(CoreError::not_found("Order", order_id).into()),
            };
        }

        order_repo::get_for_update(conn, order_id)
            .await?
            .ok_or_else(|| EngineError::from(CoreError::not_found("Order", order_id)))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an order with its items, store-scoped.
    pub async fn get_order(&self, actor: &Actor, order_id: &str) -> EngineResult<OrderSnapshot> {
        let order = self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;

        policy::require_store_access(actor, &order.store_id)?;

        let items = self.db.orders().get_items(order_id).await?;
        Ok(OrderSnapshot { order, items })
    }

    /// Lists orders of one store, newest first.
    pub async fn list_orders(
        &self,
        actor: &Actor,
        store_id: &str,
        status: Option<OrderStatus>,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
        limit: u32,
    ) -> EngineResult<Vec<Order>> {
        policy::require_store_access(actor, store_id)?;

        let orders = self
            .db
            .orders()
            .list_for_store(store_id, status, date_from, date_to, limit)
            .await?;
        Ok(orders)
    }

    /// Lists a store's pending orders oldest-first: the cashier work queue.
    pub async fn pending_orders(&self, actor: &Actor, store_id: &str) -> EngineResult<Vec<Order>> {
        policy::require_cashier(actor)?;
        policy::require_store_access(actor, store_id)?;

        let orders = self.db.orders().pending_for_store(store_id).await?;
        Ok(orders)
    }

    /// Loads the denormalized order snapshot via the pool.
    async fn snapshot(&self, order_id: &str) -> EngineResult<OrderSnapshot> {
        let order = self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;
        let items = self.db.orders().get_items(order_id).await?;
        Ok(OrderSnapshot { order, items })
    }
}

/// Releases every item quantity of an order inside the caller's transaction.
async fn release_items(conn: &mut SqliteConnection, order_id: &str) -> EngineResult<()> {
    let items = order_repo::items_for_update(conn, order_id).await?;
    for item in &items {
        InventoryLedger::release(conn, &item.product_id, item.quantity, Some(order_id)).await?;
    }
    Ok(())
}

/// Merges duplicate product ids, preserving first-seen order.
fn merge_lines(items: Vec<OrderLine>) -> Vec<(String, i64)> {
    let mut merged: Vec<(String, i64)> = Vec::with_capacity(items.len());
    for line in items {
        match merged.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, quantity)) => *quantity += line.quantity,
            None => merged.push((line.product_id, line.quantity)),
        }
    }
    merged
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NullNotifier;
    use crate::testutil::{fixture, seed_product};

    fn workflow(db: &Database) -> OrderWorkflow {
        OrderWorkflow::new(db.clone(), Arc::new(NullNotifier))
    }

    fn request(store_id: &str, lines: Vec<OrderLine>) -> CreateOrderRequest {
        CreateOrderRequest {
            store_id: store_id.to_string(),
            items: lines,
            customer_name: None,
            customer_phone: None,
            tax_cents: 0,
            discount_cents: 0,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_order_computes_totals() {
        let fx = fixture().await;
        let p1 = seed_product(&fx.db, &fx.store.id, &fx.category.id, "ORD-P1", 1000, 10).await;
        let p2 = seed_product(&fx.db, &fx.store.id, &fx.category.id, "ORD-P2", 500, 10).await;
        let orders = workflow(&fx.db);

        let snapshot = orders
            .create_order(
                &fx.seller,
                request(
                    &fx.store.id,
                    vec![
                        OrderLine {
                            product_id: p1.id.clone(),
                            quantity: 2,
                        },
                        OrderLine {
                            product_id: p2.id.clone(),
                            quantity: 1,
                        },
                    ],
                ),
            )
            .await
            .unwrap();

        assert_eq!(snapshot.order.subtotal_cents, 2500);
        assert_eq!(snapshot.order.total_cents, 2500);
        assert_eq!(snapshot.order.status, OrderStatus::Pending);
        assert_eq!(snapshot.order.payment_status, PaymentStatus::Pending);
        assert!(snapshot.order.order_number.starts_with("ORD-"));
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.items[0].unit_price_cents, 1000);
        assert_eq!(snapshot.items[0].total_price_cents, 2000);

        // Stock was reserved.
        let fresh = fx.db.products().get_by_id(&p1.id).await.unwrap().unwrap();
        assert_eq!(fresh.stock_quantity, 8);
    }

    #[tokio::test]
    async fn test_create_order_discount_floors_total_at_zero() {
        let fx = fixture().await;
        let p = seed_product(&fx.db, &fx.store.id, &fx.category.id, "ORD-P3", 1000, 5).await;
        let orders = workflow(&fx.db);

        let mut req = request(
            &fx.store.id,
            vec![OrderLine {
                product_id: p.id,
                quantity: 1,
            }],
        );
        req.discount_cents = 5000;

        let snapshot = orders.create_order(&fx.seller, req).await.unwrap();
        assert_eq!(snapshot.order.total_cents, 0);
    }

    #[tokio::test]
    async fn test_create_order_insufficient_stock_rolls_back_all_lines() {
        let fx = fixture().await;
        let p1 = seed_product(&fx.db, &fx.store.id, &fx.category.id, "ORD-P4", 1000, 10).await;
        let p2 = seed_product(&fx.db, &fx.store.id, &fx.category.id, "ORD-P5", 500, 1).await;
        let orders = workflow(&fx.db);

        let err = orders
            .create_order(
                &fx.seller,
                request(
                    &fx.store.id,
                    vec![
                        OrderLine {
                            product_id: p1.id.clone(),
                            quantity: 4,
                        },
                        OrderLine {
                            product_id: p2.id.clone(),
                            quantity: 2,
                        },
                    ],
                ),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InsufficientStock { .. })
        ));

        // The first line's reservation was rolled back with the rest.
        let fresh = fx.db.products().get_by_id(&p1.id).await.unwrap().unwrap();
        assert_eq!(fresh.stock_quantity, 10);
        let fresh = fx.db.products().get_by_id(&p2.id).await.unwrap().unwrap();
        assert_eq!(fresh.stock_quantity, 1);
    }

    #[tokio::test]
    async fn test_create_order_rejects_foreign_product() {
        let fx = fixture().await;
        let foreign =
            seed_product(&fx.db, &fx.other_store.id, &fx.category.id, "ORD-P6", 1000, 10).await;
        let orders = workflow(&fx.db);

        let err = orders
            .create_order(
                &fx.seller,
                request(
                    &fx.store.id,
                    vec![OrderLine {
                        product_id: foreign.id.clone(),
                        quantity: 1,
                    }],
                ),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Domain(CoreError::ForeignProduct { .. })
        ));

        let fresh = fx.db.products().get_by_id(&foreign.id).await.unwrap().unwrap();
        assert_eq!(fresh.stock_quantity, 10);
    }

    #[tokio::test]
    async fn test_create_order_policy() {
        let fx = fixture().await;
        let p = seed_product(&fx.db, &fx.store.id, &fx.category.id, "ORD-P7", 1000, 10).await;
        let orders = workflow(&fx.db);

        // Cashiers cannot create orders.
        let err = orders
            .create_order(
                &fx.cashier,
                request(
                    &fx.store.id,
                    vec![OrderLine {
                        product_id: p.id.clone(),
                        quantity: 1,
                    }],
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Unauthorized { .. })
        ));

        // Sellers cannot create orders for another store.
        let err = orders
            .create_order(
                &fx.outsider,
                request(
                    &fx.store.id,
                    vec![OrderLine {
                        product_id: p.id,
                        quantity: 1,
                    }],
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_order_rejects_empty_and_bad_lines() {
        let fx = fixture().await;
        let orders = workflow(&fx.db);

        let err = orders
            .create_order(&fx.seller, request(&fx.store.id, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Validation(_))
        ));

        let err = orders
            .create_order(
                &fx.seller,
                request(
                    &fx.store.id,
                    vec![OrderLine {
                        product_id: "whatever".to_string(),
                        quantity: 0,
                    }],
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_order_merges_duplicate_lines() {
        let fx = fixture().await;
        let p = seed_product(&fx.db, &fx.store.id, &fx.category.id, "ORD-P8", 300, 10).await;
        let orders = workflow(&fx.db);

        let snapshot = orders
            .create_order(
                &fx.seller,
                request(
                    &fx.store.id,
                    vec![
                        OrderLine {
                            product_id: p.id.clone(),
                            quantity: 2,
                        },
                        OrderLine {
                            product_id: p.id.clone(),
                            quantity: 3,
                        },
                    ],
                ),
            )
            .await
            .unwrap();

        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].quantity, 5);
        assert_eq!(snapshot.order.subtotal_cents, 1500);
    }

    #[tokio::test]
    async fn test_cancel_order_restores_stock() {
        let fx = fixture().await;
        let p = seed_product(&fx.db, &fx.store.id, &fx.category.id, "ORD-P9", 1000, 5).await;
        let orders = workflow(&fx.db);

        let snapshot = orders
            .create_order(
                &fx.seller,
                request(
                    &fx.store.id,
                    vec![OrderLine {
                        product_id: p.id.clone(),
                        quantity: 3,
                    }],
                ),
            )
            .await
            .unwrap();

        let fresh = fx.db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(fresh.stock_quantity, 2);

        let cancelled = orders
            .cancel_order(&fx.seller, &snapshot.order.id)
            .await
            .unwrap();
        assert_eq!(cancelled.order.status, OrderStatus::Cancelled);

        let fresh = fx.db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(fresh.stock_quantity, 5);

        // Terminal: a second cancel fails and restores nothing twice.
        let err = orders
            .cancel_order(&fx.seller, &snapshot.order.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::OrderImmutable { .. })
        ));
        let fresh = fx.db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(fresh.stock_quantity, 5);
    }

    #[tokio::test]
    async fn test_update_order_patches_fields_and_completes() {
        let fx = fixture().await;
        let p = seed_product(&fx.db, &fx.store.id, &fx.category.id, "ORD-PA", 1000, 5).await;
        let orders = workflow(&fx.db);

        let snapshot = orders
            .create_order(
                &fx.seller,
                request(
                    &fx.store.id,
                    vec![OrderLine {
                        product_id: p.id,
                        quantity: 1,
                    }],
                ),
            )
            .await
            .unwrap();

        let updated = orders
            .update_order(
                &fx.seller,
                &snapshot.order.id,
                OrderPatch {
                    customer_name: Some("Alice".to_string()),
                    status: Some(OrderStatus::Completed),
                    ..OrderPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.order.customer_name.as_deref(), Some("Alice"));
        assert_eq!(updated.order.status, OrderStatus::Completed);
        assert!(updated.order.completed_at.is_some());

        // Completed orders are immutable.
        let err = orders
            .update_order(
                &fx.seller,
                &snapshot.order.id,
                OrderPatch {
                    notes: Some("late note".to_string()),
                    ..OrderPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::OrderImmutable { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_order_to_cancelled_releases_stock() {
        let fx = fixture().await;
        let p = seed_product(&fx.db, &fx.store.id, &fx.category.id, "ORD-PB", 1000, 5).await;
        let orders = workflow(&fx.db);

        let snapshot = orders
            .create_order(
                &fx.seller,
                request(
                    &fx.store.id,
                    vec![OrderLine {
                        product_id: p.id.clone(),
                        quantity: 2,
                    }],
                ),
            )
            .await
            .unwrap();

        let updated = orders
            .update_order(
                &fx.seller,
                &snapshot.order.id,
                OrderPatch {
                    status: Some(OrderStatus::Cancelled),
                    ..OrderPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.order.status, OrderStatus::Cancelled);
        let fresh = fx.db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(fresh.stock_quantity, 5);
    }

    #[tokio::test]
    async fn test_pending_orders_is_cashier_queue() {
        let fx = fixture().await;
        let p = seed_product(&fx.db, &fx.store.id, &fx.category.id, "ORD-PC", 1000, 10).await;
        let orders = workflow(&fx.db);

        for _ in 0..2 {
            orders
                .create_order(
                    &fx.seller,
                    request(
                        &fx.store.id,
                        vec![OrderLine {
                            product_id: p.id.clone(),
                            quantity: 1,
                        }],
                    ),
                )
                .await
                .unwrap();
        }

        let pending = orders.pending_orders(&fx.cashier, &fx.store.id).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending[0].created_at <= pending[1].created_at);

        // Sellers do not see the cashier queue.
        let err = orders
            .pending_orders(&fx.seller, &fx.store.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Unauthorized { .. })
        ));
    }
}
