//! # Inventory Ledger
//!
//! The authoritative gate for every `stock_quantity` mutation.
//!
//! ## No-Oversell Guarantee
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │            Two Orders Race for the Last 3 Units                      │
//! │                                                                      │
//! │  Order A (qty 3)                    Order B (qty 3)                  │
//! │  ───────────────                    ───────────────                  │
//! │  BEGIN                              BEGIN                            │
//! │  reserve: UPDATE ... WHERE          (waits: SQLite single writer)    │
//! │    stock_quantity >= 3                                               │
//! │  → 1 row, stock now 0                                                │
//! │  COMMIT                                                              │
//! │                                     reserve: UPDATE ... WHERE        │
//! │                                       stock_quantity >= 3            │
//! │                                     → 0 rows                         │
//! │                                     ROLLBACK, InsufficientStock      │
//! │                                                                      │
//! │  The availability check rides inside the UPDATE itself, so there is  │
//! │  no observable window between check and act.                         │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `reserve` and `release` are transaction-scoped: they take the caller's
//! open connection so order creation and cancellation stay atomic across
//! order rows, item rows and stock deltas. `adjust` is a standalone
//! policy-checked entry point for manual corrections.

use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use emporium_core::policy::{self, Actor};
use emporium_core::{CoreError, MovementReason, Product, StockMovement, StockOperation};
use emporium_core::error::ValidationError;
use emporium_core::validation::validate_stock_level;
use emporium_db::repository::{inventory, product};
use emporium_db::{Database, DbError};

use crate::error::{EngineError, EngineResult};

/// Tracks per-product available quantity and exposes the atomic
/// reserve/release/adjust operations.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    db: Database,
}

impl InventoryLedger {
    /// Creates a new InventoryLedger.
    pub fn new(db: Database) -> Self {
        InventoryLedger { db }
    }

    // =========================================================================
    // Transaction-Scoped Operations
    // =========================================================================

    /// Reserves `quantity` units of a product inside the caller's
    /// transaction.
    ///
    /// ## Failure Modes
    /// - Product missing or inactive: `InsufficientStock` with available 0
    /// - Stock below `quantity`: `InsufficientStock` with the observed level
    ///
    /// On success the guarded decrement has been applied, a `reservation`
    /// movement row is recorded, and the new quantity is returned.
    pub async fn reserve(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
        order_id: Option<&str>,
    ) -> EngineResult<i64> {
        let product = product::get_for_update(conn, product_id).await?;

        let product = match product {
            Some(p) if p.is_active => p,
            Some(p) => {
                return Err(CoreError::InsufficientStock {
                    sku: p.sku,
                    available: 0,
                    requested: quantity,
                }
                .into())
            }
            None => {
                return Err(CoreError::InsufficientStock {
                    sku: product_id.to_string(),
                    available: 0,
                    requested: quantity,
                }
                .into())
            }
        };

        match inventory::try_decrement_stock(conn, product_id, quantity).await? {
            Some(new_quantity) => {
                inventory::record_movement(
                    conn,
                    product_id,
                    order_id,
                    -quantity,
                    MovementReason::Reservation,
                )
                .await?;

                if new_quantity <= product.min_stock_level {
                    warn!(
                        sku = %product.sku,
                        stock = new_quantity,
                        min_stock_level = product.min_stock_level,
                        "Product is at or below its low stock threshold"
                    );
                }

                Ok(new_quantity)
            }
            None => Err(CoreError::InsufficientStock {
                sku: product.sku,
                available: product.stock_quantity,
                requested: quantity,
            }
            .into()),
        }
    }

    /// Releases `quantity` units back to a product inside the caller's
    /// transaction (order cancellation).
    ///
    /// Never fails on a valid product id; there is no upper clamp. The only
    /// caller is the cancellation path, and cancelled orders are terminal,
    /// so a matching reservation always precedes a release.
    pub async fn release(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
        order_id: Option<&str>,
    ) -> EngineResult<i64> {
        let new_quantity = inventory::increment_stock(conn, product_id, quantity).await?;

        inventory::record_movement(
            conn,
            product_id,
            order_id,
            quantity,
            MovementReason::Release,
        )
        .await?;

        Ok(new_quantity)
    }

    // =========================================================================
    // Standalone Entry Points
    // =========================================================================

    /// Manually corrects a product's stock level.
    ///
    /// ## Operations
    /// - `Add`: increment by `quantity` (must be positive)
    /// - `Subtract`: decrement by `quantity`, clamping at zero
    /// - `Set`: replace the level with `quantity` (must not be negative)
    ///
    /// Policy: admin, or any actor of the product's store.
    pub async fn adjust(
        &self,
        actor: &Actor,
        product_id: &str,
        quantity: i64,
        operation: StockOperation,
    ) -> EngineResult<Product> {
        let current = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        policy::require_store_access(actor, &current.store_id)?;

        match operation {
            StockOperation::Add | StockOperation::Subtract => {
                if quantity <= 0 {
                    return Err(ValidationError::MustBePositive {
                        field: "quantity".to_string(),
                    }
                    .into());
                }
            }
            StockOperation::Set => validate_stock_level(quantity)?,
        }

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let delta = match operation {
            StockOperation::Add => {
                inventory::increment_stock(&mut tx, product_id, quantity).await?;
                quantity
            }
            StockOperation::Subtract => {
                let before = inventory::current_stock(&mut tx, product_id).await?;
                let after = inventory::clamped_decrement_stock(&mut tx, product_id, quantity).await?;
                after - before
            }
            StockOperation::Set => {
                let before = inventory::set_stock(&mut tx, product_id, quantity).await?;
                quantity - before
            }
        };

        if delta != 0 {
            inventory::record_movement(&mut tx, product_id, None, delta, MovementReason::Adjustment)
                .await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            product_id = %product_id,
            operation = ?operation,
            quantity,
            delta,
            "Stock adjusted"
        );

        let updated = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        Ok(updated)
    }

    /// Lists recent stock movements of one product, newest first.
    ///
    /// Policy: admin, or any actor of the product's store.
    pub async fn movements(
        &self,
        actor: &Actor,
        product_id: &str,
        limit: u32,
    ) -> EngineResult<Vec<StockMovement>> {
        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        policy::require_store_access(actor, &product.store_id)?;

        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        let movements = inventory::movements_for_product(&mut conn, product_id, limit).await?;

        debug!(product_id = %product_id, count = movements.len(), "Fetched stock movements");
        Ok(movements)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{fixture, seed_product};
    use emporium_core::{MovementReason, StockOperation};

    #[tokio::test]
    async fn test_reserve_decrements_and_records_movement() {
        let fx = fixture().await;
        let product = seed_product(&fx.db, &fx.store.id, &fx.category.id, "RSV-1", 1000, 5).await;

        let mut tx = fx.db.pool().begin().await.unwrap();
        let left = InventoryLedger::reserve(&mut tx, &product.id, 3, None)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(left, 2);

        let ledger = InventoryLedger::new(fx.db.clone());
        let movements = ledger.movements(&fx.admin, &product.id, 10).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].delta, -3);
        assert_eq!(movements[0].reason, MovementReason::Reservation);
    }

    #[tokio::test]
    async fn test_reserve_insufficient_stock_rolls_back() {
        let fx = fixture().await;
        let product = seed_product(&fx.db, &fx.store.id, &fx.category.id, "RSV-2", 1000, 2).await;

        let mut tx = fx.db.pool().begin().await.unwrap();
        let err = InventoryLedger::reserve(&mut tx, &product.id, 3, None)
            .await
            .unwrap_err();
        drop(tx);

        match err {
            EngineError::Domain(CoreError::InsufficientStock {
                sku,
                available,
                requested,
            }) => {
                assert_eq!(sku, "RSV-2");
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Nothing persisted.
        let fresh = fx.db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fresh.stock_quantity, 2);
    }

    #[tokio::test]
    async fn test_reserve_inactive_product_reports_zero_available() {
        let fx = fixture().await;
        let product = seed_product(&fx.db, &fx.store.id, &fx.category.id, "RSV-3", 1000, 9).await;
        fx.db.products().soft_delete(&product.id).await.unwrap();

        let mut tx = fx.db.pool().begin().await.unwrap();
        let err = InventoryLedger::reserve(&mut tx, &product.id, 1, None)
            .await
            .unwrap_err();
        drop(tx);

        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InsufficientStock { available: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_release_round_trip_restores_stock() {
        let fx = fixture().await;
        let product = seed_product(&fx.db, &fx.store.id, &fx.category.id, "RSV-4", 1000, 7).await;

        let mut tx = fx.db.pool().begin().await.unwrap();
        InventoryLedger::reserve(&mut tx, &product.id, 4, None).await.unwrap();
        let restored = InventoryLedger::release(&mut tx, &product.id, 4, None)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(restored, 7);
    }

    #[tokio::test]
    async fn test_adjust_add_subtract_set() {
        let fx = fixture().await;
        let product = seed_product(&fx.db, &fx.store.id, &fx.category.id, "ADJ-1", 1000, 10).await;
        let ledger = InventoryLedger::new(fx.db.clone());

        let p = ledger
            .adjust(&fx.manager, &product.id, 5, StockOperation::Add)
            .await
            .unwrap();
        assert_eq!(p.stock_quantity, 15);

        // Subtract clamps at zero.
        let p = ledger
            .adjust(&fx.manager, &product.id, 100, StockOperation::Subtract)
            .await
            .unwrap();
        assert_eq!(p.stock_quantity, 0);

        let p = ledger
            .adjust(&fx.manager, &product.id, 42, StockOperation::Set)
            .await
            .unwrap();
        assert_eq!(p.stock_quantity, 42);

        // Movement ledger balances to the final level: +5 -10 +42 = 37 on
        // top of the initial 10.
        let movements = ledger.movements(&fx.admin, &product.id, 10).await.unwrap();
        let total: i64 = movements.iter().map(|m| m.delta).sum();
        assert_eq!(10 + total, 42);
    }

    #[tokio::test]
    async fn test_adjust_set_rejects_negative() {
        let fx = fixture().await;
        let product = seed_product(&fx.db, &fx.store.id, &fx.category.id, "ADJ-2", 1000, 10).await;
        let ledger = InventoryLedger::new(fx.db.clone());

        let err = ledger
            .adjust(&fx.manager, &product.id, -1, StockOperation::Set)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_adjust_cross_store_unauthorized() {
        let fx = fixture().await;
        let product = seed_product(&fx.db, &fx.store.id, &fx.category.id, "ADJ-3", 1000, 10).await;
        let ledger = InventoryLedger::new(fx.db.clone());

        let err = ledger
            .adjust(&fx.outsider, &product.id, 5, StockOperation::Add)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Unauthorized { .. })
        ));

        // Untouched.
        let fresh = fx.db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fresh.stock_quantity, 10);
    }
}
