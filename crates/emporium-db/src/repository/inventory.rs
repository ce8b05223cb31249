//! # Inventory Commands
//!
//! The guarded stock mutations and the append-only movement ledger.
//! Everything here takes an explicit connection: the engine composes these
//! into the same transaction as the order or adjustment that caused them.
//!
//! ## The Guarded Decrement
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                 Why a Conditional Single Statement                   │
//! │                                                                      │
//! │  ❌ WRONG: check-then-act across two statements                      │
//! │     SELECT stock_quantity ...        (both callers read 5)           │
//! │     UPDATE ... SET stock_quantity = 5 - 3   (both succeed!)          │
//! │                                                                      │
//! │  ✅ CORRECT: the condition rides inside the UPDATE                   │
//! │     UPDATE products                                                  │
//! │     SET    stock_quantity = stock_quantity - ?qty                    │
//! │     WHERE  id = ?id AND stock_quantity >= ?qty                       │
//! │                                                                      │
//! │  rows_affected = 0 means the stock was gone by the time the write    │
//! │  was applied; the caller rolls the whole order back.                 │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use emporium_core::{MovementReason, StockMovement};

const MOVEMENT_COLUMNS: &str = "id, product_id, order_id, delta, reason, created_at";

/// Decrements stock if and only if enough is available.
///
/// ## Returns
/// * `Ok(Some(new_quantity))` - decrement applied
/// * `Ok(None)` - product missing or stock below `quantity`; nothing written
pub async fn try_decrement_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<Option<i64>> {
    debug!(product_id = %product_id, quantity, "Attempting guarded stock decrement");

    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity - ?2, updated_at = ?3
        WHERE id = ?1 AND stock_quantity >= ?2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let new_quantity = current_stock(conn, product_id).await?;
    Ok(Some(new_quantity))
}

/// Increments stock unconditionally (cancellation restore, manual add).
///
/// ## Returns
/// The new stock quantity.
pub async fn increment_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<i64> {
    debug!(product_id = %product_id, quantity, "Incrementing stock");

    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE products SET stock_quantity = stock_quantity + ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", product_id));
    }

    current_stock(conn, product_id).await
}

/// Decrements stock, clamping at zero (manual subtract).
///
/// ## Returns
/// The new stock quantity.
pub async fn clamped_decrement_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<i64> {
    debug!(product_id = %product_id, quantity, "Clamped stock decrement");

    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_quantity = MAX(0, stock_quantity - ?2), updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", product_id));
    }

    current_stock(conn, product_id).await
}

/// Replaces the stock level (manual set).
///
/// ## Returns
/// The previous stock quantity, so the caller can record the applied delta.
pub async fn set_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<i64> {
    debug!(product_id = %product_id, quantity, "Setting stock level");

    let previous = current_stock(conn, product_id).await?;

    let now = Utc::now();

    sqlx::query("UPDATE products SET stock_quantity = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    Ok(previous)
}

/// Reads the current stock level inside the transaction.
pub async fn current_stock(conn: &mut SqliteConnection, product_id: &str) -> DbResult<i64> {
    let quantity: Option<i64> =
        sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    quantity.ok_or_else(|| DbError::not_found("Product", product_id))
}

// =============================================================================
// Movement Ledger
// =============================================================================

/// Appends a movement row recording one applied stock delta.
///
/// Always written in the same transaction as the stock mutation itself, so
/// the ledger and the counter cannot diverge.
pub async fn record_movement(
    conn: &mut SqliteConnection,
    product_id: &str,
    order_id: Option<&str>,
    delta: i64,
    reason: MovementReason,
) -> DbResult<()> {
    let movement = StockMovement {
        id: generate_id(),
        product_id: product_id.to_string(),
        order_id: order_id.map(str::to_string),
        delta,
        reason,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO stock_movements (id, product_id, order_id, delta, reason, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(&movement.order_id)
    .bind(movement.delta)
    .bind(movement.reason)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Lists movements for one product, newest first.
pub async fn movements_for_product(
    conn: &mut SqliteConnection,
    product_id: &str,
    limit: u32,
) -> DbResult<Vec<StockMovement>> {
    let movements = sqlx::query_as::<_, StockMovement>(&format!(
        "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
         WHERE product_id = ?1 ORDER BY created_at DESC LIMIT ?2"
    ))
    .bind(product_id)
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    Ok(movements)
}

/// Lists movements tied to one order, oldest first.
pub async fn movements_for_order(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<StockMovement>> {
    let movements = sqlx::query_as::<_, StockMovement>(&format!(
        "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
         WHERE order_id = ?1 ORDER BY created_at ASC"
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(movements)
}
