//! # Order Repository
//!
//! Database operations for orders and their line items.
//!
//! ## Guarded Transitions
//! Every status transition is written as a conditional UPDATE carrying the
//! expected prior status in its WHERE clause. `rows_affected = 0` tells the
//! engine the order moved underneath the caller, and the enclosing
//! transaction rolls back. No transition is ever a blind write.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use emporium_core::{Order, OrderItem, OrderStatus};

const ORDER_COLUMNS: &str = "id, store_id, seller_id, cashier_id, order_number, customer_name, \
     customer_phone, subtotal_cents, tax_cents, discount_cents, total_cents, status, \
     payment_status, notes, created_at, updated_at, completed_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, quantity, unit_price_cents, total_price_cents, created_at";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets an order by its business number.
    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = ?1"
        ))
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets all items of an order, in insertion order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY created_at"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists orders of one store, newest first, with optional filters.
    pub async fn list_for_store(
        &self,
        store_id: &str,
        status: Option<OrderStatus>,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
        limit: u32,
    ) -> DbResult<Vec<Order>> {
        debug!(store_id = %store_id, status = ?status, "Listing orders");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE store_id = "
        ));
        qb.push_bind(store_id);

        if let Some(status) = status {
            qb.push(" AND status = ");
            qb.push_bind(status);
        }

        if let Some(from) = date_from {
            qb.push(" AND created_at >= ");
            qb.push_bind(from);
        }

        if let Some(to) = date_to {
            qb.push(" AND created_at <= ");
            qb.push_bind(to);
        }

        qb.push(" ORDER BY created_at DESC LIMIT ");
        qb.push_bind(limit);

        let orders = qb.build_query_as::<Order>().fetch_all(&self.pool).await?;

        Ok(orders)
    }

    /// Lists pending orders of one store, oldest first.
    ///
    /// This is the cashier's work queue; oldest-first keeps it fair.
    pub async fn pending_for_store(&self, store_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE store_id = ?1 AND status = 'pending' ORDER BY created_at ASC"
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}

// =============================================================================
// Transactional Commands
// =============================================================================

/// Loads an order inside an open transaction.
pub async fn get_for_update(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

/// Inserts a complete order row.
pub async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(id = %order.id, order_number = %order.order_number, "Inserting order");

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, store_id, seller_id, cashier_id, order_number,
            customer_name, customer_phone,
            subtotal_cents, tax_cents, discount_cents, total_cents,
            status, payment_status, notes,
            created_at, updated_at, completed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        "#,
    )
    .bind(&order.id)
    .bind(&order.store_id)
    .bind(&order.seller_id)
    .bind(&order.cashier_id)
    .bind(&order.order_number)
    .bind(&order.customer_name)
    .bind(&order.customer_phone)
    .bind(order.subtotal_cents)
    .bind(order.tax_cents)
    .bind(order.discount_cents)
    .bind(order.total_cents)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.completed_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts one order line item.
///
/// ## Snapshot Pattern
/// `unit_price_cents` was frozen from the product when the line was built;
/// later price changes never rewrite order history.
pub async fn insert_item(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, product_id, quantity,
            unit_price_cents, total_price_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.total_price_cents)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Loads the items of an order inside an open transaction.
pub async fn items_for_update(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY created_at"
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Writes the mutable detail fields of an order (customer info, notes,
/// status, completion marker).
///
/// The engine has already applied the state-machine rules to the in-memory
/// order before calling this; it is a plain field write, not a transition.
pub async fn update_details(conn: &mut SqliteConnection, order: &Order) -> DbResult<u64> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE orders SET
            customer_name = ?2,
            customer_phone = ?3,
            notes = ?4,
            status = ?5,
            completed_at = ?6,
            updated_at = ?7
        WHERE id = ?1
        "#,
    )
    .bind(&order.id)
    .bind(&order.customer_name)
    .bind(&order.customer_phone)
    .bind(&order.notes)
    .bind(order.status)
    .bind(order.completed_at)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Moves a pending order to processing and assigns the cashier.
///
/// ## Returns
/// Rows affected; 0 means the order was no longer pending (a concurrent
/// payment won the race) and the caller must roll back.
pub async fn mark_processing(
    conn: &mut SqliteConnection,
    order_id: &str,
    cashier_id: &str,
) -> DbResult<u64> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE orders SET
            status = 'processing',
            cashier_id = ?2,
            updated_at = ?3
        WHERE id = ?1 AND status = 'pending'
        "#,
    )
    .bind(order_id)
    .bind(cashier_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Moves a live order to completed/paid with the cashier and completion
/// timestamp set.
///
/// ## Returns
/// Rows affected; 0 means the order was already terminal.
pub async fn mark_completed(
    conn: &mut SqliteConnection,
    order_id: &str,
    cashier_id: &str,
    completed_at: DateTime<Utc>,
) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET
            status = 'completed',
            payment_status = 'paid',
            cashier_id = ?2,
            completed_at = ?3,
            updated_at = ?3
        WHERE id = ?1 AND status IN ('pending', 'processing')
        "#,
    )
    .bind(order_id)
    .bind(cashier_id)
    .bind(completed_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Moves a live order to cancelled.
///
/// ## Returns
/// Rows affected; 0 means the order was already terminal.
pub async fn mark_cancelled(conn: &mut SqliteConnection, order_id: &str) -> DbResult<u64> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE orders SET
            status = 'cancelled',
            updated_at = ?2
        WHERE id = ?1 AND status IN ('pending', 'processing')
        "#,
    )
    .bind(order_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}
