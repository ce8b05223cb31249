//! # Payment Repository
//!
//! Database operations for payments. Transitions follow the same guarded
//! conditional-UPDATE discipline as orders.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use emporium_core::{Payment, PaymentState};

const PAYMENT_COLUMNS: &str = "id, order_id, store_id, cashier_id, invoice_number, amount_cents, \
     payment_method, transaction_reference, status, notes, created_at, updated_at, paid_at";

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Gets a payment by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Gets all payments bound to one order, in insertion order.
    pub async fn list_for_order(&self, order_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ?1 ORDER BY created_at"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Lists payments of one store, newest first, with optional filters.
    pub async fn list_for_store(
        &self,
        store_id: &str,
        status: Option<PaymentState>,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
        limit: u32,
    ) -> DbResult<Vec<Payment>> {
        debug!(store_id = %store_id, status = ?status, "Listing payments");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE store_id = "
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

        let payments = qb.build_query_as::<Payment>().fetch_all(&self.pool).await?;

        Ok(payments)
    }
}

// =============================================================================
// Transactional Commands
// =============================================================================

/// Loads a payment inside an open transaction.
pub async fn get_for_update(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(payment)
}

/// Inserts a complete payment row.
pub async fn insert_payment(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    debug!(
        id = %payment.id,
        invoice_number = %payment.invoice_number,
        order_id = %payment.order_id,
        "Inserting payment"
    );

    sqlx::query(
        r#"
        INSERT INTO payments (
            id, order_id, store_id, cashier_id, invoice_number,
            amount_cents, payment_method, transaction_reference,
            status, notes, created_at, updated_at, paid_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.order_id)
    .bind(&payment.store_id)
    .bind(&payment.cashier_id)
    .bind(&payment.invoice_number)
    .bind(payment.amount_cents)
    .bind(payment.payment_method)
    .bind(&payment.transaction_reference)
    .bind(payment.status)
    .bind(&payment.notes)
    .bind(payment.created_at)
    .bind(payment.updated_at)
    .bind(payment.paid_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Marks a pending payment completed with `paid_at` set.
///
/// ## Returns
/// Rows affected; 0 means the payment was no longer pending.
pub async fn mark_completed(
    conn: &mut SqliteConnection,
    payment_id: &str,
    paid_at: DateTime<Utc>,
) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE payments SET
            status = 'completed',
            paid_at = ?2,
            updated_at = ?2
        WHERE id = ?1 AND status = 'pending'
        "#,
    )
    .bind(payment_id)
    .bind(paid_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Marks a pending payment failed.
///
/// ## Returns
/// Rows affected; 0 means the payment was no longer pending.
pub async fn mark_failed(conn: &mut SqliteConnection, payment_id: &str) -> DbResult<u64> {
    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE payments SET status = 'failed', updated_at = ?2 WHERE id = ?1 AND status = 'pending'",
    )
    .bind(payment_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Marks a completed payment refunded.
///
/// ## Returns
/// Rows affected; 0 means the payment was not completed.
pub async fn mark_refunded(conn: &mut SqliteConnection, payment_id: &str) -> DbResult<u64> {
    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE payments SET status = 'refunded', updated_at = ?2 WHERE id = ?1 AND status = 'completed'",
    )
    .bind(payment_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Writes a payment's patchable detail fields (amount, method, reference,
/// notes). Status is NOT writable here; transitions go through the guarded
/// commands above.
pub async fn update_details(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE payments SET
            amount_cents = ?2,
            payment_method = ?3,
            transaction_reference = ?4,
            notes = ?5,
            updated_at = ?6
        WHERE id = ?1
        "#,
    )
    .bind(&payment.id)
    .bind(payment.amount_cents)
    .bind(payment.payment_method)
    .bind(&payment.transaction_reference)
    .bind(&payment.notes)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Payment", &payment.id));
    }

    Ok(())
}

/// Deletes a payment row.
///
/// ## Returns
/// Rows affected; 0 means the payment was already gone.
pub async fn delete_payment(conn: &mut SqliteConnection, payment_id: &str) -> DbResult<u64> {
    debug!(id = %payment_id, "Deleting payment");

    let result = sqlx::query("DELETE FROM payments WHERE id = ?1")
        .bind(payment_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
