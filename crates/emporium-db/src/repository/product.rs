//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Stock Is Off-Limits Here
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  products.stock_quantity is mutated ONLY through the guarded         │
//! │  commands in repository::inventory, driven by the inventory ledger.  │
//! │                                                                      │
//! │  This repository reads stock but its update() never writes it, so    │
//! │  a catalogue edit can never race a concurrent reservation.           │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use emporium_core::Product;

const PRODUCT_COLUMNS: &str = "id, store_id, category_id, sku, name, description, price_cents, \
     cost_price_cents, stock_quantity, min_stock_level, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products of one store with optional filters.
    ///
    /// ## Arguments
    /// * `store_id` - owning store
    /// * `search` - optional substring match against name or SKU
    /// * `low_stock_only` - restrict to `stock_quantity <= min_stock_level`
    /// * `limit` - maximum results
    pub async fn list_for_store(
        &self,
        store_id: &str,
        search: Option<&str>,
        low_stock_only: bool,
        limit: u32,
    ) -> DbResult<Vec<Product>> {
        debug!(store_id = %store_id, search = ?search, low_stock_only, "Listing products");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 AND store_id = "
        ));
        qb.push_bind(store_id);

        if let Some(term) = search {
            let pattern = format!("%{}%", term.trim());
            qb.push(" AND (name LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR sku LIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        if low_stock_only {
            qb.push(" AND stock_quantity <= min_stock_level");
        }

        qb.push(" ORDER BY name LIMIT ");
        qb.push_bind(limit);

        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, store_id = %product.store_id, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, store_id, category_id, sku, name, description,
                price_cents, cost_price_cents, stock_quantity, min_stock_level,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.store_id)
        .bind(&product.category_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_price_cents)
        .bind(product.stock_quantity)
        .bind(product.min_stock_level)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a product's catalogue fields.
    ///
    /// Deliberately does NOT touch `stock_quantity`; stock moves only
    /// through the inventory commands.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                category_id = ?2,
                sku = ?3,
                name = ?4,
                description = ?5,
                price_cents = ?6,
                cost_price_cents = ?7,
                min_stock_level = ?8,
                is_active = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.category_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_price_cents)
        .bind(product.min_stock_level)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// Historical order items still reference this product.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics and seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transactional Reads
// =============================================================================

/// Loads a product inside an open transaction.
///
/// Order creation reads each line's product through the transaction
/// connection so the price snapshot and the stock decrement observe the
/// same state.
pub async fn get_for_update(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}
