//! # Domain Types
//!
//! Core domain types used throughout Emporium.
//!
//! ## Ownership Graph
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                         Domain Entities                              │
//! │                                                                      │
//! │   Store ──owns──► Product ──belongs to──► Category                   │
//! │     │                                                                │
//! │     ├──owns──► Order ──owns──► OrderItem ──snapshots──► Product      │
//! │     │            ▲                                                   │
//! │     └──owns──► Payment (bound to one Order)                          │
//! │                                                                      │
//! │   User (admin | store_manager | seller | cashier)                    │
//! │     seller  ──creates──► Order                                       │
//! │     cashier ──records──► Payment                                     │
//! │                                                                      │
//! │   StockMovement: append-only ledger of every stock delta             │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Orders and payments carry two identifiers:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID (`order_number`, `invoice_number`) - human-readable, unique

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Roles
// =============================================================================

/// User role, driving the authorization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access across every store.
    Admin,
    /// Manages catalogue and stock for one store.
    StoreManager,
    /// Creates orders for one store.
    Seller,
    /// Records and completes payments for one store.
    Cashier,
}

// =============================================================================
// Store
// =============================================================================

/// A retail location. Strictly owns its products, orders and payments;
/// deletion cascades at the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Store {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Category
// =============================================================================

/// A product category, shared across stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

/// A system user. Credentials and session state live outside this core;
/// only the identity and role needed by the policy are modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    /// Admins may be store-less; everyone else belongs to exactly one store.
    pub store_id: Option<String>,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale in one store.
///
/// `stock_quantity` is mutated only through inventory ledger operations
/// (order creation, cancellation, explicit adjustment), never directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Store this product belongs to.
    pub store_id: String,

    /// Category this product belongs to.
    pub category_id: String,

    /// Stock Keeping Unit - business identifier, unique system-wide.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Cost price in cents (for margin calculations).
    pub cost_price_cents: Option<i64>,

    /// Current stock level. Never negative.
    pub stock_quantity: i64,

    /// Threshold at or below which the product counts as low stock.
    pub min_stock_level: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Low stock is a derived predicate, never a stored flag.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock_level
    }

    /// Profit margin in percent, 0.0 when no cost price is recorded.
    pub fn margin_percent(&self) -> f64 {
        match self.cost_price_cents {
            Some(cost) if self.price_cents > 0 => {
                ((self.price_cents - cost) as f64 / self.price_cents as f64) * 100.0
            }
            _ => 0.0,
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of an order.
///
/// ```text
/// pending ──► processing ──► completed   (terminal)
///    │             │
///    └─────────────┴───────► cancelled   (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, awaiting a payment.
    Pending,
    /// A payment has been initiated.
    Processing,
    /// Paid in full. Terminal.
    Completed,
    /// Cancelled with stock restored. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Terminal states accept no further transitions.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Stable lowercase label, matching the stored representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Order Payment Status
// =============================================================================

/// Whether an order has been settled. Flips to `Paid` only in the same
/// transaction that completes the bound payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order for one store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub store_id: String,
    /// The seller who created the order.
    pub seller_id: String,
    /// The cashier assigned when a payment is initiated.
    pub cashier_id: Option<String>,
    /// Human-readable unique identifier, e.g. `ORD-4F7A21BC`.
    pub order_number: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    /// Always `max(0, subtotal + tax - discount)`, recomputed from items.
    pub total_cents: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set only on the transition to completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Completed
    }

    #[inline]
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an order.
///
/// Uses the snapshot pattern: `unit_price_cents` freezes the product price
/// at order time, so later price changes never rewrite history. Immutable
/// once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Quantity ordered, at least 1.
    pub quantity: i64,
    /// Unit price in cents at order time (frozen).
    pub unit_price_cents: i64,
    /// quantity × unit_price_cents.
    pub total_price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobileMoney,
    BankTransfer,
}

// =============================================================================
// Payment State
// =============================================================================

/// The lifecycle status of a payment.
///
/// ```text
/// pending ──► completed ──► refunded
///    │
///    └──────► failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentState {
    /// Stable lowercase label, matching the stored representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Completed => "completed",
            PaymentState::Failed => "failed",
            PaymentState::Refunded => "refunded",
        }
    }
}

impl Default for PaymentState {
    fn default() -> Self {
        PaymentState::Pending
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment bound to one order.
///
/// At most one payment may be active (pending or completed) per order: a new
/// payment is only accepted while the bound order is still pending, and
/// creating one moves the order to processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub store_id: String,
    /// The cashier who recorded the payment.
    pub cashier_id: String,
    /// Human-facing unique identifier, e.g. `INV-9C01D4AE`.
    pub invoice_number: String,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    /// External reference (card auth code, transfer id, ...).
    pub transaction_reference: Option<String>,
    pub status: PaymentState,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set on the transition to completed.
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == PaymentState::Completed
    }

    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Stock Movements
// =============================================================================

/// Why a stock movement happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    /// Stock reserved by order creation (negative delta).
    Reservation,
    /// Stock restored by order cancellation (positive delta).
    Release,
    /// Manual correction via the adjust operation.
    Adjustment,
}

/// One signed stock delta in the append-only inventory ledger.
///
/// Every reserve, release and adjustment records a movement in the same
/// transaction that mutates `stock_quantity`, making the bare counter
/// auditable after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    /// The order that caused the movement, when there is one.
    pub order_id: Option<String>,
    /// Signed change applied to `stock_quantity`.
    pub delta: i64,
    pub reason: MovementReason,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock Adjustment Operations
// =============================================================================

/// Manual stock correction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockOperation {
    /// Increment by the given quantity.
    Add,
    /// Decrement by the given quantity, clamping at zero.
    Subtract,
    /// Replace the level with the given quantity.
    Set,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_stock(stock: i64, min: i64) -> Product {
        Product {
            id: "p-1".to_string(),
            store_id: "s-1".to_string(),
            category_id: "c-1".to_string(),
            sku: "SKU-1".to_string(),
            name: "Test".to_string(),
            description: None,
            price_cents: 1000,
            cost_price_cents: Some(600),
            stock_quantity: stock,
            min_stock_level: min,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_order_status_terminal() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
        assert_eq!(PaymentState::default(), PaymentState::Pending);
    }

    #[test]
    fn test_low_stock_predicate() {
        assert!(product_with_stock(5, 5).is_low_stock());
        assert!(product_with_stock(2, 5).is_low_stock());
        assert!(!product_with_stock(6, 5).is_low_stock());
    }

    #[test]
    fn test_margin_percent() {
        let p = product_with_stock(1, 0);
        assert!((p.margin_percent() - 40.0).abs() < f64::EPSILON);

        let mut free = product_with_stock(1, 0);
        free.cost_price_cents = None;
        assert_eq!(free.margin_percent(), 0.0);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(OrderStatus::Processing.as_str(), "processing");
        assert_eq!(PaymentState::Refunded.as_str(), "refunded");
    }
}
