//! # Error Types
//!
//! Domain-specific error types for emporium-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                  │
//! │                                                                      │
//! │  emporium-core errors (this file)                                    │
//! │  ├── CoreError        - Business rule violations                     │
//! │  └── ValidationError  - Input validation failures                    │
//! │                                                                      │
//! │  emporium-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                  │
//! │                                                                      │
//! │  emporium-engine errors                                              │
//! │  └── EngineError      - Domain(CoreError) | Storage(DbError)         │
//! │                                                                      │
//! │  Flow: ValidationError → CoreError → EngineError → caller            │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, ID, status, ...)
//! 3. Errors are enum variants, never String
//! 4. Business-rule violations are detected BEFORE any persistent mutation;
//!    when that is impossible (mid-loop stock reservation) the enclosing
//!    transaction rolls back in full

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every workflow failure surfaces as one of these kinds together with a
/// human-readable message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested quantity exceeds the product's available stock, or the
    /// product is inactive.
    ///
    /// ## When This Occurs
    /// - An order line asks for more than `stock_quantity`
    /// - Two concurrent orders race for the same stock and one loses
    /// - The product has been deactivated (`available` reports 0)
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// An order line references a product owned by a different store.
    #[error("Product {product_id} does not belong to store {store_id}")]
    ForeignProduct {
        product_id: String,
        store_id: String,
    },

    /// A payment can only be created while the bound order is pending.
    #[error("Order {order_id} is {status}, expected pending")]
    OrderNotPending { order_id: String, status: String },

    /// The order has reached a terminal state and refuses the operation.
    ///
    /// ## When This Occurs
    /// - Updating or cancelling a completed order
    /// - Cancelling an already cancelled order
    /// - Completing an order that was cancelled underneath its payment
    #[error("Order {order_id} is {status}, cannot perform operation")]
    OrderImmutable { order_id: String, status: String },

    /// The payment is not in the state the transition expects.
    ///
    /// ## When This Occurs
    /// - Completing or failing a payment that is no longer pending
    /// - Refunding a payment that never completed
    #[error("Payment {payment_id} is {status}, cannot perform operation")]
    PaymentNotPending { payment_id: String, status: String },

    /// Completed payments cannot be deleted.
    #[error("Payment {payment_id} is completed and cannot be deleted")]
    PaymentImmutable { payment_id: String },

    /// The actor lacks the role or store scope for the operation.
    ///
    /// Checked first, before any transactional work begins.
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Entity lookup failed.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an Unauthorized error with a reason.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        CoreError::Unauthorized {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements. Used for early
/// validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g. invalid UUID, bad SKU characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A collection is empty where at least one element is required.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "COLA-330".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for COLA-330: available 3, requested 5"
        );

        let err = CoreError::OrderImmutable {
            order_id: "o-1".to_string(),
            status: "completed".to_string(),
        };
        assert_eq!(err.to_string(), "Order o-1 is completed, cannot perform operation");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");

        let err = ValidationError::Empty {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items must contain at least one entry");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBeNonNegative {
            field: "tax_amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
