//! # emporium-core: Pure Business Logic for Emporium
//!
//! This crate is the **heart** of the Emporium retail backend. It contains
//! all business rules as pure types and functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                      Emporium Architecture                           │
//! │                                                                      │
//! │  ┌────────────────────────────────────────────────────────────────┐  │
//! │  │                  emporium-engine (workflows)                   │  │
//! │  │    InventoryLedger ── OrderWorkflow ── PaymentWorkflow         │  │
//! │  └─────────────────────────────┬──────────────────────────────────┘  │
//! │                                │                                     │
//! │  ┌─────────────────────────────▼──────────────────────────────────┐  │
//! │  │               ★ emporium-core (THIS CRATE) ★                   │  │
//! │  │                                                                │  │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐ ┌─────────┐  │  │
//! │  │  │  types  │ │  money  │ │validation│ │ policy │ │ events  │  │  │
//! │  │  │ Order   │ │  Money  │ │  rules   │ │ Actor  │ │ Domain  │  │  │
//! │  │  │ Payment │ │ totals  │ │  checks  │ │ roles  │ │ Event   │  │  │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └────────┘ └─────────┘  │  │
//! │  │                                                                │  │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │  │
//! │  └─────────────────────────────┬──────────────────────────────────┘  │
//! │                                │                                     │
//! │  ┌─────────────────────────────▼──────────────────────────────────┐  │
//! │  │                 emporium-db (Database Layer)                   │  │
//! │  │            SQLite queries, migrations, repositories            │  │
//! │  └────────────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Store, Product, Order, Payment, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`policy`] - Role and store-scope authorization checks
//! - [`events`] - Domain event payloads and the `EventNotifier` trait
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic, same input = same output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod events;
pub mod money;
pub mod policy;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use events::{DomainEvent, EventNotifier};
pub use money::Money;
pub use policy::Actor;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single order.
///
/// ## Business Reason
/// Prevents runaway requests and keeps transaction sizes reasonable.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Prefix for human-readable order numbers (`ORD-4F7A21BC`).
pub const ORDER_NUMBER_PREFIX: &str = "ORD";

/// Prefix for human-facing payment invoice numbers (`INV-9C01D4AE`).
pub const INVOICE_NUMBER_PREFIX: &str = "INV";
