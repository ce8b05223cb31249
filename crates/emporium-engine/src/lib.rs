//! # emporium-engine: Order/Payment Workflows and the Inventory Ledger
//!
//! The transactional core of the Emporium retail backend: the order and
//! payment state machines, the inventory-consistency ledger, and in-process
//! domain event delivery.
//!
//! ## Architecture Position
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                     Emporium Engine Data Flow                        │
//! │                                                                      │
//! │  caller (HTTP layer, CLI, tests - out of scope)                      │
//! │       │  Actor + request DTO                                         │
//! │       ▼                                                              │
//! │  ┌────────────────────────────────────────────────────────────────┐  │
//! │  │                 emporium-engine (THIS CRATE)                   │  │
//! │  │                                                                │  │
//! │  │  policy check ──► validation ──► ONE transaction ──► publish   │  │
//! │  │                                                                │  │
//! │  │  ┌─────────────────┐  ┌───────────────┐  ┌─────────────────┐  │  │
//! │  │  │ InventoryLedger │  │ OrderWorkflow │  │ PaymentWorkflow │  │  │
//! │  │  │ reserve/release │◄─│ create/update │◄─│ create/complete │  │  │
//! │  │  │ /adjust         │  │ /cancel       │  │ /fail/refund    │  │  │
//! │  │  └─────────────────┘  └───────────────┘  └─────────────────┘  │  │
//! │  │                                                                │  │
//! │  │  ┌──────────────────────────────────────────────────────────┐  │  │
//! │  │  │ notify: BroadcastNotifier / NullNotifier / can_observe   │  │  │
//! │  │  └──────────────────────────────────────────────────────────┘  │  │
//! │  └────────────────────────────────────────────────────────────────┘  │
//! │       │                                                              │
//! │       ▼                                                              │
//! │  emporium-db (repositories, SQLite)                                  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **No oversell**: stock checks ride inside guarded UPDATE statements
//! - **All-or-nothing**: each workflow operation is one SQLite transaction
//! - **Terminal immutability**: completed orders and payments refuse change
//! - **Coupled settlement**: a completed payment and its paid order commit
//!   together; no intermediate state is observable
//! - **Post-commit events**: notification is best-effort, after commit only

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod inventory;
pub mod notify;
pub mod order;
pub mod payment;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{EngineError, EngineResult};
pub use inventory::InventoryLedger;
pub use notify::{can_observe, BroadcastNotifier, NullNotifier};
pub use order::{CreateOrderRequest, OrderLine, OrderPatch, OrderWorkflow};
pub use payment::{CreatePaymentRequest, PaymentPatch, PaymentWorkflow};
