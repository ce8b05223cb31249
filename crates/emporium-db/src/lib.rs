//! # emporium-db: Database Layer for Emporium
//!
//! This crate provides database access for the Emporium retail backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                       Emporium Data Flow                             │
//! │                                                                      │
//! │  emporium-engine (workflow, one transaction per operation)           │
//! │       │                                                              │
//! │       ▼                                                              │
//! │  ┌────────────────────────────────────────────────────────────────┐  │
//! │  │                    emporium-db (THIS CRATE)                    │  │
//! │  │                                                                │  │
//! │  │   ┌──────────────┐   ┌───────────────┐   ┌────────────────┐   │  │
//! │  │   │   Database   │   │ Repositories  │   │   Migrations   │   │  │
//! │  │   │  (pool.rs)   │   │ reads: struct │   │   (embedded)   │   │  │
//! │  │   │              │◄──│ writes: free  │   │ 001_initial... │   │  │
//! │  │   │  SqlitePool  │   │ fns taking a  │   │                │   │  │
//! │  │   │  WAL + FKs   │   │ connection    │   │                │   │  │
//! │  │   └──────────────┘   └───────────────┘   └────────────────┘   │  │
//! │  └────────────────────────────────────────────────────────────────┘  │
//! │       │                                                              │
//! │       ▼                                                              │
//! │  SQLite database file (or :memory: in tests)                         │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-aggregate reads and transactional commands

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::category::CategoryRepository;
pub use repository::order::OrderRepository;
pub use repository::payment::PaymentRepository;
pub use repository::product::ProductRepository;
pub use repository::store::StoreRepository;
pub use repository::user::UserRepository;
