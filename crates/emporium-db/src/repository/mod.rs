//! # Repository Implementations
//!
//! One module per aggregate. Each module exposes two shapes, per the split
//! between reads and transactional mutation:
//!
//! - a pool-holding repository struct for reads (and standalone CRUD writes
//!   that need no cross-entity atomicity), and
//! - free command functions taking `&mut SqliteConnection`, which the engine
//!   composes into a single transaction per workflow operation.

pub mod category;
pub mod inventory;
pub mod order;
pub mod payment;
pub mod product;
pub mod store;
pub mod user;

use uuid::Uuid;

/// Generates a new entity ID (UUID v4, string form).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a short uppercase suffix for business identifiers
/// (`ORD-4F7A21BC`, `INV-9C01D4AE`).
///
/// Eight hex chars of a fresh UUID v4: unique enough in practice, and the
/// UNIQUE index on the column catches the rare collision as a
/// `DbError::UniqueViolation`.
pub fn generate_reference(prefix: &str) -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, raw[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_reference_shape() {
        let reference = generate_reference("ORD");
        assert!(reference.starts_with("ORD-"));
        assert_eq!(reference.len(), 12);
        assert!(reference[4..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_id_is_uuid() {
        assert!(Uuid::parse_str(&generate_id()).is_ok());
    }
}
