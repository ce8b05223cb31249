//! # Authorization Policy
//!
//! Centralizes every role and store-scope capability check consulted by the
//! workflow entry points.
//!
//! ## Capability Matrix
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  Operation                 admin   store_manager   seller   cashier  │
//! │  ────────────────────      ─────   ─────────────   ──────   ───────  │
//! │  create order              ─       ─               own      ─        │
//! │  update / cancel order     all     own store       own      own      │
//! │  create/complete payment   ─       ─               ─        own      │
//! │  catalogue CRUD            all     own store       ─        ─        │
//! │  stock adjustment          all     own store       own      own      │
//! │  observe store events      all     own store       own      own      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checks run before any transactional work; a failed check is a pure
//! `Unauthorized` with nothing touched.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Role, User};

// =============================================================================
// Actor
// =============================================================================

/// The authenticated caller identity, as the policy sees it.
///
/// How the identity was authenticated is outside this core; callers hand in
/// an `Actor` and the policy only reasons about role and store scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    /// Admins may be store-less; every other role has a home store.
    pub store_id: Option<String>,
    pub role: Role,
}

impl Actor {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True when the actor's home store is `store_id`.
    pub fn belongs_to(&self, store_id: &str) -> bool {
        self.store_id.as_deref() == Some(store_id)
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            user_id: user.id.clone(),
            store_id: user.store_id.clone(),
            role: user.role,
        }
    }
}

// =============================================================================
// Capability Checks
// =============================================================================

/// Order creation is restricted to sellers.
pub fn require_seller(actor: &Actor) -> CoreResult<()> {
    if actor.role == Role::Seller {
        Ok(())
    } else {
        Err(CoreError::unauthorized("only sellers may create orders"))
    }
}

/// Payment recording and completion is restricted to cashiers.
pub fn require_cashier(actor: &Actor) -> CoreResult<()> {
    if actor.role == Role::Cashier {
        Ok(())
    } else {
        Err(CoreError::unauthorized(
            "only cashiers may record or complete payments",
        ))
    }
}

/// Admins pass everywhere; everyone else only within their home store.
///
/// This is the cross-store barrier: every workflow that loads an entity
/// checks its owning store against the actor before doing anything else.
pub fn require_store_access(actor: &Actor, store_id: &str) -> CoreResult<()> {
    if actor.is_admin() || actor.belongs_to(store_id) {
        Ok(())
    } else {
        Err(CoreError::unauthorized(
            "resource belongs to another store",
        ))
    }
}

/// Catalogue mutation (stores, categories, products) requires admin or a
/// store manager acting on their own store.
pub fn require_catalog_manager(actor: &Actor, store_id: &str) -> CoreResult<()> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::StoreManager if actor.belongs_to(store_id) => Ok(()),
        _ => Err(CoreError::unauthorized(
            "only admins and store managers may modify the catalogue",
        )),
    }
}

/// Payment refunds are restricted to admins.
pub fn require_admin(actor: &Actor) -> CoreResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(CoreError::unauthorized("admin role required"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, store: Option<&str>) -> Actor {
        Actor {
            user_id: "u-1".to_string(),
            store_id: store.map(str::to_string),
            role,
        }
    }

    #[test]
    fn test_require_seller() {
        assert!(require_seller(&actor(Role::Seller, Some("s-1"))).is_ok());
        assert!(require_seller(&actor(Role::Cashier, Some("s-1"))).is_err());
        assert!(require_seller(&actor(Role::Admin, None)).is_err());
    }

    #[test]
    fn test_require_cashier() {
        assert!(require_cashier(&actor(Role::Cashier, Some("s-1"))).is_ok());
        assert!(require_cashier(&actor(Role::Seller, Some("s-1"))).is_err());
    }

    #[test]
    fn test_store_access() {
        // Admin reaches every store, including without a home store.
        assert!(require_store_access(&actor(Role::Admin, None), "s-1").is_ok());

        // Same-store actors pass, cross-store actors fail.
        assert!(require_store_access(&actor(Role::Seller, Some("s-1")), "s-1").is_ok());
        assert!(require_store_access(&actor(Role::Seller, Some("s-2")), "s-1").is_err());
        assert!(require_store_access(&actor(Role::Cashier, None), "s-1").is_err());
    }

    #[test]
    fn test_catalog_manager() {
        assert!(require_catalog_manager(&actor(Role::Admin, None), "s-1").is_ok());
        assert!(require_catalog_manager(&actor(Role::StoreManager, Some("s-1")), "s-1").is_ok());
        assert!(require_catalog_manager(&actor(Role::StoreManager, Some("s-2")), "s-1").is_err());
        assert!(require_catalog_manager(&actor(Role::Seller, Some("s-1")), "s-1").is_err());
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&actor(Role::Admin, None)).is_ok());
        assert!(require_admin(&actor(Role::StoreManager, Some("s-1"))).is_err());
    }
}
