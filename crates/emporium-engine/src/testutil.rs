//! Shared fixtures for the workflow unit tests.

use chrono::Utc;

use emporium_core::policy::Actor;
use emporium_core::{Category, Product, Role, Store, User};
use emporium_db::repository::generate_id;
use emporium_db::{Database, DbConfig};

/// An in-memory database with one store, one category, one user per role,
/// and ready-made actors. A second actor (`outsider`) claims a store that
/// also exists but owns nothing, for cross-store policy tests.
pub(crate) struct Fixture {
    pub db: Database,
    pub store: Store,
    pub other_store: Store,
    pub category: Category,
    pub admin: Actor,
    pub manager: Actor,
    pub seller: Actor,
    pub cashier: Actor,
    pub outsider: Actor,
}

pub(crate) async fn fixture() -> Fixture {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let now = Utc::now();

    let store = Store {
        id: generate_id(),
        name: "Test Store".to_string(),
        address: None,
        phone: None,
        email: None,
        description: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.stores().insert(&store).await.unwrap();

    let other_store = Store {
        id: generate_id(),
        name: "Other Store".to_string(),
        address: None,
        phone: None,
        email: None,
        description: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.stores().insert(&other_store).await.unwrap();

    let category = Category {
        id: generate_id(),
        name: "General".to_string(),
        description: None,
        created_at: now,
        updated_at: now,
    };
    db.categories().insert(&category).await.unwrap();

    let mut actors = Vec::new();
    for (role, email) in [
        (Role::Admin, "admin@test.example"),
        (Role::StoreManager, "manager@test.example"),
        (Role::Seller, "seller@test.example"),
        (Role::Cashier, "cashier@test.example"),
    ] {
        let user = User {
            id: generate_id(),
            store_id: if role == Role::Admin {
                None
            } else {
                Some(store.id.clone())
            },
            name: email.split('@').next().unwrap().to_string(),
            email: email.to_string(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.users().insert(&user).await.unwrap();
        actors.push(Actor::from(&user));
    }

    let outsider = Actor {
        user_id: generate_id(),
        store_id: Some(other_store.id.clone()),
        role: Role::Seller,
    };

    let mut actors = actors.into_iter();
    Fixture {
        db,
        store,
        other_store,
        category,
        admin: actors.next().unwrap(),
        manager: actors.next().unwrap(),
        seller: actors.next().unwrap(),
        cashier: actors.next().unwrap(),
        outsider,
    }
}

pub(crate) async fn seed_product(
    db: &Database,
    store_id: &str,
    category_id: &str,
    sku: &str,
    price_cents: i64,
    stock: i64,
) -> Product {
    let now = Utc::now();
    let product = Product {
        id: generate_id(),
        store_id: store_id.to_string(),
        category_id: category_id.to_string(),
        sku: sku.to_string(),
        name: format!("Product {sku}"),
        description: None,
        price_cents,
        cost_price_cents: None,
        stock_quantity: stock,
        min_stock_level: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.unwrap();
    product
}
