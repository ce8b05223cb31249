//! # Seed Data Generator
//!
//! Populates the database with development fixtures: two stores, shared
//! categories, one user per role per store, and a product catalogue.
//!
//! ## Usage
//! ```bash
//! # Default catalogue (200 products per store)
//! cargo run -p emporium-db --bin seed
//!
//! # Custom amount / database path
//! cargo run -p emporium-db --bin seed -- --count 500 --db ./emporium_dev.db
//! ```

use chrono::Utc;
use std::env;

use emporium_core::{Category, Product, Role, Store, User};
use emporium_db::repository::generate_id;
use emporium_db::{Database, DbConfig};

/// Product name stems per category, combined with size variants below.
const CATALOGUE: &[(&str, &[&str])] = &[
    (
        "Beverages",
        &[
            "Cola", "Lemon Soda", "Orange Juice", "Apple Juice", "Mineral Water",
            "Iced Tea", "Energy Drink", "Coffee", "Drinking Yogurt", "Lemonade",
        ],
    ),
    (
        "Snacks",
        &[
            "Potato Chips", "Tortilla Chips", "Salted Peanuts", "Chocolate Bar",
            "Biscuits", "Crackers", "Gummy Bears", "Popcorn", "Granola Bar", "Pretzels",
        ],
    ),
    (
        "Household",
        &[
            "Dish Soap", "Laundry Detergent", "Paper Towels", "Trash Bags",
            "Sponges", "Glass Cleaner", "Matches", "Candles", "Batteries", "Light Bulb",
        ],
    ),
    (
        "Grocery",
        &[
            "White Rice", "Brown Rice", "Spaghetti", "Penne", "Wheat Flour",
            "Sugar", "Salt", "Cooking Oil", "Canned Tomatoes", "Canned Beans",
        ],
    ),
];

const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 150),
    ("Large", 300),
    ("Family Pack", 600),
    ("6-Pack", 450),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./emporium_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Emporium Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Products per store (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./emporium_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Emporium Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Products per store: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("Database already has {} products, skipping seed.", existing);
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    // Categories are shared across stores.
    let now = Utc::now();
    let mut category_ids = Vec::new();
    for (name, _) in CATALOGUE {
        let category = Category {
            id: generate_id(),
            name: name.to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        };
        db.categories().insert(&category).await?;
        category_ids.push(category.id);
    }
    println!("Seeded {} categories", category_ids.len());

    let start = std::time::Instant::now();
    let mut generated = 0;

    for store_idx in 0..2 {
        let store = Store {
            id: generate_id(),
            name: format!("Emporium Store {:02}", store_idx + 1),
            address: Some(format!("{} Market Street", 100 + store_idx)),
            phone: Some(format!("+1555000{:04}", store_idx + 1)),
            email: Some(format!("store{:02}@emporium.example", store_idx + 1)),
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.stores().insert(&store).await?;
        println!("Seeded {}", store.name);

        for role in [Role::StoreManager, Role::Seller, Role::Cashier] {
            let label = match role {
                Role::StoreManager => "manager",
                Role::Seller => "seller",
                Role::Cashier => "cashier",
                Role::Admin => unreachable!(),
            };
            let user = User {
                id: generate_id(),
                store_id: Some(store.id.clone()),
                name: format!("{} {}", capitalize(label), store_idx + 1),
                email: format!("{}{:02}@emporium.example", label, store_idx + 1),
                role,
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            db.users().insert(&user).await?;
        }

        let mut seed = store_idx * 10_000;
        'catalogue: for (cat_idx, (_, names)) in CATALOGUE.iter().enumerate() {
            for name in names.iter() {
                for (size, price_addon) in SIZES.iter() {
                    if generated >= count * (store_idx + 1) {
                        break 'catalogue;
                    }

                    seed += 1;
                    let product = build_product(
                        &store.id,
                        &category_ids[cat_idx],
                        store_idx,
                        name,
                        size,
                        *price_addon,
                        seed,
                    );
                    db.products().insert(&product).await?;
                    generated += 1;
                }
            }
        }
    }

    // One store-less admin oversees everything.
    let admin = User {
        id: generate_id(),
        store_id: None,
        name: "Admin".to_string(),
        email: "admin@emporium.example".to_string(),
        role: Role::Admin,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.users().insert(&admin).await?;

    let elapsed = start.elapsed();
    println!();
    println!("Seeded {} products in {:?}", generated, elapsed);
    println!("Seed complete.");

    Ok(())
}

/// Builds a single product with deterministic pseudo-random fields.
fn build_product(
    store_id: &str,
    category_id: &str,
    store_idx: usize,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> Product {
    let now = Utc::now();

    let sku = format!(
        "S{}-{}-{:04}",
        store_idx + 1,
        name.split_whitespace()
            .next()
            .unwrap_or("X")
            .to_uppercase(),
        seed
    );

    // Base price 1.99 - 9.99 plus the size addon
    let base_price = 199 + ((seed * 17) % 800) as i64;
    let price_cents = base_price + price_addon;

    // Cost at 60-80% of price
    let cost_pct = 60 + (seed % 20) as i64;
    let cost_price_cents = Some(price_cents * cost_pct / 100);

    Product {
        id: generate_id(),
        store_id: store_id.to_string(),
        category_id: category_id.to_string(),
        sku,
        name: format!("{} {}", name, size),
        description: None,
        price_cents,
        cost_price_cents,
        stock_quantity: (seed % 101) as i64,
        min_stock_level: (seed % 11) as i64,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
