//! # Seed Data Generator
//!
//! Populates a database with a small catalog and discount codes for
//! development.
//!
//! ## Usage
//! ```bash
//! cargo run -p imp-db --bin seed
//!
//! # Specify database path
//! cargo run -p imp-db --bin seed -- --db ./data/imp.db
//! ```
//!
//! ## Generated Data
//! - Three categories with physical products and stock
//! - Preorder products (no stock rows)
//! - One physical product with no stock row (fails with missing stock)
//! - Discount codes: SAVE20, TENOFF, FIVER, an expired and an inactive code

use chrono::{Duration, Utc};
use std::env;
use tracing_subscriber::EnvFilter;

use imp_core::DiscountKind;
use imp_db::{Database, DbConfig, NewProduct};

/// (category, [(product name, price in pence, stock or None for preorder)])
const CATALOG: &[(&str, &[(&str, i64, Option<i64>)])] = &[
    (
        "Trading Cards",
        &[
            ("Booster Pack", 450, Some(200)),
            ("Booster Box", 10000, Some(12)),
            ("Elite Trainer Box", 4999, Some(8)),
            ("Next Expansion Booster Box", 11000, None),
        ],
    ),
    (
        "Board Games",
        &[
            ("Settlers", 3999, Some(15)),
            ("Deck Builder", 2499, Some(3)),
            ("Legacy Campaign", 6999, None),
        ],
    ),
    (
        "Figures",
        &[
            ("Knight Miniature", 1500, Some(40)),
            ("Dragon Miniature", 3500, Some(1)),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,imp=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./imp_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Imp Checkout Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./imp_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Imp Checkout Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.catalog().count_products().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Products:");
    for (category, products) in CATALOG {
        let category_id = db.catalog().insert_category(category).await?;

        for (name, price_cents, stock) in products.iter() {
            let id = db
                .catalog()
                .insert_product(&NewProduct {
                    name: name.to_string(),
                    category_id: Some(category_id.clone()),
                    price_cents: *price_cents,
                    is_preorder: stock.is_none(),
                })
                .await?;

            match stock {
                Some(amount) => {
                    db.stock().set_level(&id, *amount).await?;
                    println!("  {id}  {name:<28} {price_cents:>6}p  stock {amount}");
                }
                None => println!("  {id}  {name:<28} {price_cents:>6}p  preorder"),
            }
        }
    }

    // Physical product nobody has counted yet
    let uncounted = db
        .catalog()
        .insert_product(&NewProduct {
            name: "Playmat".to_string(),
            category_id: None,
            price_cents: 1999,
            is_preorder: false,
        })
        .await?;
    println!("  {uncounted}  {:<28} {:>6}p  no stock row", "Playmat", 1999);

    println!();
    println!("Discount codes:");
    let now = Utc::now();
    let codes = db.discount_codes();
    codes
        .create("SAVE20", DiscountKind::Percentage, 2000, true, None)
        .await?;
    codes
        .create("TENOFF", DiscountKind::Percentage, 1000, true, Some(now + Duration::days(90)))
        .await?;
    codes
        .create("FIVER", DiscountKind::Fixed, 500, true, None)
        .await?;
    codes
        .create("SUMMER", DiscountKind::Percentage, 1500, true, Some(now - Duration::days(30)))
        .await?;
    codes
        .create("RETIRED", DiscountKind::Fixed, 1000, false, None)
        .await?;
    println!("  SAVE20 (20%), TENOFF (10%), FIVER (£5.00), SUMMER (expired), RETIRED (inactive)");

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
