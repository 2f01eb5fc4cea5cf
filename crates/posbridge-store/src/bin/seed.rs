//! # Seed Data Generator
//!
//! Populates the inventory database with demo items for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 items (default)
//! cargo run -p posbridge-store --bin seed
//!
//! # Generate custom amount into a specific file
//! cargo run -p posbridge-store --bin seed -- --count 1000 --db ./data/inventory.db
//! ```
//!
//! Each item has:
//! - Random UUID id
//! - Name: `{product} {size}`
//! - Code: `{CATEGORY}-{ABC}-{NNN}`
//! - Price: $1.99 - $9.99 plus a size addon
//! - Alternate name on every third item

use posbridge_core::Item;
use posbridge_store::{Database, DbConfig};
use std::env;
use uuid::Uuid;

const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "BEV",
        &[
            "Espresso",
            "Americano",
            "Latte",
            "Cappuccino",
            "Flat White",
            "Mocha",
            "Chai Latte",
            "Hot Chocolate",
            "Iced Tea",
            "Lemonade",
        ],
    ),
    (
        "BAK",
        &[
            "Croissant",
            "Pain au Chocolat",
            "Blueberry Muffin",
            "Banana Bread",
            "Cinnamon Roll",
            "Scone",
            "Bagel",
            "Brownie",
            "Cookie",
            "Danish",
        ],
    ),
    (
        "FOD",
        &[
            "Ham Sandwich",
            "Veggie Wrap",
            "Chicken Panini",
            "Caesar Salad",
            "Soup of the Day",
            "Quiche",
            "Yogurt Parfait",
            "Fruit Cup",
            "Oatmeal",
            "Granola Bar",
        ],
    ),
];

/// (size label, price addon in cents)
const SIZES: &[(&str, i64)] = &[("Small", 0), ("Regular", 50), ("Large", 100)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut count: usize = 200;
    let mut db_path = String::from("./inventory_dev.db");

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
                println!("posbridge Inventory Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of items to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./inventory_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("posbridge Inventory Seeder");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Items:    {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0;

    'outer: for (category_idx, (category, products)) in CATEGORIES.iter().enumerate() {
        for (product_idx, product) in products.iter().enumerate() {
            for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seq = category_idx * 1000 + product_idx * 10 + size_idx;
                let item = generate_item(category, product, size, *addon, seq);

                if let Err(e) = db.items().upsert(&item).await {
                    eprintln!("Failed to insert {}: {}", item.code, e);
                    continue;
                }
                generated += 1;
            }
        }
    }

    println!();
    println!("✓ Generated {} items in {:?}", generated, start.elapsed());
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

fn generate_item(category: &str, product: &str, size: &str, addon: i64, seq: usize) -> Item {
    let abbrev: String = product
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase();

    let price = 199 + ((seq * 17) % 800) as i64 + addon;

    let alternate_name = (seq % 3 == 0).then(|| format!("{} ({})", product, size.to_lowercase()));

    Item {
        id: Uuid::new_v4().to_string(),
        name: format!("{} {}", product, size),
        price,
        code: format!("{}-{}-{:03}", category, abbrev, seq % 1000),
        alternate_name,
    }
}
