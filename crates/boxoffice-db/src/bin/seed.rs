//! # Seed Data Generator
//!
//! Populates the database with sample coupons for development.
//!
//! ## Usage
//! ```bash
//! # Seed into the default database
//! cargo run -p boxoffice-db --bin seed
//!
//! # Specify database path
//! cargo run -p boxoffice-db --bin seed -- --db ./data/coupons.db
//!
//! # Also generate N single-use door codes
//! cargo run -p boxoffice-db --bin seed -- --codes 25
//! ```
//!
//! ## Generated Coupons
//! A handful of named coupons covering every configuration axis (percentage
//! and fixed, cart and per-ticket, windows, caps, restrictions), plus an
//! optional batch of generated single-use codes like a box office would hand
//! out at the door.

use chrono::{Duration, Utc};
use std::env;

use boxoffice_core::{AppliesTo, Discount, DiscountType, SystemClock, UNLIMITED_USES};
use boxoffice_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./boxoffice_dev.db");
    let mut generated_codes: usize = 10;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--codes" | "-c" => {
                if i + 1 < args.len() {
                    generated_codes = args[i + 1].parse().unwrap_or(10);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Box Office Coupons Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: ./boxoffice_dev.db)");
                println!("  -c, --codes <N>     Single-use codes to generate (default: 10)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🎟  Box Office Coupons Seed Data Generator");
    println!("==========================================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing coupons
    let existing = db.discounts().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} discounts", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Inserting named coupons...");

    let repo = db.discounts();
    let mut inserted = 0;
    for discount in sample_discounts() {
        if let Err(e) = repo.insert(&discount).await {
            eprintln!("Failed to insert {}: {}", discount.code, e);
            continue;
        }
        println!("  {} - {}", discount.code, discount.title);
        inserted += 1;
    }

    println!();
    println!("Generating {} single-use codes...", generated_codes);

    for _ in 0..generated_codes {
        let mut discount = repo.create(&SystemClock).await?;
        // Entity defaults: max_uses = 1, no value yet. Give them a small
        // fixed amount so they do something out of the box.
        discount.amount = 200; // $2.00 off
        repo.update(&discount).await?;
        inserted += 1;
    }

    println!();
    println!("✓ Seeded {} discounts", inserted);

    Ok(())
}

/// Named sample coupons covering the configuration axes.
fn sample_discounts() -> Vec<Discount> {
    let now = Utc::now();

    let mut welcome = Discount::new("WELCOME10", now);
    welcome.title = "10% off for new customers".into();
    welcome.discount_type = DiscountType::Percentage;
    welcome.amount = 1_000; // 10%
    welcome.max_uses = UNLIMITED_USES;
    welcome.once_per_email = true;

    let mut early = Discount::new("EARLYBIRD", now);
    early.title = "Early bird: $5 off".into();
    early.description = Some("Runs for the first month of sales only.".into());
    early.amount = 500;
    early.max_uses = UNLIMITED_USES;
    early.valid_till = Some(now + Duration::days(30));

    let mut group = Discount::new("GROUP-EACH2", now);
    group.title = "$2 off per ticket".into();
    group.applies_to = AppliesTo::EachTicket;
    group.amount = 200;
    group.max_uses = 100;

    let mut members = Discount::new("MEMBERS20", now);
    members.title = "Members get 20% off".into();
    members.discount_type = DiscountType::Percentage;
    members.amount = 2_000; // 20%
    members.max_uses = UNLIMITED_USES;
    members.restricted_groups = vec!["members".into()];

    let mut comp = Discount::new("PRESS-COMP", now);
    comp.title = "Press comp: free admission".into();
    comp.description = Some("Fixed amount large enough to zero any cart.".into());
    comp.amount = 1_000_000;
    comp.max_uses = 5;
    comp.once_per_email = true;

    vec![welcome, early, group, members, comp]
}
