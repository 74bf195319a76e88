//! # Catalog Seeder
//!
//! Loads the shop's default catalog into a database.
//!
//! ## Usage
//! ```bash
//! # Seed ./barber_dev.db
//! cargo run -p barber-db --bin seed
//!
//! # Specify database path
//! cargo run -p barber-db --bin seed -- --db ./data/barber.db
//! ```
//!
//! Re-running is safe: names and prices are refreshed, existing stock is
//! left alone.

use barber_core::validation::validate_catalog_seed;
use barber_core::CatalogSeed;
use barber_db::{Database, DbConfig};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Seed the default barbershop catalog")]
struct Args {
    /// Database file path
    #[arg(short, long, default_value = "./barber_dev.db")]
    db: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args = Args::parse();

    println!("Barber POS catalog seeder");
    println!("Database: {}", args.db);

    let seed = CatalogSeed::default();
    validate_catalog_seed(&seed)?;

    let db = Database::new(DbConfig::new(&args.db)).await?;
    let report = db.catalog().upsert_seed(&seed).await?;

    println!(
        "✓ {} services, {} products, {} barbers",
        report.services, report.products, report.barbers
    );

    for product in db.catalog().list_products().await? {
        println!("  {:<24} stock {:>4}", product.name, product.stock);
    }

    db.close().await;
    Ok(())
}
