//! # Barber POS Command Line
//!
//! Records sales and prints the dashboard's numbers.
//!
//! ## Usage
//! ```bash
//! # A haircut for Rui by João
//! barber service haircut --client Rui --barber joao
//!
//! # Two pots of pomade
//! barber product pomade --quantity 2 --barber miguel
//!
//! # Today's totals, then Pedro's week
//! barber summary
//! barber summary --window this_week --barber pedro
//!
//! # Undo a mistaken entry
//! barber reverse 5b0c... --reason "wrong barber"
//! ```
//!
//! Configuration is read from `barber.toml` (see `barber config`) and
//! `BARBER_*` environment variables. Set `RUST_LOG` to change log output,
//! which goes to stderr.

use anyhow::Context;
use barber_core::{Barber, ProductDefinition, ReversalRequest, SaleRequest, Scope, ServiceDefinition, WindowKind};
use barber_engine::{Engine, EngineConfig};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "barber", version, about = "Barbershop point of sale")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record a performed service
    Service {
        service_id: String,
        #[arg(long)]
        client: String,
        #[arg(long)]
        barber: String,
        #[arg(long)]
        notes: Option<String>,
        /// Minutes spent, for the barber's own records
        #[arg(long)]
        duration: Option<i64>,
    },

    /// Record a product sale
    Product {
        product_id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
        #[arg(long)]
        barber: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Reverse an earlier sale
    Reverse {
        transaction_id: String,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Revenue and commission for a window
    Summary {
        /// today | this_week
        #[arg(short, long, default_value = "today")]
        window: WindowKind,
        /// Limit to one barber
        #[arg(long)]
        barber: Option<String>,
    },

    /// Every barber's totals, highest revenue first
    Leaderboard {
        #[arg(short, long, default_value = "today")]
        window: WindowKind,
    },

    /// Latest transactions
    Recent {
        #[arg(long)]
        barber: Option<String>,
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },

    /// Current stock of a product
    Stock { product_id: String },

    /// Add received units to a product
    Restock { product_id: String, quantity: i64 },

    /// List services, products and barbers
    Catalog,

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Serialize)]
struct CatalogView {
    services: Vec<ServiceDefinition>,
    products: Vec<ProductDefinition>,
    barbers: Vec<Barber>,
}

#[derive(Debug, Serialize)]
struct StockView<'a> {
    product_id: &'a str,
    stock: i64,
}

fn scope(barber: Option<String>) -> Scope {
    barber.map_or(Scope::AllBarbers, Scope::Barber)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config).context("loading configuration")?;

    if let Command::Config = cli.command {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    debug!(path = %config.database.path.display(), "Opening engine");
    let engine = Engine::open(config).await.context("opening barber database")?;

    let result = run(&engine, cli.command).await;
    engine.close().await;
    result
}

async fn run(engine: &Engine, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Service {
            service_id,
            client,
            barber,
            notes,
            duration,
        } => {
            let record = engine
                .record(SaleRequest::Service {
                    service_id,
                    client_name: client,
                    barber_id: barber,
                    notes,
                    duration_minutes: duration,
                })
                .await?;
            print_json(&record)
        }

        Command::Product {
            product_id,
            quantity,
            barber,
            notes,
        } => {
            let record = engine
                .record(SaleRequest::Product {
                    product_id,
                    quantity,
                    barber_id: barber,
                    notes,
                })
                .await?;
            print_json(&record)
        }

        Command::Reverse {
            transaction_id,
            reason,
        } => {
            let reversal = engine
                .reverse(ReversalRequest {
                    transaction_id,
                    reason,
                })
                .await?;
            print_json(&reversal)
        }

        Command::Summary { window, barber } => {
            let summary = engine.summarize(window, scope(barber)).await?;
            print_json(&summary)
        }

        Command::Leaderboard { window } => print_json(&engine.leaderboard(window).await?),

        Command::Recent { barber, limit } => {
            print_json(&engine.recent(&scope(barber), limit).await?)
        }

        Command::Stock { product_id } => {
            let stock = engine.stock(&product_id).await?;
            print_json(&StockView {
                product_id: &product_id,
                stock,
            })
        }

        Command::Restock {
            product_id,
            quantity,
        } => {
            let stock = engine.restock(&product_id, quantity).await?;
            print_json(&StockView {
                product_id: &product_id,
                stock,
            })
        }

        Command::Catalog => {
            let catalog = engine.catalog();
            print_json(&CatalogView {
                services: catalog.list_services().await?,
                products: catalog.list_products().await?,
                barbers: catalog.list_barbers().await?,
            })
        }

        // handled before the engine opens
        Command::Config => Ok(()),
    }
}

/// Initializes the tracing subscriber on stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=barber_engine=trace` - Trace the engine only
/// - Default: info, debug for the barber crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,barber=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_summary() {
        let cli = Cli::parse_from(["barber", "summary", "--window", "week", "--barber", "joao"]);
        match cli.command {
            Command::Summary { window, barber } => {
                assert_eq!(window, WindowKind::ThisWeek);
                assert_eq!(barber.as_deref(), Some("joao"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_product_defaults_to_one_unit() {
        let cli = Cli::parse_from(["barber", "product", "pomade", "--barber", "miguel"]);
        assert!(matches!(cli.command, Command::Product { quantity: 1, .. }));
    }

    #[test]
    fn test_scope_from_flag() {
        assert_eq!(scope(None), Scope::AllBarbers);
        assert_eq!(scope(Some("pedro".into())), Scope::Barber("pedro".into()));
    }
}
