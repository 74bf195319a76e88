//! # barber-engine: Recording & Aggregation Engine for Barber POS
//!
//! Turns confirmed sales into durable ledger records and answers the
//! dashboard's "today" and "this week" questions.
//!
//! ## Component Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Engine                                     │
//! │                                                                         │
//! │   record / reverse                        summarize / leaderboard       │
//! │        │                                          │                     │
//! │        ▼                                          ▼                     │
//! │  ┌──────────────────┐   observe(record)   ┌──────────────────┐          │
//! │  │ TransactionLedger│ ──────────────────► │    Summarizer    │          │
//! │  └──┬─────────┬─────┘                     │ QueryTime or     │          │
//! │     │         │                           │ Incremental      │          │
//! │     ▼         ▼                           └────────┬─────────┘          │
//! │  ┌───────┐ ┌────────────┐                          │ query              │
//! │  │Catalog│ │ StockGuard │                          │                    │
//! │  └───┬───┘ └─────┬──────┘                          │                    │
//! │      │           │      append(record, effect)     │                    │
//! │      ▼           ▼                                 ▼                    │
//! │  ┌───────────────────────────────────────────────────────────────┐      │
//! │  │                  barber-db (SQLite, WAL)                      │      │
//! │  └───────────────────────────────────────────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use barber_core::{SaleRequest, Scope, WindowKind};
//! use barber_engine::{Engine, EngineConfig};
//!
//! let engine = Engine::open(EngineConfig::load(None)?).await?;
//! engine.record(SaleRequest::service("haircut", "Rui", "joao")).await?;
//! let today = engine.summarize(WindowKind::Today, Scope::AllBarbers).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregation;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod stock_guard;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use aggregation::{BarberSummary, IncrementalSummarizer, QueryTimeSummarizer, Summarizer};
pub use catalog::Catalog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AggregationStrategy, EngineConfig};
pub use error::{ConfigError, EngineError, EngineResult};
pub use ledger::TransactionLedger;
pub use stock_guard::StockGuard;
pub use store::LedgerStore;

use barber_core::{
    AggregateWindow, PricingCalculator, ReversalRequest, SaleRequest, Scope, TransactionRecord,
    WindowKind,
};
use barber_db::Database;
use std::sync::Arc;
use tracing::info;

// =============================================================================
// Engine
// =============================================================================

/// The point-of-sale engine: one per shop database.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    db: Database,
    catalog: Catalog,
    guard: Arc<StockGuard>,
    ledger: TransactionLedger,
    summarizer: Arc<dyn Summarizer>,
    clock: Arc<dyn Clock>,
}

impl Engine {
    /// Opens the configured database, runs migrations and loads the catalog.
    pub async fn open(config: EngineConfig) -> EngineResult<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Like [`Engine::open`] with an explicit time source.
    pub async fn open_with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> EngineResult<Self> {
        config.validate()?;
        let seed = config.catalog_seed()?;

        if !config.database.is_in_memory() {
            if let Some(parent) = config.database.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                        path: parent.display().to_string(),
                        source,
                    })?;
                }
            }
        }

        let db = Database::new(config.database.to_db_config()).await?;
        let engine = Self::with_database(db, config, clock).await?;
        engine.catalog.load_seed(&seed).await?;

        Ok(engine)
    }

    /// Builds an engine over an already open database without touching the
    /// catalog. The incremental summarizer is rebuilt from the ledger.
    pub async fn with_database(
        db: Database,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> EngineResult<Self> {
        let pricing = PricingCalculator::new(config.pricing.to_pricing_config())?;
        let zone = config.aggregation.timezone;

        let catalog = Catalog::new(db.catalog());
        let store: Arc<dyn LedgerStore> = Arc::new(db.ledger());
        let guard = Arc::new(StockGuard::new(catalog.clone()));

        let summarizer: Arc<dyn Summarizer> = match config.aggregation.strategy {
            AggregationStrategy::QueryTime => Arc::new(QueryTimeSummarizer::new(store.clone(), zone)),
            AggregationStrategy::Incremental => {
                let incremental = IncrementalSummarizer::new(store.clone(), zone);
                incremental.rebuild(clock.now()).await?;
                Arc::new(incremental)
            }
        };

        let ledger = TransactionLedger::new(
            catalog.clone(),
            guard.clone(),
            store,
            pricing,
            summarizer.clone(),
            clock.clone(),
        );

        info!(
            strategy = %config.aggregation.strategy,
            timezone = %zone,
            vat_bps = config.pricing.vat_rate_bps,
            commission_bps = config.pricing.commission_rate_bps,
            "Engine ready"
        );

        Ok(Engine {
            config,
            db,
            catalog,
            guard,
            ledger,
            summarizer,
            clock,
        })
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Records a confirmed sale. See [`TransactionLedger::record`].
    pub async fn record(&self, request: SaleRequest) -> EngineResult<TransactionRecord> {
        self.ledger.record(request).await
    }

    /// Reverses an earlier sale. See [`TransactionLedger::reverse`].
    pub async fn reverse(&self, request: ReversalRequest) -> EngineResult<TransactionRecord> {
        self.ledger.reverse(request).await
    }

    pub async fn transaction(&self, id: &str) -> EngineResult<TransactionRecord> {
        self.ledger.get(id).await
    }

    /// Latest records first, at most `limit`.
    pub async fn recent(&self, scope: &Scope, limit: i64) -> EngineResult<Vec<TransactionRecord>> {
        if let Scope::Barber(id) = scope {
            self.catalog.get_barber(id).await?;
        }
        self.ledger.recent(scope, limit).await
    }

    // =========================================================================
    // Summaries
    // =========================================================================

    /// Totals for `window` up to now.
    ///
    /// ## Errors
    /// - `NotFound` if `scope` names an unknown barber
    pub async fn summarize(&self, window: WindowKind, scope: Scope) -> EngineResult<AggregateWindow> {
        if let Scope::Barber(id) = &scope {
            self.catalog.get_barber(id).await?;
        }
        self.summarizer
            .summarize_at(window, &scope, self.clock.now())
            .await
    }

    /// Every barber's totals for `window`, highest revenue first.
    pub async fn leaderboard(&self, window: WindowKind) -> EngineResult<Vec<BarberSummary>> {
        let now = self.clock.now();
        let mut rows = Vec::new();
        for barber in self.catalog.list_barbers().await? {
            let scope = Scope::Barber(barber.id.clone());
            let summary = self.summarizer.summarize_at(window, &scope, now).await?;
            rows.push(BarberSummary { barber, summary });
        }
        Ok(aggregation::rank(rows))
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    pub async fn stock(&self, product_id: &str) -> EngineResult<i64> {
        self.guard.stock(product_id).await
    }

    /// Adds received units. Returns the new stock level.
    pub async fn restock(&self, product_id: &str, quantity: i64) -> EngineResult<i64> {
        self.guard.restock(product_id, quantity).await
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn strategy(&self) -> AggregationStrategy {
        self.summarizer.strategy()
    }

    /// Closes the connection pool.
    pub async fn close(&self) {
        self.db.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
