//! # barber-core: Pure Business Logic for Barber POS
//!
//! This crate is the **heart** of the barbershop point of sale. It contains
//! the pricing, validation and aggregation rules as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Barber POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Dashboard / barber-cli (presentation)              │   │
//! │  │    Service entry ──► Product sale ──► Today's revenue          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ SaleRequest / summarize()             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    barber-engine                                │   │
//! │  │    StockGuard, TransactionLedger, Summarizer strategies         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ barber-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │  window   │  │ validation│  │   │
//! │  │   │  Catalog  │  │ Breakdown │  │  Today    │  │   rules   │  │   │
//! │  │   │  Record   │  │ VAT/Comm. │  │  ThisWeek │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    barber-db (Database Layer)                   │   │
//! │  │              SQLite ledger, catalog, migrations                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog entries, sale requests, ledger records, aggregates
//! - [`money`] - Money and Rate types with integer arithmetic
//! - [`pricing`] - VAT and commission breakdowns
//! - [`window`] - "Today" and "this week" boundaries in a reference zone
//! - [`catalog`] - Catalog seed data (the shop's default reference set)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use barber_core::money::{Money, Rate};
//! use barber_core::pricing::{PricingCalculator, PricingConfig};
//!
//! let calculator = PricingCalculator::new(PricingConfig::default()).unwrap();
//!
//! // €35.00 haircut at 23% VAT, 20% commission
//! let breakdown = calculator.compute_breakdown(Money::from_cents(3500)).unwrap();
//! assert_eq!(breakdown.vat_amount.cents(), 805);
//! assert_eq!(breakdown.total_price.cents(), 4305);
//! assert_eq!(breakdown.commission.cents(), 700);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;
pub mod window;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::CatalogSeed;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Rate};
pub use pricing::{PriceBreakdown, PricingCalculator, PricingConfig};
pub use types::*;
pub use window::{ReferenceZone, WindowBounds};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default VAT rate in basis points (23%).
pub const DEFAULT_VAT_RATE_BPS: u32 = 2300;

/// Default barber commission rate in basis points (20%).
pub const DEFAULT_COMMISSION_RATE_BPS: u32 = 2000;

/// Maximum quantity of a single product in one sale.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 100 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest base price accepted by the pricing calculator (€1,000,000.00).
///
/// Keeps every monetary product far away from `i64` limits.
pub const MAX_BASE_PRICE_CENTS: i64 = 100_000_000;
