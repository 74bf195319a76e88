//! # Domain Types
//!
//! Core domain types used throughout Barber POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Reference data (catalog)          Ledger                              │
//! │  ┌───────────────────┐            ┌──────────────────────────┐         │
//! │  │ ServiceDefinition │◄── ref_id ─│   TransactionRecord      │         │
//! │  │ ProductDefinition │            │   id (UUID), sequence    │         │
//! │  │ Barber            │◄─ barber ──│   breakdown (snapshot)   │         │
//! │  └───────────────────┘            │   reverses (Option)      │         │
//! │                                   └────────────┬─────────────┘         │
//! │  Input                                         │ fold                   │
//! │  ┌───────────────────┐            ┌────────────▼─────────────┐         │
//! │  │ SaleRequest       │            │   AggregateWindow        │         │
//! │  │ ReversalRequest   │            │   (WindowKind × Scope)   │         │
//! │  └───────────────────┘            └──────────────────────────┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A record copies the definition's name and unit price at sale time, so a
//! later price change or a retired service never rewrites history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::PriceBreakdown;
use crate::window::WindowBounds;

// =============================================================================
// Catalog
// =============================================================================

/// A service the shop performs (haircut, beard trim, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ServiceDefinition {
    pub id: String,
    pub name: String,
    /// Price before VAT, in cents.
    pub base_price_cents: i64,
}

impl ServiceDefinition {
    /// Returns the base price as Money.
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

/// A retail product sold over the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductDefinition {
    pub id: String,
    pub name: String,
    /// Unit price before VAT, in cents.
    pub base_price_cents: i64,
    /// Units on hand. Only the stock guard changes this.
    pub stock: i64,
}

impl ProductDefinition {
    /// Returns the unit base price as Money.
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }

    /// Checks if `quantity` units can be sold right now.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// A barber on the shop's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Barber {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Sale Kind
// =============================================================================

/// What a ledger record sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleKind {
    /// A performed service (quantity is always 1).
    Service,
    /// A product sale (quantity ≥ 1, decrements stock).
    Product,
}

impl std::fmt::Display for SaleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaleKind::Service => write!(f, "service"),
            SaleKind::Product => write!(f, "product"),
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// A confirmed sale coming from the presentation layer.
///
/// `notes` and `duration_minutes` are carried onto the record as entered;
/// they never influence pricing or aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaleRequest {
    Service {
        service_id: String,
        client_name: String,
        barber_id: String,
        #[serde(default)]
        notes: Option<String>,
        #[serde(default)]
        duration_minutes: Option<i64>,
    },
    Product {
        product_id: String,
        quantity: i64,
        barber_id: String,
        #[serde(default)]
        notes: Option<String>,
    },
}

impl SaleRequest {
    /// Convenience constructor for a service sale without optional fields.
    pub fn service(
        service_id: impl Into<String>,
        client_name: impl Into<String>,
        barber_id: impl Into<String>,
    ) -> Self {
        SaleRequest::Service {
            service_id: service_id.into(),
            client_name: client_name.into(),
            barber_id: barber_id.into(),
            notes: None,
            duration_minutes: None,
        }
    }

    /// Convenience constructor for a product sale without notes.
    pub fn product(
        product_id: impl Into<String>,
        quantity: i64,
        barber_id: impl Into<String>,
    ) -> Self {
        SaleRequest::Product {
            product_id: product_id.into(),
            quantity,
            barber_id: barber_id.into(),
            notes: None,
        }
    }

    pub fn kind(&self) -> SaleKind {
        match self {
            SaleRequest::Service { .. } => SaleKind::Service,
            SaleRequest::Product { .. } => SaleKind::Product,
        }
    }

    pub fn barber_id(&self) -> &str {
        match self {
            SaleRequest::Service { barber_id, .. } | SaleRequest::Product { barber_id, .. } => {
                barber_id
            }
        }
    }

    /// The catalog id the request points at.
    pub fn ref_id(&self) -> &str {
        match self {
            SaleRequest::Service { service_id, .. } => service_id,
            SaleRequest::Product { product_id, .. } => product_id,
        }
    }

    /// Units sold (always 1 for a service).
    pub fn quantity(&self) -> i64 {
        match self {
            SaleRequest::Service { .. } => 1,
            SaleRequest::Product { quantity, .. } => *quantity,
        }
    }
}

/// A correction of an earlier sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReversalRequest {
    pub transaction_id: String,
    /// Stored as the reversal's notes.
    #[serde(default)]
    pub reason: Option<String>,
}

// =============================================================================
// Transaction Record
// =============================================================================

/// One completed sale in the ledger. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionRecord {
    /// UUID v4.
    pub id: String,
    /// Insertion sequence assigned by the store; breaks timestamp ties.
    pub sequence: i64,
    pub kind: SaleKind,
    /// Service or product id at time of sale.
    pub ref_id: String,
    /// Service or product name at time of sale (frozen).
    pub ref_name: String,
    /// Client served (services only).
    pub client_name: Option<String>,
    pub quantity: i64,
    /// Unit base price at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Line totals: per-unit breakdown × quantity, rounded once.
    pub breakdown: PriceBreakdown,
    pub barber_id: String,
    pub notes: Option<String>,
    pub duration_minutes: Option<i64>,
    /// Id of the record this one reverses.
    pub reverses: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn is_reversal(&self) -> bool {
        self.reverses.is_some()
    }

    /// +1 for a service sale, -1 for a service reversal, 0 for products.
    pub fn net_services(&self) -> i64 {
        match (self.kind, self.is_reversal()) {
            (SaleKind::Service, false) => 1,
            (SaleKind::Service, true) => -1,
            (SaleKind::Product, _) => 0,
        }
    }

    /// Units sold, negative for a product reversal, 0 for services.
    pub fn net_units(&self) -> i64 {
        match (self.kind, self.is_reversal()) {
            (SaleKind::Product, false) => self.quantity,
            (SaleKind::Product, true) => -self.quantity,
            (SaleKind::Service, _) => 0,
        }
    }
}

// =============================================================================
// Aggregation
// =============================================================================

/// The time window a summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Since local midnight.
    Today,
    /// Since the most recent Monday, local midnight.
    ThisWeek,
}

impl WindowKind {
    pub const ALL: [WindowKind; 2] = [WindowKind::Today, WindowKind::ThisWeek];
}

impl std::str::FromStr for WindowKind {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" | "day" => Ok(WindowKind::Today),
            "this_week" | "week" => Ok(WindowKind::ThisWeek),
            other => Err(crate::error::ValidationError::InvalidFormat {
                field: "window".to_string(),
                reason: format!("unknown window '{}', expected today or week", other),
            }),
        }
    }
}

/// Whose sales a summary covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    AllBarbers,
    Barber(String),
}

impl Scope {
    /// Checks if a record belongs to this scope.
    pub fn includes(&self, record: &TransactionRecord) -> bool {
        match self {
            Scope::AllBarbers => true,
            Scope::Barber(id) => record.barber_id == *id,
        }
    }

    /// The barber filter, if any.
    pub fn barber_id(&self) -> Option<&str> {
        match self {
            Scope::AllBarbers => None,
            Scope::Barber(id) => Some(id),
        }
    }
}

/// A windowed summary of the ledger.
///
/// Always reconstructible from the records; never stored as truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AggregateWindow {
    pub window: WindowKind,
    pub scope: Scope,
    #[ts(as = "String")]
    pub window_start: DateTime<Utc>,
    #[ts(as = "String")]
    pub window_end: DateTime<Utc>,
    /// Σ total_price (VAT included).
    pub total_revenue: Money,
    pub total_commission: Money,
    /// Ledger records in the window, reversals included.
    pub transaction_count: i64,
    /// Net service sales.
    pub service_count: i64,
    /// Net product units sold.
    pub product_units: i64,
}

impl AggregateWindow {
    /// An empty summary for the given window.
    pub fn empty(window: WindowKind, scope: Scope, bounds: WindowBounds) -> Self {
        AggregateWindow {
            window,
            scope,
            window_start: bounds.start,
            window_end: bounds.end,
            total_revenue: Money::zero(),
            total_commission: Money::zero(),
            transaction_count: 0,
            service_count: 0,
            product_units: 0,
        }
    }

    /// Folds one record into the totals, unconditionally.
    ///
    /// Callers decide membership with [`AggregateWindow::admits`].
    pub fn apply(&mut self, record: &TransactionRecord) {
        self.total_revenue += record.breakdown.total_price;
        self.total_commission += record.breakdown.commission;
        self.transaction_count += 1;
        self.service_count += record.net_services();
        self.product_units += record.net_units();
    }

    /// True when the record falls in this window and scope.
    pub fn admits(&self, record: &TransactionRecord) -> bool {
        record.created_at >= self.window_start
            && record.created_at <= self.window_end
            && self.scope.includes(record)
    }

    /// Builds a summary by scanning records.
    ///
    /// This is the reference answer every aggregation strategy must match.
    pub fn from_records<'a>(
        window: WindowKind,
        scope: Scope,
        bounds: WindowBounds,
        records: impl IntoIterator<Item = &'a TransactionRecord>,
    ) -> Self {
        let mut summary = AggregateWindow::empty(window, scope, bounds);
        for record in records {
            if summary.admits(record) {
                summary.apply(record);
            }
        }
        summary
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
