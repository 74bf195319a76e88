//! # Transaction Ledger
//!
//! Records confirmed sales and their reversals.
//!
//! ## Recording Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         record(SaleRequest)                             │
//! │                                                                         │
//! │  1. validate shape          ──► Validation (nothing written)            │
//! │  2. resolve barber + item   ──► NotFound   (nothing written)            │
//! │  3. product: reserve stock  ──► InsufficientStock (nothing written)     │
//! │  4. price the line (VAT, commission, rounded once)                      │
//! │  5. append record + stock decrement in one store transaction            │
//! │  6. release the product lock, feed the summarizer                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records are never edited or deleted. A mistaken sale is corrected by
//! appending a reversal with the negated breakdown; a product reversal puts
//! the units back on the shelf in the same atomic step.

use barber_core::validation::{validate_reason, validate_sale_request};
use barber_core::{
    PricingCalculator, ReversalRequest, SaleKind, SaleRequest, Scope, TransactionRecord,
    ValidationError,
};
use barber_db::{DbError, LedgerFilter, StockEffect};
use chrono::SubsecRound;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregation::Summarizer;
use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use crate::stock_guard::StockGuard;
use crate::store::LedgerStore;

/// Append-only record of sales.
#[derive(Debug)]
pub struct TransactionLedger {
    catalog: Catalog,
    guard: Arc<StockGuard>,
    store: Arc<dyn LedgerStore>,
    pricing: PricingCalculator,
    summarizer: Arc<dyn Summarizer>,
    clock: Arc<dyn Clock>,
}

impl TransactionLedger {
    pub fn new(
        catalog: Catalog,
        guard: Arc<StockGuard>,
        store: Arc<dyn LedgerStore>,
        pricing: PricingCalculator,
        summarizer: Arc<dyn Summarizer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        TransactionLedger {
            catalog,
            guard,
            store,
            pricing,
            summarizer,
            clock,
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Prices and durably records one sale.
    ///
    /// On success the record is committed, any stock decrement is applied,
    /// and the summarizer has seen it. On any error nothing is written.
    pub async fn record(&self, request: SaleRequest) -> EngineResult<TransactionRecord> {
        if let Err(err) = validate_sale_request(&request) {
            warn!(kind = %request.kind(), error = %err, "Sale rejected");
            return Err(err.into());
        }

        let barber = self.catalog.get_barber(request.barber_id()).await?;

        let (record, reservation) = match request {
            SaleRequest::Service {
                service_id,
                client_name,
                barber_id,
                notes,
                duration_minutes,
            } => {
                let service = self.catalog.get_service(&service_id).await?;
                let breakdown = self.pricing.compute_breakdown(service.base_price())?;
                let record = TransactionRecord {
                    id: Uuid::new_v4().to_string(),
                    sequence: 0,
                    kind: SaleKind::Service,
                    ref_id: service.id,
                    ref_name: service.name,
                    client_name: Some(client_name.trim().to_string()),
                    quantity: 1,
                    unit_price_cents: service.base_price_cents,
                    breakdown,
                    barber_id,
                    notes,
                    duration_minutes,
                    reverses: None,
                    created_at: self.now(),
                };
                (record, None)
            }
            SaleRequest::Product {
                product_id,
                quantity,
                barber_id,
                notes,
            } => {
                let reservation = self.guard.reserve(&product_id, quantity).await?;
                let product = reservation.product();
                let breakdown = self.pricing.line_breakdown(product.base_price(), quantity)?;
                let record = TransactionRecord {
                    id: Uuid::new_v4().to_string(),
                    sequence: 0,
                    kind: SaleKind::Product,
                    ref_id: product.id.clone(),
                    ref_name: product.name.clone(),
                    client_name: None,
                    quantity,
                    unit_price_cents: product.base_price_cents,
                    breakdown,
                    barber_id,
                    notes,
                    duration_minutes: None,
                    reverses: None,
                    created_at: self.now(),
                };
                (record, Some(reservation))
            }
        };

        let effect = reservation.as_ref().map(|r| r.effect());
        let record = self.commit(record, effect.as_ref()).await?;
        drop(reservation);

        info!(
            id = %record.id,
            kind = %record.kind,
            item = %record.ref_id,
            barber = %barber.id,
            total = %record.breakdown.total_price,
            "Sale recorded"
        );
        Ok(record)
    }

    /// Appends a reversal of an earlier sale.
    ///
    /// ## Errors
    /// - `NotFound` if the transaction doesn't exist
    /// - `Validation(NotAllowed)` when the target is itself a reversal
    /// - `Validation(Duplicate)` when the sale was already reversed
    pub async fn reverse(&self, request: ReversalRequest) -> EngineResult<TransactionRecord> {
        validate_reason(request.reason.as_deref())?;

        let original = self.get(&request.transaction_id).await?;
        if original.is_reversal() {
            return Err(ValidationError::NotAllowed {
                field: "transaction_id".to_string(),
                value: original.id,
                reason: "a reversal cannot be reversed".to_string(),
            }
            .into());
        }

        // a product reversal restocks, so it serializes with sales of that product
        let _permit = match original.kind {
            SaleKind::Product => Some(self.guard.lock(&original.ref_id).await),
            SaleKind::Service => None,
        };

        if self.store.find_reversal(&original.id).await?.is_some() {
            return Err(already_reversed(&original.id));
        }

        let effect = match original.kind {
            SaleKind::Product => Some(StockEffect::increment(original.ref_id.clone(), original.quantity)),
            SaleKind::Service => None,
        };

        let reversal = TransactionRecord {
            id: Uuid::new_v4().to_string(),
            sequence: 0,
            kind: original.kind,
            ref_id: original.ref_id.clone(),
            ref_name: original.ref_name.clone(),
            client_name: original.client_name.clone(),
            quantity: original.quantity,
            unit_price_cents: original.unit_price_cents,
            breakdown: original.breakdown.negated(),
            barber_id: original.barber_id.clone(),
            notes: request.reason,
            duration_minutes: None,
            reverses: Some(original.id.clone()),
            created_at: self.now(),
        };

        let reversal = self.commit(reversal, effect.as_ref()).await?;

        info!(
            id = %reversal.id,
            reverses = %original.id,
            total = %reversal.breakdown.total_price,
            "Sale reversed"
        );
        Ok(reversal)
    }

    async fn commit(
        &self,
        mut record: TransactionRecord,
        effect: Option<&StockEffect>,
    ) -> EngineResult<TransactionRecord> {
        record.sequence = self
            .store
            .append(&record, effect)
            .await
            .map_err(|err| append_failed(&record, err))?;
        self.summarizer.observe(&record).await;
        Ok(record)
    }

    /// The store keeps microseconds; truncate so the returned record equals
    /// what a later read returns.
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now().trunc_subsecs(6)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get(&self, id: &str) -> EngineResult<TransactionRecord> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Transaction", id))
    }

    /// Latest records first.
    pub async fn recent(&self, scope: &Scope, limit: i64) -> EngineResult<Vec<TransactionRecord>> {
        let filter = LedgerFilter::default()
            .barber(scope.barber_id())
            .limit(limit)
            .newest_first();
        Ok(self.store.query(&filter).await?)
    }
}

/// Maps a failed append. A unique violation on `reverses_id` means another
/// reversal of the same sale committed first.
fn append_failed(record: &TransactionRecord, err: DbError) -> EngineError {
    match (&record.reverses, err) {
        (Some(original), DbError::UniqueViolation { ref field, .. })
            if field.ends_with("reverses_id") =>
        {
            already_reversed(original)
        }
        (_, err @ DbError::InsufficientStock { .. }) => err.into(),
        (_, err) => {
            warn!(id = %record.id, error = %err, "Ledger append failed");
            err.into()
        }
    }
}

fn already_reversed(id: &str) -> EngineError {
    ValidationError::Duplicate {
        field: "reverses".to_string(),
        value: id.to_string(),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================
