//! # Ledger Store
//!
//! The read/write contract the engine needs from durable storage.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TransactionLedger ──► LedgerStore::append(record, Some(effect))        │
//! │                          │                                              │
//! │  Summarizers ──────────► LedgerStore::query(filter)                     │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                  LedgerRepository (SQLite)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `append` must be atomic with its stock effect and durable before it
//! returns.

use async_trait::async_trait;
use barber_core::TransactionRecord;
use barber_db::{DbResult, LedgerFilter, LedgerRepository, StockEffect};

/// Durable, append-only transaction storage.
#[async_trait]
pub trait LedgerStore: Send + Sync + std::fmt::Debug {
    /// Appends `record` and applies `effect` in one atomic step.
    /// Returns the insertion sequence.
    async fn append(&self, record: &TransactionRecord, effect: Option<&StockEffect>) -> DbResult<i64>;

    /// Records matching `filter`, ordered by `(created_at, sequence)`.
    async fn query(&self, filter: &LedgerFilter) -> DbResult<Vec<TransactionRecord>>;

    async fn get(&self, id: &str) -> DbResult<Option<TransactionRecord>>;

    /// The record that reverses `original_id`, if any.
    async fn find_reversal(&self, original_id: &str) -> DbResult<Option<TransactionRecord>>;
}

#[async_trait]
impl LedgerStore for LedgerRepository {
    async fn append(&self, record: &TransactionRecord, effect: Option<&StockEffect>) -> DbResult<i64> {
        LedgerRepository::append(self, record, effect).await
    }

    async fn query(&self, filter: &LedgerFilter) -> DbResult<Vec<TransactionRecord>> {
        LedgerRepository::query(self, filter).await
    }

    async fn get(&self, id: &str) -> DbResult<Option<TransactionRecord>> {
        LedgerRepository::get(self, id).await
    }

    async fn find_reversal(&self, original_id: &str) -> DbResult<Option<TransactionRecord>> {
        LedgerRepository::find_reversal(self, original_id).await
    }
}
