//! # Ledger Repository
//!
//! The append-only `transactions` table.
//!
//! ## Append Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   ├── (stock effect) UPDATE products SET stock = stock + Δ              │
//! │   │                  WHERE id = ? AND stock + Δ >= 0                    │
//! │   │         └── 0 rows? ──► ROLLBACK, NotFound | InsufficientStock      │
//! │   └── INSERT INTO transactions ... RETURNING seq                        │
//! │  COMMIT  ──► durable before append() returns                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Either the record and the stock change both land, or neither does.
//! UPDATE and DELETE on `transactions` are rejected by triggers.

use barber_core::{Money, PriceBreakdown, SaleKind, TransactionRecord};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

// =============================================================================
// Inputs
// =============================================================================

/// A stock change applied in the same transaction as an append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockEffect {
    pub product_id: String,
    /// Negative for a sale, positive for a reversal.
    pub delta: i64,
}

impl StockEffect {
    /// Takes `quantity` units out of stock.
    pub fn decrement(product_id: impl Into<String>, quantity: i64) -> Self {
        StockEffect {
            product_id: product_id.into(),
            delta: -quantity,
        }
    }

    /// Puts `quantity` units back.
    pub fn increment(product_id: impl Into<String>, quantity: i64) -> Self {
        StockEffect {
            product_id: product_id.into(),
            delta: quantity,
        }
    }
}

/// Selection over the ledger. Bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerFilter {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub barber_id: Option<String>,
    pub limit: Option<i64>,
    /// `(created_at, seq)` descending instead of ascending.
    pub newest_first: bool,
}

impl LedgerFilter {
    /// Records with `since <= created_at <= until`.
    pub fn between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        LedgerFilter {
            since: Some(since),
            until: Some(until),
            ..Default::default()
        }
    }

    pub fn barber(mut self, barber_id: Option<&str>) -> Self {
        self.barber_id = barber_id.map(str::to_string);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

const SELECT_COLUMNS: &str = r#"
    SELECT
        seq, id, kind, ref_id, ref_name, client_name, quantity,
        unit_price_cents, base_price_cents, vat_amount_cents,
        total_price_cents, commission_cents, barber_id, notes,
        duration_minutes, reverses_id, created_at_us
    FROM transactions
"#;

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    seq: i64,
    id: String,
    kind: SaleKind,
    ref_id: String,
    ref_name: String,
    client_name: Option<String>,
    quantity: i64,
    unit_price_cents: i64,
    base_price_cents: i64,
    vat_amount_cents: i64,
    total_price_cents: i64,
    commission_cents: i64,
    barber_id: String,
    notes: Option<String>,
    duration_minutes: Option<i64>,
    reverses_id: Option<String>,
    created_at_us: i64,
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let created_at = Utc
            .timestamp_micros(row.created_at_us)
            .single()
            .ok_or_else(|| {
                DbError::corrupt(
                    "transactions",
                    format!("created_at_us {} out of range for {}", row.created_at_us, row.id),
                )
            })?;

        Ok(TransactionRecord {
            id: row.id,
            sequence: row.seq,
            kind: row.kind,
            ref_id: row.ref_id,
            ref_name: row.ref_name,
            client_name: row.client_name,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            breakdown: PriceBreakdown {
                base_price: Money::from_cents(row.base_price_cents),
                vat_amount: Money::from_cents(row.vat_amount_cents),
                total_price: Money::from_cents(row.total_price_cents),
                commission: Money::from_cents(row.commission_cents),
            },
            barber_id: row.barber_id,
            notes: row.notes,
            duration_minutes: row.duration_minutes,
            reverses: row.reverses_id,
            created_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the transaction ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Appends a record, applying `effect` in the same transaction.
    ///
    /// ## Returns
    /// The insertion sequence assigned to the record.
    ///
    /// ## Errors
    /// - `NotFound` if the effect names an unknown product
    /// - `InsufficientStock` if the effect would take stock below zero
    /// - `UniqueViolation` on a duplicate id or a second reversal
    pub async fn append(
        &self,
        record: &TransactionRecord,
        effect: Option<&StockEffect>,
    ) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;

        if let Some(effect) = effect {
            let updated = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock + ?1,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                WHERE id = ?2 AND stock + ?1 >= 0
                "#,
            )
            .bind(effect.delta)
            .bind(&effect.product_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                        .bind(&effect.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                // tx is dropped here, which rolls back
                return Err(match available {
                    None => DbError::not_found("Product", &effect.product_id),
                    Some(available) => DbError::InsufficientStock {
                        product_id: effect.product_id.clone(),
                        available,
                        requested: -effect.delta,
                    },
                });
            }
        }

        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO transactions (
                id, kind, ref_id, ref_name, client_name, quantity,
                unit_price_cents, base_price_cents, vat_amount_cents,
                total_price_cents, commission_cents, barber_id, notes,
                duration_minutes, reverses_id, created_at_us
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11, ?12, ?13,
                ?14, ?15, ?16
            )
            RETURNING seq
            "#,
        )
        .bind(&record.id)
        .bind(record.kind)
        .bind(&record.ref_id)
        .bind(&record.ref_name)
        .bind(&record.client_name)
        .bind(record.quantity)
        .bind(record.unit_price_cents)
        .bind(record.breakdown.base_price.cents())
        .bind(record.breakdown.vat_amount.cents())
        .bind(record.breakdown.total_price.cents())
        .bind(record.breakdown.commission.cents())
        .bind(&record.barber_id)
        .bind(&record.notes)
        .bind(record.duration_minutes)
        .bind(&record.reverses)
        .bind(record.created_at.timestamp_micros())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(id = %record.id, seq, kind = %record.kind, "Ledger record committed");
        Ok(seq)
    }

    /// Records matching `filter`, ordered by `(created_at, seq)`.
    pub async fn query(&self, filter: &LedgerFilter) -> DbResult<Vec<TransactionRecord>> {
        let order = if filter.newest_first { "DESC" } else { "ASC" };
        let sql = format!(
            r#"{SELECT_COLUMNS}
            WHERE (?1 IS NULL OR created_at_us >= ?1)
              AND (?2 IS NULL OR created_at_us <= ?2)
              AND (?3 IS NULL OR barber_id = ?3)
            ORDER BY created_at_us {order}, seq {order}
            LIMIT ?4"#
        );

        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(filter.since.map(|t| t.timestamp_micros()))
            .bind(filter.until.map(|t| t.timestamp_micros()))
            .bind(filter.barber_id.as_deref())
            .bind(filter.limit.unwrap_or(-1))
            .fetch_all(&self.pool)
            .await?;

        debug!(rows = rows.len(), "Ledger query");
        rows.into_iter().map(TransactionRecord::try_from).collect()
    }

    /// Gets a record by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<TransactionRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TransactionRecord::try_from).transpose()
    }

    /// The reversal of `original_id`, if one exists.
    pub async fn find_reversal(&self, original_id: &str) -> DbResult<Option<TransactionRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE reverses_id = ?1");
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(original_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TransactionRecord::try_from).transpose()
    }

    /// Total number of records.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use barber_core::CatalogSeed;
    use chrono::Duration;

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog().upsert_seed(&CatalogSeed::default()).await.unwrap();
        db
    }

    fn product_record(id: &str, quantity: i64, at: DateTime<Utc>) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            sequence: 0,
            kind: SaleKind::Product,
            ref_id: "pomade".to_string(),
            ref_name: "Pomada Modeladora".to_string(),
            client_name: None,
            quantity,
            unit_price_cents: 2500,
            breakdown: PriceBreakdown {
                base_price: Money::from_cents(2500 * quantity),
                vat_amount: Money::from_cents(575 * quantity),
                total_price: Money::from_cents(3075 * quantity),
                commission: Money::from_cents(500 * quantity),
            },
            barber_id: "joao".to_string(),
            notes: None,
            duration_minutes: None,
            reverses: None,
            created_at: at,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[tokio::test]
    async fn test_append_with_stock_effect() {
        let db = seeded().await;
        let ledger = db.ledger();

        let record = product_record("t-1", 3, at(0));
        let seq = ledger
            .append(&record, Some(&StockEffect::decrement("pomade", 3)))
            .await
            .unwrap();
        assert!(seq > 0);

        assert_eq!(db.catalog().stock("pomade").await.unwrap(), Some(12));

        let stored = ledger.get("t-1").await.unwrap().unwrap();
        assert_eq!(stored.sequence, seq);
        assert_eq!(stored.breakdown, record.breakdown);
        assert_eq!(stored.created_at, record.created_at);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let db = seeded().await;
        let ledger = db.ledger();

        let record = product_record("t-1", 16, at(0));
        let err = ledger
            .append(&record, Some(&StockEffect::decrement("pomade", 16)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::InsufficientStock { available: 15, requested: 16, .. }
        ));
        assert_eq!(db.catalog().stock("pomade").await.unwrap(), Some(15));
        assert_eq!(ledger.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_insert_keeps_stock() {
        let db = seeded().await;
        let ledger = db.ledger();

        let first = product_record("dup", 1, at(0));
        ledger
            .append(&first, Some(&StockEffect::decrement("pomade", 1)))
            .await
            .unwrap();

        // same id again: the stock update runs, the insert fails, both roll back
        let err = ledger
            .append(&first, Some(&StockEffect::decrement("pomade", 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(db.catalog().stock("pomade").await.unwrap(), Some(14));
    }

    #[tokio::test]
    async fn test_query_orders_and_filters() {
        let db = seeded().await;
        let ledger = db.ledger();

        for (i, secs) in [(1, 30), (2, 10), (3, 10), (4, 50)] {
            let mut record = product_record(&format!("t-{}", i), 1, at(secs));
            if i == 4 {
                record.barber_id = "pedro".to_string();
            }
            ledger.append(&record, None).await.unwrap();
        }

        let all = ledger.query(&LedgerFilter::default()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        // equal timestamps fall back to insertion order
        assert_eq!(ids, vec!["t-2", "t-3", "t-1", "t-4"]);

        let window = ledger
            .query(&LedgerFilter::between(at(10), at(30)))
            .await
            .unwrap();
        assert_eq!(window.len(), 3);

        let pedro = ledger
            .query(&LedgerFilter::default().barber(Some("pedro")))
            .await
            .unwrap();
        assert_eq!(pedro.len(), 1);

        let newest = ledger
            .query(&LedgerFilter::default().newest_first().limit(2))
            .await
            .unwrap();
        let ids: Vec<&str> = newest.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["t-4", "t-1"]);
    }

    #[tokio::test]
    async fn test_single_reversal_per_record() {
        let db = seeded().await;
        let ledger = db.ledger();

        let original = product_record("orig", 1, at(0));
        ledger.append(&original, None).await.unwrap();

        let mut reversal = product_record("rev-1", 1, at(5));
        reversal.breakdown = reversal.breakdown.negated();
        reversal.reverses = Some("orig".to_string());
        ledger.append(&reversal, None).await.unwrap();

        let found = ledger.find_reversal("orig").await.unwrap().unwrap();
        assert_eq!(found.id, "rev-1");

        let mut second = reversal.clone();
        second.id = "rev-2".to_string();
        let err = ledger.append(&second, None).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_ledger_rejects_updates() {
        let db = seeded().await;
        db.ledger()
            .append(&product_record("t-1", 1, at(0)), None)
            .await
            .unwrap();

        let result = sqlx::query("UPDATE transactions SET quantity = 2 WHERE id = 't-1'")
            .execute(db.pool())
            .await;
        assert!(result.is_err());

        let result = sqlx::query("DELETE FROM transactions")
            .execute(db.pool())
            .await;
        assert!(result.is_err());
    }
}
