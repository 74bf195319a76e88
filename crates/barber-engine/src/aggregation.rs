//! # Aggregation Engine
//!
//! Windowed summaries of the ledger behind one [`Summarizer`] interface.
//!
//! ## Strategies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Aggregation Strategies                             │
//! │                                                                         │
//! │  QUERY-TIME (default)               │  INCREMENTAL                      │
//! │  ─────────────────────              │  ───────────                      │
//! │  • scan [window_start, now]         │  • running bucket per             │
//! │    for the scope on every call      │    (window, scope)                │
//! │  • always consistent                │  • O(1) reads                     │
//! │  • cost grows with the window       │  • rebuilt from the ledger        │
//! │                                     │    on startup                     │
//! │                                                                         │
//! │  Both fold with AggregateWindow::apply, so both equal a full scan.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Incremental Boundaries
//! A record is folded into the bucket of the window that contains its own
//! timestamp. A sale at 23:59:59 lands in that day's bucket even if it is
//! observed after midnight; the next day's first record opens a fresh bucket.
//! A bucket whose start is older than the current window start reads as
//! empty. A bucket holding records stamped after the query's `now` is
//! answered by a scan instead.

use async_trait::async_trait;
use barber_core::{AggregateWindow, Barber, ReferenceZone, Scope, TransactionRecord, WindowBounds, WindowKind};
use barber_db::LedgerFilter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::AggregationStrategy;
use crate::error::EngineResult;
use crate::store::LedgerStore;

// =============================================================================
// Interface
// =============================================================================

/// Answers windowed summary queries.
#[async_trait]
pub trait Summarizer: Send + Sync + std::fmt::Debug {
    fn strategy(&self) -> AggregationStrategy;

    /// Summary of `[window_start(now), now]` for `scope`.
    async fn summarize_at(
        &self,
        window: WindowKind,
        scope: &Scope,
        now: DateTime<Utc>,
    ) -> EngineResult<AggregateWindow>;

    /// Called once per committed record, before `record()` returns.
    async fn observe(&self, record: &TransactionRecord);
}

/// One barber's line on the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarberSummary {
    pub barber: Barber,
    pub summary: AggregateWindow,
}

/// Orders a leaderboard by revenue, highest first, then by name.
pub fn rank(mut rows: Vec<BarberSummary>) -> Vec<BarberSummary> {
    rows.sort_by(|a, b| {
        b.summary
            .total_revenue
            .cmp(&a.summary.total_revenue)
            .then_with(|| a.barber.name.cmp(&b.barber.name))
    });
    rows
}

// =============================================================================
// Query-Time Strategy
// =============================================================================

/// Scans the ledger on every request.
#[derive(Debug)]
pub struct QueryTimeSummarizer {
    store: Arc<dyn LedgerStore>,
    zone: ReferenceZone,
}

impl QueryTimeSummarizer {
    pub fn new(store: Arc<dyn LedgerStore>, zone: ReferenceZone) -> Self {
        QueryTimeSummarizer { store, zone }
    }
}

#[async_trait]
impl Summarizer for QueryTimeSummarizer {
    fn strategy(&self) -> AggregationStrategy {
        AggregationStrategy::QueryTime
    }

    async fn summarize_at(
        &self,
        window: WindowKind,
        scope: &Scope,
        now: DateTime<Utc>,
    ) -> EngineResult<AggregateWindow> {
        let bounds = self.zone.bounds(window, now);
        let filter = LedgerFilter::between(bounds.start, bounds.end).barber(scope.barber_id());
        let records = self.store.query(&filter).await?;

        debug!(?window, ?scope, records = records.len(), "Scanned window");
        Ok(AggregateWindow::from_records(window, scope.clone(), bounds, &records))
    }

    async fn observe(&self, _record: &TransactionRecord) {}
}

// =============================================================================
// Incremental Strategy
// =============================================================================

type BucketKey = (WindowKind, Scope);

/// Running totals for one (window, scope) and the newest timestamp folded in.
#[derive(Debug, Clone)]
struct Bucket {
    totals: AggregateWindow,
    latest: DateTime<Utc>,
}

impl Bucket {
    fn open(kind: WindowKind, scope: Scope, start: DateTime<Utc>) -> Self {
        Bucket {
            totals: AggregateWindow::empty(kind, scope, WindowBounds { start, end: start }),
            latest: start,
        }
    }
}

/// Keeps a running total per (window, scope).
///
/// When the clock reads earlier than a record already folded in (a wall
/// clock stepped back), the bucket can't answer `[start, now]` and the
/// summary falls back to a ledger scan.
#[derive(Debug)]
pub struct IncrementalSummarizer {
    scan: QueryTimeSummarizer,
    zone: ReferenceZone,
    buckets: RwLock<HashMap<BucketKey, Bucket>>,
}

impl IncrementalSummarizer {
    /// Starts with no buckets. Call [`IncrementalSummarizer::rebuild`] before
    /// serving if the ledger may already hold records for the current window.
    pub fn new(store: Arc<dyn LedgerStore>, zone: ReferenceZone) -> Self {
        IncrementalSummarizer {
            scan: QueryTimeSummarizer::new(store, zone),
            zone,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Rebuilds every bucket from the ledger, as after a restart.
    ///
    /// Reads from the earliest current window start (this week's Monday) on.
    pub async fn rebuild(&self, now: DateTime<Utc>) -> EngineResult<()> {
        let since = WindowKind::ALL
            .iter()
            .map(|kind| self.zone.window_start(*kind, now))
            .min()
            .unwrap_or(now);

        let records = self
            .scan
            .store
            .query(&LedgerFilter {
                since: Some(since),
                ..Default::default()
            })
            .await?;

        let mut fresh = HashMap::new();
        for record in &records {
            fold_into(&mut fresh, self.zone, record);
        }
        *self.buckets.write().await = fresh;

        info!(records = records.len(), since = %since, "Incremental aggregates rebuilt");
        Ok(())
    }
}

fn fold_into(buckets: &mut HashMap<BucketKey, Bucket>, zone: ReferenceZone, record: &TransactionRecord) {
    for kind in WindowKind::ALL {
        let start = zone.window_start(kind, record.created_at);

        for scope in [Scope::AllBarbers, Scope::Barber(record.barber_id.clone())] {
            let bucket = buckets
                .entry((kind, scope.clone()))
                .or_insert_with(|| Bucket::open(kind, scope.clone(), start));

            if bucket.totals.window_start < start {
                *bucket = Bucket::open(kind, scope, start);
            }
            // an older window is closed; it no longer feeds any current summary
            if bucket.totals.window_start == start {
                bucket.totals.apply(record);
                bucket.latest = bucket.latest.max(record.created_at);
            }
        }
    }
}

#[async_trait]
impl Summarizer for IncrementalSummarizer {
    fn strategy(&self) -> AggregationStrategy {
        AggregationStrategy::Incremental
    }

    async fn summarize_at(
        &self,
        window: WindowKind,
        scope: &Scope,
        now: DateTime<Utc>,
    ) -> EngineResult<AggregateWindow> {
        let bounds = self.zone.bounds(window, now);

        let answer = {
            let buckets = self.buckets.read().await;
            match buckets.get(&(window, scope.clone())) {
                None => Some(AggregateWindow::empty(window, scope.clone(), bounds)),
                Some(bucket) if bucket.totals.window_start < bounds.start => {
                    Some(AggregateWindow::empty(window, scope.clone(), bounds))
                }
                Some(bucket) if bucket.totals.window_start == bounds.start && bucket.latest <= now => {
                    Some(AggregateWindow {
                        window_end: bounds.end,
                        ..bucket.totals.clone()
                    })
                }
                Some(_) => None,
            }
        };

        match answer {
            Some(summary) => Ok(summary),
            None => {
                debug!(?window, ?scope, now = %now, "Clock behind folded records, scanning");
                self.scan.summarize_at(window, scope, now).await
            }
        }
    }

    async fn observe(&self, record: &TransactionRecord) {
        let mut buckets = self.buckets.write().await;
        fold_into(&mut buckets, self.zone, record);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use barber_core::{Money, PriceBreakdown, SaleKind};
    use barber_db::{Database, DbConfig, LedgerRepository};
    use chrono::{Duration, TimeZone};

    fn utc(d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, d, h, mi, s).unwrap()
    }

    fn record(n: usize, barber: &str, kind: SaleKind, total: i64, at: DateTime<Utc>) -> TransactionRecord {
        let base = total * 100 / 123;
        TransactionRecord {
            id: format!("t-{}", n),
            sequence: 0,
            kind,
            ref_id: "ref".into(),
            ref_name: "Ref".into(),
            client_name: None,
            quantity: 1,
            unit_price_cents: base,
            breakdown: PriceBreakdown {
                base_price: Money::from_cents(base),
                vat_amount: Money::from_cents(total - base),
                total_price: Money::from_cents(total),
                commission: Money::from_cents(base / 5),
            },
            barber_id: barber.into(),
            notes: None,
            duration_minutes: None,
            reverses: None,
            created_at: at,
        }
    }

    async fn store() -> Arc<LedgerRepository> {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Arc::new(db.ledger())
    }

    /// A spread of sales over one week, two barbers, several per day.
    fn week_of_sales() -> Vec<TransactionRecord> {
        let barbers = ["joao", "pedro"];
        let mut records = Vec::new();
        let mut n = 0;
        // 2026-10-18 is the Sunday before the week of 2026-10-19
        for day in 18..=22 {
            for hour in [9, 13, 18] {
                n += 1;
                let kind = if n % 3 == 0 { SaleKind::Product } else { SaleKind::Service };
                let total = 1000 + (n as i64 * 377) % 5000;
                records.push(record(n, barbers[n % 2], kind, total, utc(day, hour, 0, 0)));
            }
        }
        records
    }

    async fn summarizers(records: &[TransactionRecord]) -> (QueryTimeSummarizer, IncrementalSummarizer) {
        let store = store().await;
        let incremental = IncrementalSummarizer::new(store.clone(), ReferenceZone::Utc);
        for r in records {
            store.append(r, None).await.unwrap();
            incremental.observe(r).await;
        }
        (QueryTimeSummarizer::new(store, ReferenceZone::Utc), incremental)
    }

    #[tokio::test]
    async fn test_both_strategies_match_a_full_scan() {
        let records = week_of_sales();
        let (query_time, incremental) = summarizers(&records).await;
        let now = utc(22, 20, 0, 0);

        for window in WindowKind::ALL {
            for scope in [
                Scope::AllBarbers,
                Scope::Barber("joao".into()),
                Scope::Barber("pedro".into()),
                Scope::Barber("nobody".into()),
            ] {
                let bounds = ReferenceZone::Utc.bounds(window, now);
                let expected = AggregateWindow::from_records(window, scope.clone(), bounds, &records);

                let scanned = query_time.summarize_at(window, &scope, now).await.unwrap();
                let running = incremental.summarize_at(window, &scope, now).await.unwrap();

                assert_eq!(scanned, expected, "query-time {:?} {:?}", window, scope);
                assert_eq!(running, expected, "incremental {:?} {:?}", window, scope);
            }
        }
    }

    #[tokio::test]
    async fn test_revenue_is_sum_of_todays_totals() {
        let records = week_of_sales();
        let (query_time, incremental) = summarizers(&records).await;
        let now = utc(22, 23, 0, 0);

        let expected: Money = records
            .iter()
            .filter(|r| r.created_at >= utc(22, 0, 0, 0) && r.created_at <= now)
            .map(|r| r.breakdown.total_price)
            .sum();

        for summarizer in [&query_time as &dyn Summarizer, &incremental] {
            let today = summarizer
                .summarize_at(WindowKind::Today, &Scope::AllBarbers, now)
                .await
                .unwrap();
            assert_eq!(today.total_revenue, expected);
            assert_eq!(today.transaction_count, 3);
        }
    }

    #[tokio::test]
    async fn test_last_second_of_the_day_stays_in_that_day() {
        let late = record(1, "joao", SaleKind::Service, 4305, utc(20, 23, 59, 59));
        let (query_time, incremental) = summarizers(std::slice::from_ref(&late)).await;

        let just_after = utc(21, 0, 0, 1);
        for summarizer in [&query_time as &dyn Summarizer, &incremental] {
            let today = summarizer
                .summarize_at(WindowKind::Today, &Scope::AllBarbers, just_after)
                .await
                .unwrap();
            assert_eq!(today.transaction_count, 0);
            assert_eq!(today.window_start, utc(21, 0, 0, 0));

            let yesterday = summarizer
                .summarize_at(WindowKind::Today, &Scope::AllBarbers, utc(20, 23, 59, 59))
                .await
                .unwrap();
            assert_eq!(yesterday.total_revenue.cents(), 4305);

            let week = summarizer
                .summarize_at(WindowKind::ThisWeek, &Scope::AllBarbers, just_after)
                .await
                .unwrap();
            assert_eq!(week.total_revenue.cents(), 4305);
        }
    }

    #[tokio::test]
    async fn test_late_observation_does_not_leak_into_new_day() {
        let incremental = IncrementalSummarizer::new(store().await, ReferenceZone::Utc);

        incremental
            .observe(&record(1, "joao", SaleKind::Service, 2000, utc(21, 0, 0, 5)))
            .await;
        // observed after midnight, stamped before it
        incremental
            .observe(&record(2, "joao", SaleKind::Service, 4305, utc(20, 23, 59, 59)))
            .await;

        let today = incremental
            .summarize_at(WindowKind::Today, &Scope::AllBarbers, utc(21, 0, 1, 0))
            .await
            .unwrap();
        assert_eq!(today.total_revenue.cents(), 2000);
        assert_eq!(today.transaction_count, 1);

        let week = incremental
            .summarize_at(WindowKind::ThisWeek, &Scope::AllBarbers, utc(21, 0, 1, 0))
            .await
            .unwrap();
        assert_eq!(week.total_revenue.cents(), 6305);
    }

    #[tokio::test]
    async fn test_clock_stepped_back_matches_a_scan() {
        let haircut = record(1, "joao", SaleKind::Service, 4305, utc(19, 10, 0, 0));
        let earlier = record(2, "joao", SaleKind::Service, 3075, utc(19, 9, 0, 0));
        let records = vec![haircut, earlier];
        let (query_time, incremental) = summarizers(&records).await;

        for now in [utc(19, 9, 59, 0), utc(19, 8, 0, 0), utc(18, 23, 0, 0)] {
            for window in WindowKind::ALL {
                let bounds = ReferenceZone::Utc.bounds(window, now);
                let expected = AggregateWindow::from_records(window, Scope::AllBarbers, bounds, &records);

                for summarizer in [&query_time as &dyn Summarizer, &incremental] {
                    let summary = summarizer
                        .summarize_at(window, &Scope::AllBarbers, now)
                        .await
                        .unwrap();
                    assert_eq!(summary, expected, "{} {:?} at {}", summarizer.strategy(), window, now);
                }
            }
        }

        let before_ten = incremental
            .summarize_at(WindowKind::Today, &Scope::AllBarbers, utc(19, 9, 59, 0))
            .await
            .unwrap();
        assert_eq!(before_ten.transaction_count, 1);
        assert_eq!(before_ten.total_revenue.cents(), 3075);
    }

    #[tokio::test]
    async fn test_rebuild_matches_live_buckets() {
        let records = week_of_sales();
        let (query_time, live) = summarizers(&records).await;
        let now = utc(22, 21, 0, 0);

        let restarted = IncrementalSummarizer::new(query_time.store.clone(), ReferenceZone::Utc);
        restarted.rebuild(now).await.unwrap();

        for window in WindowKind::ALL {
            for scope in [Scope::AllBarbers, Scope::Barber("pedro".into())] {
                assert_eq!(
                    restarted.summarize_at(window, &scope, now).await.unwrap(),
                    live.summarize_at(window, &scope, now).await.unwrap()
                );
            }
        }
    }

    #[tokio::test]
    async fn test_summaries_are_idempotent() {
        let records = week_of_sales();
        let (query_time, incremental) = summarizers(&records).await;
        let now = utc(22, 19, 0, 0);

        for summarizer in [&query_time as &dyn Summarizer, &incremental] {
            let first = summarizer.summarize_at(WindowKind::Today, &Scope::AllBarbers, now).await.unwrap();
            let second = summarizer.summarize_at(WindowKind::Today, &Scope::AllBarbers, now).await.unwrap();
            assert_eq!(first, second);
        }
    }

    #[tokio::test]
    async fn test_stale_bucket_reads_empty() {
        let incremental = IncrementalSummarizer::new(store().await, ReferenceZone::Utc);
        incremental
            .observe(&record(1, "joao", SaleKind::Service, 4305, utc(19, 10, 0, 0)))
            .await;

        let next_week = utc(19, 10, 0, 0) + Duration::days(7);
        let week = incremental
            .summarize_at(WindowKind::ThisWeek, &Scope::AllBarbers, next_week)
            .await
            .unwrap();
        assert_eq!(week.transaction_count, 0);
        assert_eq!(week.total_revenue, Money::zero());
    }

    #[test]
    fn test_rank_orders_by_revenue() {
        let bounds = WindowBounds { start: utc(19, 0, 0, 0), end: utc(19, 12, 0, 0) };
        let row = |id: &str, name: &str, cents: i64| {
            let mut summary = AggregateWindow::empty(WindowKind::Today, Scope::Barber(id.into()), bounds);
            summary.total_revenue = Money::from_cents(cents);
            BarberSummary { barber: Barber { id: id.into(), name: name.into() }, summary }
        };

        let ranked = rank(vec![row("a", "Ana", 100), row("b", "Bia", 900), row("c", "Caio", 100)]);
        let ids: Vec<&str> = ranked.iter().map(|r| r.barber.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
