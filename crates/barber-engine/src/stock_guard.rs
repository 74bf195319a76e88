//! # Stock Guard
//!
//! Keeps product stock non-negative under concurrent sales.
//!
//! ## Per-Product Serialization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  locks: product_id ──► Arc<Mutex<()>>                                   │
//! │                                                                         │
//! │  sale A (pomade) ──► lock(pomade) ──► read stock ──► append ──► unlock  │
//! │  sale B (pomade) ──► lock(pomade) ······waits······► read stock ──► ... │
//! │  sale C (oil)    ──► lock(oil)    ──► runs in parallel with A           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A [`Reservation`] holds the product's lock until it is dropped, which the
//! ledger does only after the append committed or failed. The check and the
//! decrement therefore happen as one step per product, and the store's
//! conditional update plus `CHECK (stock >= 0)` back this up.

use barber_core::validation::validate_quantity;
use barber_core::ProductDefinition;
use barber_db::StockEffect;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::{EngineError, EngineResult};

/// Exclusive access to one product's stock.
pub type ProductPermit = OwnedMutexGuard<()>;

/// A successful stock check, valid while held.
#[derive(Debug)]
pub struct Reservation {
    product: ProductDefinition,
    quantity: i64,
    _permit: ProductPermit,
}

impl Reservation {
    /// The product as read under the lock.
    pub fn product(&self) -> &ProductDefinition {
        &self.product
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// The decrement to apply with the ledger append.
    pub fn effect(&self) -> StockEffect {
        StockEffect::decrement(self.product.id.clone(), self.quantity)
    }
}

/// Per-product inventory guard.
#[derive(Debug)]
pub struct StockGuard {
    catalog: Catalog,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl StockGuard {
    pub fn new(catalog: Catalog) -> Self {
        StockGuard {
            catalog,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Waits for exclusive access to `product_id`'s stock.
    ///
    /// Callers must check the product exists first; the lock table only
    /// grows for real products.
    pub async fn lock(&self, product_id: &str) -> ProductPermit {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(product_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Checks that `quantity` units are available and holds the product.
    ///
    /// ## Errors
    /// - `Validation` if quantity is outside 1..=999
    /// - `NotFound` if the product doesn't exist
    /// - `InsufficientStock` if stock < quantity (nothing changes)
    pub async fn reserve(&self, product_id: &str, quantity: i64) -> EngineResult<Reservation> {
        validate_quantity(quantity)?;
        self.catalog.get_product(product_id).await?;

        let permit = self.lock(product_id).await;
        // re-read under the lock; the first read only proved existence
        let product = self.catalog.get_product(product_id).await?;

        if !product.can_sell(quantity) {
            warn!(
                product_id = %product_id,
                available = product.stock,
                requested = quantity,
                "Reservation rejected: insufficient stock"
            );
            return Err(EngineError::InsufficientStock {
                product_id: product_id.to_string(),
                available: product.stock,
                requested: quantity,
            });
        }

        debug!(product_id = %product_id, quantity, stock = product.stock, "Stock reserved");
        Ok(Reservation {
            product,
            quantity,
            _permit: permit,
        })
    }

    /// Adds received goods to stock. Returns the new level.
    pub async fn restock(&self, product_id: &str, quantity: i64) -> EngineResult<i64> {
        validate_quantity(quantity)?;
        self.catalog.get_product(product_id).await?;

        let _permit = self.lock(product_id).await;
        let stock = self.catalog.repository().restock(product_id, quantity).await?;

        info!(product_id = %product_id, quantity, stock, "Product restocked");
        Ok(stock)
    }

    /// Current stock level.
    pub async fn stock(&self, product_id: &str) -> EngineResult<i64> {
        Ok(self.catalog.get_product(product_id).await?.stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barber_core::CatalogSeed;
    use barber_db::{Database, DbConfig};
    use std::time::Duration;

    async fn guard() -> Arc<StockGuard> {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = Catalog::new(db.catalog());
        catalog.load_seed(&CatalogSeed::default()).await.unwrap();
        Arc::new(StockGuard::new(catalog))
    }

    #[tokio::test]
    async fn test_reserve_checks_stock_without_changing_it() {
        let guard = guard().await;

        let reservation = guard.reserve("beard-oil", 8).await.unwrap();
        assert_eq!(reservation.effect(), StockEffect::decrement("beard-oil", 8));
        assert_eq!(reservation.product().base_price_cents, 3000);
        drop(reservation);

        // nothing is decremented until the ledger appends
        assert_eq!(guard.stock("beard-oil").await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_reserve_errors() {
        let guard = guard().await;

        assert!(matches!(
            guard.reserve("beard-oil", 9).await,
            Err(EngineError::InsufficientStock { available: 8, requested: 9, .. })
        ));
        assert!(matches!(
            guard.reserve("ghost", 1).await,
            Err(EngineError::NotFound { .. })
        ));
        assert!(matches!(
            guard.reserve("beard-oil", 0).await,
            Err(EngineError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_restock() {
        let guard = guard().await;
        assert_eq!(guard.restock("shampoo", 6).await.unwrap(), 18);
        assert_eq!(guard.stock("shampoo").await.unwrap(), 18);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_product_is_serialized() {
        let guard = guard().await;

        let held = guard.reserve("pomade", 1).await.unwrap();

        let contender = {
            let guard = guard.clone();
            tokio::spawn(async move { guard.reserve("pomade", 1).await.map(|r| r.quantity()) })
        };

        // a different product is not blocked
        let other = tokio::time::timeout(Duration::from_secs(2), guard.reserve("shampoo", 1)).await;
        assert!(other.is_ok());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(held);
        assert_eq!(contender.await.unwrap().unwrap(), 1);
    }
}
