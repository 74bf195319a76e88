//! # Catalog Repository
//!
//! Services, products, barbers and the product stock column.
//!
//! ## Who Writes What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  upsert_seed()  names, prices, roster; stock only for NEW products      │
//! │  restock()      stock += n         (goods received)                     │
//! │  ledger append  stock += delta     (sale / reversal, same tx as record) │
//! │                                                                         │
//! │  Everything else here is read-only.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use barber_core::{Barber, CatalogSeed, ProductDefinition, ServiceDefinition};

/// Counts of rows touched by [`CatalogRepository::upsert_seed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub services: usize,
    pub products: usize,
    pub barbers: usize,
}

/// Repository for catalog reference data.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Services
    // =========================================================================

    pub async fn get_service(&self, id: &str) -> DbResult<Option<ServiceDefinition>> {
        let service = sqlx::query_as::<_, ServiceDefinition>(
            "SELECT id, name, base_price_cents FROM services WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    /// Lists all services ordered by name.
    pub async fn list_services(&self) -> DbResult<Vec<ServiceDefinition>> {
        let services = sqlx::query_as::<_, ServiceDefinition>(
            "SELECT id, name, base_price_cents FROM services ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn get_product(&self, id: &str) -> DbResult<Option<ProductDefinition>> {
        let product = sqlx::query_as::<_, ProductDefinition>(
            "SELECT id, name, base_price_cents, stock FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products ordered by name.
    pub async fn list_products(&self) -> DbResult<Vec<ProductDefinition>> {
        let products = sqlx::query_as::<_, ProductDefinition>(
            "SELECT id, name, base_price_cents, stock FROM products ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Current stock of a product, `None` if the product doesn't exist.
    pub async fn stock(&self, product_id: &str) -> DbResult<Option<i64>> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(stock)
    }

    /// Adds `quantity` units to a product's stock and returns the new level.
    ///
    /// ## Errors
    /// - `NotFound` if the product doesn't exist
    pub async fn restock(&self, product_id: &str, quantity: i64) -> DbResult<i64> {
        debug!(product_id = %product_id, quantity, "Restocking product");

        let stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock + ?1,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?2
            RETURNING stock
            "#,
        )
        .bind(quantity)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        stock.ok_or_else(|| DbError::not_found("Product", product_id))
    }

    // =========================================================================
    // Barbers
    // =========================================================================

    pub async fn get_barber(&self, id: &str) -> DbResult<Option<Barber>> {
        let barber = sqlx::query_as::<_, Barber>("SELECT id, name FROM barbers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(barber)
    }

    /// Lists the roster ordered by name.
    pub async fn list_barbers(&self) -> DbResult<Vec<Barber>> {
        let barbers = sqlx::query_as::<_, Barber>("SELECT id, name FROM barbers ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;

        Ok(barbers)
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Upserts a catalog seed in a single transaction.
    ///
    /// Existing rows take the seed's name and price. An existing product
    /// keeps its stock; the seed's stock only applies on first insert.
    pub async fn upsert_seed(&self, seed: &CatalogSeed) -> DbResult<SeedReport> {
        let mut tx = self.pool.begin().await?;

        for service in &seed.services {
            sqlx::query(
                r#"
                INSERT INTO services (id, name, base_price_cents)
                VALUES (?1, ?2, ?3)
                ON CONFLICT (id) DO UPDATE SET
                    name = excluded.name,
                    base_price_cents = excluded.base_price_cents,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                "#,
            )
            .bind(&service.id)
            .bind(&service.name)
            .bind(service.base_price_cents)
            .execute(&mut *tx)
            .await?;
        }

        for product in &seed.products {
            sqlx::query(
                r#"
                INSERT INTO products (id, name, base_price_cents, stock)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (id) DO UPDATE SET
                    name = excluded.name,
                    base_price_cents = excluded.base_price_cents,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                "#,
            )
            .bind(&product.id)
            .bind(&product.name)
            .bind(product.base_price_cents)
            .bind(product.stock)
            .execute(&mut *tx)
            .await?;
        }

        for barber in &seed.barbers {
            sqlx::query(
                r#"
                INSERT INTO barbers (id, name)
                VALUES (?1, ?2)
                ON CONFLICT (id) DO UPDATE SET
                    name = excluded.name,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                "#,
            )
            .bind(&barber.id)
            .bind(&barber.name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let report = SeedReport {
            services: seed.services.len(),
            products: seed.products.len(),
            barbers: seed.barbers.len(),
        };

        info!(
            services = report.services,
            products = report.products,
            barbers = report.barbers,
            "Catalog seed applied"
        );

        Ok(report)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
