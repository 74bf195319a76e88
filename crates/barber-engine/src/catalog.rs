//! # Catalog
//!
//! Read access to services, products and barbers, plus seed loading.
//!
//! Lookups turn a missing row into [`EngineError::NotFound`]; a sale that
//! names an unknown id usually means the dashboard is showing stale data.

use barber_core::validation::validate_catalog_seed;
use barber_core::{Barber, CatalogSeed, ProductDefinition, ServiceDefinition};
use barber_db::{CatalogRepository, SeedReport};
use tracing::info;

use crate::error::{EngineError, EngineResult};

/// Catalog facade over the database repository.
#[derive(Debug, Clone)]
pub struct Catalog {
    repo: CatalogRepository,
}

impl Catalog {
    pub fn new(repo: CatalogRepository) -> Self {
        Catalog { repo }
    }

    pub async fn get_service(&self, id: &str) -> EngineResult<ServiceDefinition> {
        self.repo
            .get_service(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Service", id))
    }

    pub async fn get_product(&self, id: &str) -> EngineResult<ProductDefinition> {
        self.repo
            .get_product(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", id))
    }

    pub async fn get_barber(&self, id: &str) -> EngineResult<Barber> {
        self.repo
            .get_barber(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Barber", id))
    }

    /// All services, by name.
    pub async fn list_services(&self) -> EngineResult<Vec<ServiceDefinition>> {
        Ok(self.repo.list_services().await?)
    }

    /// All products with current stock, by name.
    pub async fn list_products(&self) -> EngineResult<Vec<ProductDefinition>> {
        Ok(self.repo.list_products().await?)
    }

    /// The roster, by name.
    pub async fn list_barbers(&self) -> EngineResult<Vec<Barber>> {
        Ok(self.repo.list_barbers().await?)
    }

    /// Validates and upserts a seed. Existing stock is never overwritten.
    pub async fn load_seed(&self, seed: &CatalogSeed) -> EngineResult<SeedReport> {
        validate_catalog_seed(seed)?;
        let report = self.repo.upsert_seed(seed).await?;
        info!(
            services = report.services,
            products = report.products,
            barbers = report.barbers,
            "Catalog loaded"
        );
        Ok(report)
    }

    pub(crate) fn repository(&self) -> &CatalogRepository {
        &self.repo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barber_db::{Database, DbConfig};

    async fn catalog() -> Catalog {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = Catalog::new(db.catalog());
        catalog.load_seed(&CatalogSeed::default()).await.unwrap();
        catalog
    }

    #[tokio::test]
    async fn test_lookups() {
        let catalog = catalog().await;
        assert_eq!(catalog.get_service("combo").await.unwrap().base_price_cents, 5500);
        assert_eq!(catalog.get_product("shampoo").await.unwrap().stock, 12);
        assert_eq!(catalog.get_barber("miguel").await.unwrap().name, "Miguel Santos");
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let catalog = catalog().await;
        let err = catalog.get_service("perm").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { ref entity, .. } if entity == "Service"));
        assert!(matches!(
            catalog.get_barber("ghost").await,
            Err(EngineError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_seed_is_rejected() {
        let catalog = catalog().await;
        let mut seed = CatalogSeed::empty();
        seed.products.push(ProductDefinition {
            id: "wax".into(),
            name: "Cera".into(),
            base_price_cents: -1,
            stock: 3,
        });
        assert!(matches!(
            catalog.load_seed(&seed).await,
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            catalog.get_product("wax").await,
            Err(EngineError::NotFound { .. })
        ));
    }
}
