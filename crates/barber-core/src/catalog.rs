//! # Catalog Seed
//!
//! The reference data a shop starts from: services, products, barbers.
//!
//! A seed is loaded into the database with upsert semantics. Names and
//! prices follow the seed; stock of a product that already exists does not,
//! because after the first load stock belongs to the stock guard.
//!
//! ## File Format (TOML)
//! ```toml
//! [[services]]
//! id = "haircut"
//! name = "Corte Masculino"
//! base_price_cents = 3500
//!
//! [[products]]
//! id = "pomade"
//! name = "Pomada Modeladora"
//! base_price_cents = 2500
//! stock = 15
//!
//! [[barbers]]
//! id = "joao"
//! name = "João Silva"
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{Barber, ProductDefinition, ServiceDefinition};

/// A full set of catalog reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub services: Vec<ServiceDefinition>,
    #[serde(default)]
    pub products: Vec<ProductDefinition>,
    #[serde(default)]
    pub barbers: Vec<Barber>,
}

impl CatalogSeed {
    /// A seed with nothing in it.
    pub fn empty() -> Self {
        CatalogSeed {
            services: Vec::new(),
            products: Vec::new(),
            barbers: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.products.is_empty() && self.barbers.is_empty()
    }
}

/// The shop's standard menu, products and roster.
impl Default for CatalogSeed {
    fn default() -> Self {
        let service = |id: &str, name: &str, cents: i64| ServiceDefinition {
            id: id.to_string(),
            name: name.to_string(),
            base_price_cents: cents,
        };
        let product = |id: &str, name: &str, cents: i64, stock: i64| ProductDefinition {
            id: id.to_string(),
            name: name.to_string(),
            base_price_cents: cents,
            stock,
        };
        let barber = |id: &str, name: &str| Barber {
            id: id.to_string(),
            name: name.to_string(),
        };

        CatalogSeed {
            services: vec![
                service("haircut", "Corte Masculino", 3500),
                service("beard", "Barba", 2500),
                service("combo", "Corte + Barba", 5500),
                service("hair-design", "Design Cabelo", 4500),
                service("beard-design", "Design Barba", 3500),
            ],
            products: vec![
                product("pomade", "Pomada Modeladora", 2500, 15),
                product("beard-oil", "Óleo para Barba", 3000, 8),
                product("shampoo", "Shampoo Especial", 2000, 12),
            ],
            barbers: vec![
                barber("joao", "João Silva"),
                barber("miguel", "Miguel Santos"),
                barber("pedro", "Pedro Costa"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_seed_contents() {
        let seed = CatalogSeed::default();
        assert_eq!(seed.services.len(), 5);
        assert_eq!(seed.products.len(), 3);
        assert_eq!(seed.barbers.len(), 3);

        let haircut = seed.services.iter().find(|s| s.id == "haircut").unwrap();
        assert_eq!(haircut.base_price_cents, 3500);

        let oil = seed.products.iter().find(|p| p.id == "beard-oil").unwrap();
        assert_eq!(oil.stock, 8);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let seed: CatalogSeed = serde_json::from_str(r#"{"barbers":[{"id":"ana","name":"Ana"}]}"#).unwrap();
        assert!(seed.services.is_empty());
        assert_eq!(seed.barbers.len(), 1);
        assert!(!seed.is_empty());
        assert!(CatalogSeed::empty().is_empty());
    }
}
