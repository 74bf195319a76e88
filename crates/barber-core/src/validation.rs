//! # Validation Module
//!
//! Input validation for sale requests and catalog entries.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Dashboard form (required fields, basic length)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE, before any catalog lookup                        │
//! │  ├── ids, client name, quantity, notes                                  │
//! │  └── nothing is written when it fails                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite (CHECK stock >= 0, UNIQUE reverses_id, FKs)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use barber_core::types::SaleRequest;
//! use barber_core::validation::validate_sale_request;
//!
//! assert!(validate_sale_request(&SaleRequest::service("haircut", "Rui", "joao")).is_ok());
//! assert!(validate_sale_request(&SaleRequest::service("haircut", "  ", "joao")).is_err());
//! ```

use crate::catalog::CatalogSeed;
use crate::error::ValidationError;
use crate::types::SaleRequest;
use crate::{MAX_BASE_PRICE_CENTS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted id (service, product, barber, transaction).
pub const MAX_ID_LENGTH: usize = 64;

/// Longest accepted client or catalog name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Longest accepted free-text note.
pub const MAX_NOTES_LENGTH: usize = 1000;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a catalog or transaction id.
///
/// ## Rules
/// - Must not be blank
/// - At most [`MAX_ID_LENGTH`] characters
/// - Letters, digits, hyphens and underscores only
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LENGTH,
        });
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a human name (client, barber, catalog entry).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a product quantity.
///
/// ## Example
/// ```rust
/// use barber_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(1000).is_err());
/// ```
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a catalog base price in cents.
pub fn validate_base_price(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_BASE_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "base_price_cents".to_string(),
            min: 0,
            max: MAX_BASE_PRICE_CENTS,
        });
    }
    Ok(())
}

fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    match notes {
        Some(n) if n.chars().count() > MAX_NOTES_LENGTH => Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LENGTH,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a sale request before it reaches the catalog.
///
/// Only shape is checked here. Whether the ids exist is the catalog's job.
/// `duration_minutes` is kept as entered and never rejects a sale.
pub fn validate_sale_request(request: &SaleRequest) -> ValidationResult<()> {
    match request {
        SaleRequest::Service {
            service_id,
            client_name,
            barber_id,
            notes,
            ..
        } => {
            validate_id("service_id", service_id)?;
            validate_name("client_name", client_name)?;
            validate_id("barber_id", barber_id)?;
            validate_notes(notes.as_deref())
        }
        SaleRequest::Product {
            product_id,
            quantity,
            barber_id,
            notes,
        } => {
            validate_id("product_id", product_id)?;
            validate_quantity(*quantity)?;
            validate_id("barber_id", barber_id)?;
            validate_notes(notes.as_deref())
        }
    }
}

/// Validates a reversal reason.
pub fn validate_reason(reason: Option<&str>) -> ValidationResult<()> {
    validate_notes(reason)
}

/// Validates a whole catalog seed: shapes, prices, stock and unique ids.
pub fn validate_catalog_seed(seed: &CatalogSeed) -> ValidationResult<()> {
    let mut seen = std::collections::HashSet::new();

    for service in &seed.services {
        validate_id("service.id", &service.id)?;
        validate_name("service.name", &service.name)?;
        validate_base_price(service.base_price_cents)?;
        if !seen.insert(("service", service.id.as_str())) {
            return Err(ValidationError::Duplicate {
                field: "service.id".to_string(),
                value: service.id.clone(),
            });
        }
    }

    for product in &seed.products {
        validate_id("product.id", &product.id)?;
        validate_name("product.name", &product.name)?;
        validate_base_price(product.base_price_cents)?;
        if product.stock < 0 {
            return Err(ValidationError::OutOfRange {
                field: "product.stock".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        if !seen.insert(("product", product.id.as_str())) {
            return Err(ValidationError::Duplicate {
                field: "product.id".to_string(),
                value: product.id.clone(),
            });
        }
    }

    for barber in &seed.barbers {
        validate_id("barber.id", &barber.id)?;
        validate_name("barber.name", &barber.name)?;
        if !seen.insert(("barber", barber.id.as_str())) {
            return Err(ValidationError::Duplicate {
                field: "barber.id".to_string(),
                value: barber.id.clone(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_request_requires_client_name() {
        let err = validate_sale_request(&SaleRequest::service("haircut", "", "joao")).unwrap_err();
        assert_eq!(err, ValidationError::required("client_name"));
    }

    #[test]
    fn test_missing_ids() {
        assert_eq!(
            validate_sale_request(&SaleRequest::service("", "Rui", "joao")).unwrap_err(),
            ValidationError::required("service_id")
        );
        assert_eq!(
            validate_sale_request(&SaleRequest::product("pomade", 1, " ")).unwrap_err(),
            ValidationError::required("barber_id")
        );
    }

    #[test]
    fn test_product_quantity_bounds() {
        assert!(validate_sale_request(&SaleRequest::product("pomade", 1, "joao")).is_ok());
        assert!(validate_sale_request(&SaleRequest::product("pomade", 999, "joao")).is_ok());
        assert!(matches!(
            validate_sale_request(&SaleRequest::product("pomade", 0, "joao")),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_sale_request(&SaleRequest::product("pomade", -2, "joao")).is_err());
    }

    #[test]
    fn test_id_format() {
        assert!(validate_id("service_id", "hair-design_2").is_ok());
        assert!(validate_id("service_id", "hair design").is_err());
        assert!(validate_id("service_id", &"x".repeat(MAX_ID_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_duration_never_rejects_a_sale() {
        let request = SaleRequest::Service {
            service_id: "haircut".into(),
            client_name: "Rui".into(),
            barber_id: "joao".into(),
            notes: Some("extra: sobrancelha".into()),
            duration_minutes: Some(45),
        };
        assert!(validate_sale_request(&request).is_ok());

        let request = SaleRequest::Service {
            service_id: "haircut".into(),
            client_name: "Rui".into(),
            barber_id: "joao".into(),
            notes: None,
            duration_minutes: Some(0),
        };
        assert!(validate_sale_request(&request).is_ok());

        let request = SaleRequest::Service {
            service_id: "haircut".into(),
            client_name: "Rui".into(),
            barber_id: "joao".into(),
            notes: Some("x".repeat(MAX_NOTES_LENGTH + 1)),
            duration_minutes: Some(720),
        };
        assert!(validate_sale_request(&request).is_err());
    }

    #[test]
    fn test_default_catalog_is_valid() {
        assert!(validate_catalog_seed(&CatalogSeed::default()).is_ok());
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let mut seed = CatalogSeed::default();
        let first = seed.services[0].clone();
        seed.services.push(first);
        assert!(matches!(
            validate_catalog_seed(&seed),
            Err(ValidationError::Duplicate { .. })
        ));
    }
}
