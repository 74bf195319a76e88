//! # Engine Error Types
//!
//! What callers of `record()`, `reverse()` and `summarize()` see.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Variant            Caller action             Retryable?               │
//! │  ─────────────────  ────────────────────────  ──────────               │
//! │  Validation         fix input, resubmit       no                       │
//! │  NotFound           refresh stale catalog     no                       │
//! │  InsufficientStock  lower quantity or abort   yes                      │
//! │  Unavailable        retry, database was busy  yes                      │
//! │  Persistence        report, nothing was kept  no                       │
//! │  Config             fix barber.toml / env     no                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed `record()` never leaves a partial write behind.

use barber_core::{CoreError, ValidationError};
use barber_db::DbError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or malformed input. Nothing was written.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Unknown catalog or transaction id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The product doesn't have enough units on hand.
    #[error("Insufficient stock for {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// The database was busy or the pool timed out. Nothing was written.
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// The durable store rejected or failed the write. It did not take effect.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True when the same request may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::InsufficientStock { .. } | EngineError::Unavailable(_)
        )
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => EngineError::Validation(v),
            CoreError::InvalidInput { reason } => {
                EngineError::Validation(ValidationError::InvalidFormat {
                    field: "price".to_string(),
                    reason,
                })
            }
        }
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DbError::InsufficientStock {
                product_id,
                available,
                requested,
            } => EngineError::InsufficientStock {
                product_id,
                available,
                requested,
            },
            other if other.is_transient() => EngineError::Unavailable(other.to_string()),
            other => EngineError::Persistence(other.to_string()),
        }
    }
}

// =============================================================================
// Config Error
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_keep_their_category() {
        let err: EngineError = DbError::not_found("Product", "pomade").into();
        assert!(matches!(err, EngineError::NotFound { .. }));

        let err: EngineError = DbError::InsufficientStock {
            product_id: "pomade".into(),
            available: 0,
            requested: 1,
        }
        .into();
        assert!(err.is_retryable());

        let err: EngineError = DbError::PoolExhausted.into();
        assert!(matches!(err, EngineError::Unavailable(_)));
        assert!(err.is_retryable());

        let err: EngineError = DbError::QueryFailed("database is locked".into()).into();
        assert!(matches!(err, EngineError::Unavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_rejected_writes_are_not_retryable() {
        let err: EngineError = DbError::ConstraintViolation {
            message: "transactions are append-only".into(),
        }
        .into();
        assert!(matches!(err, EngineError::Persistence(_)));
        assert!(!err.is_retryable());

        let err: EngineError = DbError::UniqueViolation {
            field: "transactions.id".into(),
            value: "t-1".into(),
        }
        .into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_pricing_input_becomes_validation() {
        let err: EngineError = CoreError::invalid_input("base price must not be negative").into();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(!err.is_retryable());
    }
}
