//! Engine errors
//!
//! One taxonomy for every public operation. Each variant carries a stable
//! machine code; ConfigMiss and Conflict are recovered internally with a
//! warning log and never normally reach a caller.

use novastate_core::CoreError;
use novastate_persistence::StoreError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Operation layer errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Expired: {0}")]
    Expired(String),

    #[error("Insufficient funds: need {needed}, available {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown configuration: {0}")]
    ConfigMiss(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database-level failures; callers retry with backoff.
    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Stable machine code for surfaces and retry policies.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NotFound { .. } => "NOT_FOUND",
            EngineError::InvalidState(_) => "INVALID_STATE",
            EngineError::Expired(_) => "EXPIRED",
            EngineError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            EngineError::Validation(_) => "VALIDATION",
            EngineError::ConfigMiss(_) => "CONFIG_MISS",
            EngineError::Conflict(_) => "CONFLICT",
            EngineError::Store(_) => "FATAL",
            EngineError::Core(e) => e.code(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Store(_))
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::Store(other),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Store(StoreError::Database(err))
    }
}
