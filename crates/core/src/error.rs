//! # Error Module
//!
//! Core error taxonomy. Every variant carries a stable machine-readable
//! code so callers and surfaces can branch without string matching.

use rust_decimal::Decimal;
use thiserror::Error;

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
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

    #[error("Unknown configuration key: {0}")]
    ConfigMiss(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Result type alias with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Stable machine code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::InvalidState(_) => "INVALID_STATE",
            CoreError::Expired(_) => "EXPIRED",
            CoreError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            CoreError::Validation(_) => "VALIDATION",
            CoreError::ConfigMiss(_) => "CONFIG_MISS",
            CoreError::Conflict(_) => "CONFLICT",
        }
    }

    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, CoreError::InsufficientFunds { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_display() {
        let err = CoreError::InsufficientFunds {
            needed: dec!(100),
            available: dec!(40),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: need 100, available 40"
        );
        assert!(err.is_insufficient_funds());

        let err = CoreError::not_found("Account", 7);
        assert_eq!(err.to_string(), "Account not found: 7");
    }

    #[test]
    fn test_error_codes_stable() {
        assert_eq!(CoreError::not_found("Quest", "q").code(), "NOT_FOUND");
        assert_eq!(CoreError::InvalidState("x".into()).code(), "INVALID_STATE");
        assert_eq!(CoreError::Expired("x".into()).code(), "EXPIRED");
        assert_eq!(CoreError::Validation("x".into()).code(), "VALIDATION");
        assert_eq!(CoreError::ConfigMiss("x".into()).code(), "CONFIG_MISS");
        assert_eq!(CoreError::Conflict("x".into()).code(), "CONFLICT");
    }
}
