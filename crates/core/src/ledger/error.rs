//! Ledger error types for lookup, validation and store failures.
//!
//! Business-rule violations are never retried; only concurrency conflicts
//! reported by a store are.

use budget_shared::AppError;
use budget_shared::types::{AccountId, CategoryId, TransactionId};
use rust_decimal::Decimal;
use thiserror::Error;

use super::factory::FactoryError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Lookup Errors ==========
    /// Account not found.
    #[error("Account not found with id: {0}")]
    AccountNotFound(AccountId),

    /// Category not found.
    #[error("Category not found with id: {0}")]
    CategoryNotFound(CategoryId),

    /// Transaction not found.
    #[error("Transaction not found with id: {0}")]
    TransactionNotFound(TransactionId),

    // ========== Business Rule Errors ==========
    /// Kind or category mismatch, or malformed construction arguments.
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// The debited account cannot cover the amount.
    #[error(
        "Insufficient funds in account {account_name}. Available: {available}, Required: {required}"
    )]
    InsufficientFunds {
        /// The debited account.
        account_id: AccountId,
        /// Its display name.
        account_name: String,
        /// Balance at the time of the check.
        available: Decimal,
        /// Amount that was requested.
        required: Decimal,
    },

    /// Source and destination of a transfer are the same account.
    #[error("Source and destination accounts must be different")]
    SameAccountTransfer,

    // ========== Store Validation Errors ==========
    /// Account fields rejected by the account store.
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    /// Category fields rejected by the category store.
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    /// Category name already taken (case-insensitive).
    #[error("Category with name '{0}' already exists")]
    DuplicateCategory(String),

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Infrastructure Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::InvalidTransaction(_) => "INVALID_TRANSACTION",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::SameAccountTransfer => "SAME_ACCOUNT_TRANSFER",
            Self::InvalidAccount(_) => "INVALID_ACCOUNT",
            Self::InvalidCategory(_) => "INVALID_CATEGORY",
            Self::DuplicateCategory(_) => "DUPLICATE_CATEGORY",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - business rule and validation errors
            Self::InvalidTransaction(_)
            | Self::InsufficientFunds { .. }
            | Self::SameAccountTransfer
            | Self::InvalidAccount(_)
            | Self::InvalidCategory(_)
            | Self::DuplicateCategory(_) => 400,

            // 404 Not Found
            Self::AccountNotFound(_)
            | Self::CategoryNotFound(_)
            | Self::TransactionNotFound(_) => 404,

            // 409 Conflict - concurrency errors
            Self::ConcurrentModification => 409,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }

    /// Builds an `InsufficientFunds` error for `account`.
    pub(crate) fn insufficient_funds(account: &super::types::Account, required: Decimal) -> Self {
        Self::InsufficientFunds {
            account_id: account.id,
            account_name: account.name.clone(),
            available: account.balance,
            required,
        }
    }
}

impl From<FactoryError> for LedgerError {
    fn from(err: FactoryError) -> Self {
        Self::InvalidTransaction(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::AccountNotFound(_)
            | LedgerError::CategoryNotFound(_)
            | LedgerError::TransactionNotFound(_) => Self::NotFound(message),
            LedgerError::InvalidTransaction(_)
            | LedgerError::InvalidAccount(_)
            | LedgerError::InvalidCategory(_)
            | LedgerError::DuplicateCategory(_) => Self::Validation(message),
            LedgerError::InsufficientFunds { .. } | LedgerError::SameAccountTransfer => {
                Self::BusinessRule(message)
            }
            LedgerError::ConcurrentModification => Self::Conflict(message),
            LedgerError::Database(_) => Self::Database(message),
            LedgerError::Internal(_) => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::SameAccountTransfer.error_code(),
            "SAME_ACCOUNT_TRANSFER"
        );
        assert_eq!(
            LedgerError::InvalidTransaction("x".into()).error_code(),
            "INVALID_TRANSACTION"
        );
        assert_eq!(
            LedgerError::AccountNotFound(AccountId::new()).error_code(),
            "ACCOUNT_NOT_FOUND"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            LedgerError::TransactionNotFound(TransactionId::new()).http_status_code(),
            404
        );
        assert_eq!(
            LedgerError::CategoryNotFound(CategoryId::new()).http_status_code(),
            404
        );
        assert_eq!(LedgerError::SameAccountTransfer.http_status_code(), 400);
        assert_eq!(
            LedgerError::InvalidTransaction("x".into()).http_status_code(),
            400
        );
        assert_eq!(LedgerError::ConcurrentModification.http_status_code(), 409);
        assert_eq!(
            LedgerError::Database("down".into()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::ConcurrentModification.is_retryable());
        assert!(!LedgerError::SameAccountTransfer.is_retryable());
        assert!(!LedgerError::Database("down".into()).is_retryable());
    }

    #[test]
    fn test_insufficient_funds_message() {
        let err = LedgerError::InsufficientFunds {
            account_id: AccountId::new(),
            account_name: "Checking".to_string(),
            available: dec!(100.00),
            required: dec!(150.00),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds in account Checking. Available: 100.00, Required: 150.00"
        );
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_factory_error_maps_to_invalid_transaction() {
        let err: LedgerError = FactoryError::MissingAmount.into();
        assert!(matches!(err, LedgerError::InvalidTransaction(_)));
        assert_eq!(
            err.to_string(),
            "Invalid transaction: Transaction amount cannot be null"
        );
    }

    #[test]
    fn test_app_error_mapping_keeps_status() {
        let cases = [
            LedgerError::AccountNotFound(AccountId::new()),
            LedgerError::InvalidTransaction("x".into()),
            LedgerError::SameAccountTransfer,
            LedgerError::ConcurrentModification,
            LedgerError::Internal("x".into()),
        ];
        for err in cases {
            let status = err.http_status_code();
            let app: AppError = err.into();
            assert_eq!(app.status_code(), status);
        }
    }
}
