//! Business rule validation for ledger operations.
//!
//! Pure checks shared by the three ledgers and by every store that persists
//! accounts or categories.

use rust_decimal::Decimal;

use budget_shared::types::{AccountId, TransactionId};

use super::error::LedgerError;
use super::types::{Account, Category, CategoryType, MONEY_SCALE, Transaction, TransactionKind};

/// Fails unless `category` classifies movements of `expected` type.
///
/// # Errors
///
/// Returns `InvalidTransaction` on a type mismatch.
pub fn ensure_category_type(
    category: &Category,
    expected: CategoryType,
) -> Result<(), LedgerError> {
    if category.category_type == expected {
        Ok(())
    } else {
        Err(LedgerError::InvalidTransaction(format!(
            "Category must be of type {expected}"
        )))
    }
}

/// Fails unless `account` can cover `amount` with its current balance.
///
/// A balance exactly equal to the amount is sufficient.
///
/// # Errors
///
/// Returns `InsufficientFunds` naming the account, its balance and the amount.
pub fn ensure_sufficient_funds(account: &Account, amount: Decimal) -> Result<(), LedgerError> {
    if account.balance < amount {
        return Err(LedgerError::insufficient_funds(account, amount));
    }
    Ok(())
}

/// Fails if a transfer would move money from an account to itself.
///
/// # Errors
///
/// Returns `SameAccountTransfer` when both ids are equal.
pub fn ensure_distinct_accounts(from: AccountId, to: AccountId) -> Result<(), LedgerError> {
    if from == to {
        return Err(LedgerError::SameAccountTransfer);
    }
    Ok(())
}

/// Fails unless the stored record carries the discriminator `expected`.
///
/// # Errors
///
/// Returns `InvalidTransaction` when a record of another kind was found under `id`.
pub fn ensure_kind(
    id: TransactionId,
    transaction: &Transaction,
    expected: TransactionKind,
) -> Result<(), LedgerError> {
    if transaction.kind() == expected {
        Ok(())
    } else {
        Err(LedgerError::InvalidTransaction(format!(
            "Transaction with id {id} is not {}",
            expected.article_noun()
        )))
    }
}

/// Field-level checks every account store runs before persisting.
///
/// # Errors
///
/// Returns `InvalidAccount` for an empty name or currency, or a negative balance.
pub fn validate_account(account: &Account) -> Result<(), LedgerError> {
    if account.name.trim().is_empty() {
        return Err(LedgerError::InvalidAccount(
            "Account name cannot be empty".to_string(),
        ));
    }
    if account.balance < Decimal::ZERO {
        return Err(LedgerError::InvalidAccount(
            "Account balance cannot be negative".to_string(),
        ));
    }
    if account.balance.normalize().scale() > MONEY_SCALE {
        return Err(LedgerError::InvalidAccount(format!(
            "Account balance cannot have more than {MONEY_SCALE} decimal places"
        )));
    }
    if account.currency.trim().is_empty() {
        return Err(LedgerError::InvalidAccount(
            "Account currency cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Field-level checks every category store runs before persisting.
///
/// Name uniqueness needs the store and is checked there.
///
/// # Errors
///
/// Returns `InvalidCategory` for an empty name.
pub fn validate_category(category: &Category) -> Result<(), LedgerError> {
    if category.name.trim().is_empty() {
        return Err(LedgerError::InvalidCategory(
            "Category name cannot be empty".to_string(),
        ));
    }
    Ok(())
}
