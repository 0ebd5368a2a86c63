//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every repository reports failures as [`LedgerError`].

pub mod account;
pub mod category;
pub mod ledger;

pub use account::{AccountInput, AccountRepository};
pub use category::{CategoryInput, CategoryRepository};
pub use ledger::{SeaLedgerSession, SeaLedgerStore};

use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{DbErr, RuntimeErr};

use budget_core::ledger::{
    Account, Category, LedgerError, Transaction, TransactionDetail, TransactionKind,
};
use budget_shared::types::{AccountId, CategoryId, TransactionId};

use crate::entities::{accounts, categories, sea_orm_active_enums, transactions};

/// Wraps a database error as a ledger error.
///
/// Lock conflicts reported by the driver become
/// [`LedgerError::ConcurrentModification`] so callers can retry.
pub(crate) fn db_error(err: DbErr) -> LedgerError {
    if let Some(code) = database_code(&err).filter(|code| is_lock_conflict(code)) {
        tracing::warn!(error = %err, code = %code, "Lock conflict, operation can be retried");
        return LedgerError::ConcurrentModification;
    }

    tracing::error!(error = %err, "Database operation failed");
    LedgerError::Database(err.to_string())
}

/// Driver error code carried by `err`, if any.
fn database_code(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sea_orm::sqlx::Error::Database(db)))
        | DbErr::Query(RuntimeErr::SqlxError(sea_orm::sqlx::Error::Database(db)))
        | DbErr::Conn(RuntimeErr::SqlxError(sea_orm::sqlx::Error::Database(db))) => {
            db.code().map(std::borrow::Cow::into_owned)
        }
        _ => None,
    }
}

/// Whether `code` reports a lock conflict rather than a real failure.
///
/// Postgres uses SQLSTATE strings; SQLite reports numeric result codes whose
/// low byte is the primary code.
fn is_lock_conflict(code: &str) -> bool {
    const SQLITE_BUSY: u32 = 5;
    const SQLITE_LOCKED: u32 = 6;

    match code {
        "40001" | "40P01" | "55P03" => true,
        _ if code.len() < 5 => code
            .parse::<u32>()
            .is_ok_and(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED)),
        _ => false,
    }
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: AccountId::from_uuid(model.id),
            name: model.name,
            balance: model.balance,
            currency: model.currency,
        }
    }
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: CategoryId::from_uuid(model.id),
            name: model.name,
            description: model.description,
            category_type: model.category_type.into(),
        }
    }
}

impl TryFrom<transactions::Model> for Transaction {
    type Error = LedgerError;

    fn try_from(model: transactions::Model) -> Result<Self, Self::Error> {
        let detail = match TransactionKind::from(model.kind) {
            TransactionKind::Income => TransactionDetail::Income,
            TransactionKind::Expense => TransactionDetail::Expense,
            TransactionKind::Transfer => {
                let to = model.to_account_id.ok_or_else(|| {
                    LedgerError::Internal(format!(
                        "Transfer with id {} has no destination account",
                        model.id
                    ))
                })?;
                TransactionDetail::Transfer {
                    to_account_id: AccountId::from_uuid(to),
                }
            }
        };

        Ok(Self {
            id: TransactionId::from_uuid(model.id),
            amount: model.amount,
            description: model.description,
            transaction_date: model.transaction_date,
            created_at: model.created_at,
            account_id: AccountId::from_uuid(model.account_id),
            category_id: CategoryId::from_uuid(model.category_id),
            detail,
        })
    }
}

/// Builds the row for `transaction`. `created_at` is left unset when
/// `with_created_at` is false so updates never rewrite it.
pub(crate) fn transaction_active_model(
    transaction: &Transaction,
    with_created_at: bool,
) -> transactions::ActiveModel {
    transactions::ActiveModel {
        id: Set(transaction.id.into_inner()),
        kind: Set(sea_orm_active_enums::TransactionKind::from(transaction.kind())),
        amount: Set(transaction.amount),
        description: Set(transaction.description.clone()),
        transaction_date: Set(transaction.transaction_date),
        created_at: if with_created_at {
            Set(transaction.created_at)
        } else {
            NotSet
        },
        account_id: Set(transaction.account_id.into_inner()),
        to_account_id: Set(transaction.to_account_id().map(AccountId::into_inner)),
        category_id: Set(transaction.category_id.into_inner()),
    }
}
