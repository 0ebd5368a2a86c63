//! Read operations shared by the three ledgers.
//!
//! Every query runs in its own session and narrows the repository's result
//! to one kind.

use chrono::NaiveDateTime;

use budget_shared::types::{AccountId, CategoryId, TransactionId};

use super::error::LedgerError;
use super::store::{AccountStore, CategoryStore, LedgerStore, TransactionRepository, finish};
use super::types::{Transaction, TransactionKind};
use super::validation::ensure_kind;

fn of_kind(transactions: Vec<Transaction>, kind: TransactionKind) -> Vec<Transaction> {
    transactions.into_iter().filter(|t| t.kind() == kind).collect()
}

/// Loads one record and checks its kind.
pub(crate) async fn find_by_id<S: LedgerStore>(
    store: &S,
    id: TransactionId,
    kind: TransactionKind,
) -> Result<Transaction, LedgerError> {
    let mut session = store.begin().await?;
    let result = async {
        let transaction = session
            .find_transaction(id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))?;
        ensure_kind(id, &transaction, kind)?;
        Ok::<_, LedgerError>(transaction)
    }
    .await;
    finish(session, result).await
}

/// Loads every record tagged `kind`.
///
/// A row the repository returns under the wrong tag is reported, not skipped.
pub(crate) async fn find_all<S: LedgerStore>(
    store: &S,
    kind: TransactionKind,
) -> Result<Vec<Transaction>, LedgerError> {
    let mut session = store.begin().await?;
    let result = async {
        let transactions = session.transactions_of_kind(kind).await?;
        for transaction in &transactions {
            ensure_kind(transaction.id, transaction, kind)?;
        }
        Ok::<_, LedgerError>(transactions)
    }
    .await;
    finish(session, result).await
}

/// Records of `kind` whose primary account is `account_id`.
pub(crate) async fn find_by_account<S: LedgerStore>(
    store: &S,
    account_id: AccountId,
    kind: TransactionKind,
) -> Result<Vec<Transaction>, LedgerError> {
    let mut session = store.begin().await?;
    let result = async {
        session.find_account(account_id).await?;
        let transactions = session.transactions_by_account(account_id).await?;
        Ok::<_, LedgerError>(of_kind(transactions, kind))
    }
    .await;
    finish(session, result).await
}

/// Records of `kind` filed under `category_id`.
pub(crate) async fn find_by_category<S: LedgerStore>(
    store: &S,
    category_id: CategoryId,
    kind: TransactionKind,
) -> Result<Vec<Transaction>, LedgerError> {
    let mut session = store.begin().await?;
    let result = async {
        session.find_category(category_id).await?;
        let transactions = session.transactions_by_category(category_id).await?;
        Ok::<_, LedgerError>(of_kind(transactions, kind))
    }
    .await;
    finish(session, result).await
}

/// Records of `kind` dated within `[start, end]`.
pub(crate) async fn find_by_date_range<S: LedgerStore>(
    store: &S,
    start: NaiveDateTime,
    end: NaiveDateTime,
    kind: TransactionKind,
) -> Result<Vec<Transaction>, LedgerError> {
    let mut session = store.begin().await?;
    let result = session
        .transactions_between(start, end)
        .await
        .map(|transactions| of_kind(transactions, kind));
    finish(session, result).await
}

/// Transfers whose destination is `account_id`.
///
/// There is no destination index in the contract, so this scans every record.
pub(crate) async fn find_transfers_to<S: LedgerStore>(
    store: &S,
    account_id: AccountId,
) -> Result<Vec<Transaction>, LedgerError> {
    let mut session = store.begin().await?;
    let result = async {
        session.find_account(account_id).await?;
        let transactions = session.all_transactions().await?;
        Ok::<_, LedgerError>(
            transactions
                .into_iter()
                .filter(|t| t.to_account_id() == Some(account_id))
                .collect::<Vec<_>>(),
        )
    }
    .await;
    finish(session, result).await
}
