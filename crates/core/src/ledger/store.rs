//! Persistence contracts the ledgers depend on.
//!
//! These traits are implemented by the db crate over a database transaction
//! and by [`super::memory::InMemoryLedgerStore`]. A [`LedgerSession`] is one
//! unit of work: every write issued through it becomes visible together on
//! [`LedgerSession::commit`], or not at all.
//!
//! Lock order inside a session is fixed: at most one transaction row first,
//! then accounts in ascending id order, all before any balance write.

use std::future::Future;

use chrono::NaiveDateTime;

use budget_shared::types::{AccountId, CategoryId, TransactionId};

use super::error::LedgerError;
use super::types::{Account, Category, Transaction, TransactionKind};

/// Account access within a session.
pub trait AccountStore: Send {
    /// Loads an account without locking it.
    ///
    /// Fails with `AccountNotFound` if absent.
    fn find_account(
        &mut self,
        id: AccountId,
    ) -> impl Future<Output = Result<Account, LedgerError>> + Send;

    /// Acquires exclusive locks on the given accounts for the rest of the session.
    ///
    /// Locks are taken in ascending id order regardless of the order of `ids`.
    /// Returns the rows that exist; missing ids are simply absent.
    fn lock_accounts(
        &mut self,
        ids: &[AccountId],
    ) -> impl Future<Output = Result<Vec<Account>, LedgerError>> + Send;

    /// Persists an account's fields, validating them first.
    fn save_account(
        &mut self,
        account: &Account,
    ) -> impl Future<Output = Result<Account, LedgerError>> + Send;
}

/// Category access within a session.
pub trait CategoryStore: Send {
    /// Loads a category.
    ///
    /// Fails with `CategoryNotFound` if absent.
    fn find_category(
        &mut self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Category, LedgerError>> + Send;
}

/// Transaction record access within a session.
///
/// Collections come back in no particular order.
pub trait TransactionRepository: Send {
    /// Loads a transaction record.
    fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> impl Future<Output = Result<Option<Transaction>, LedgerError>> + Send;

    /// Loads a transaction record and locks it for the rest of the session.
    fn lock_transaction(
        &mut self,
        id: TransactionId,
    ) -> impl Future<Output = Result<Option<Transaction>, LedgerError>> + Send;

    /// Inserts a new record.
    fn insert_transaction(
        &mut self,
        transaction: &Transaction,
    ) -> impl Future<Output = Result<Transaction, LedgerError>> + Send;

    /// Overwrites an existing record. `created_at` is never rewritten.
    fn update_transaction(
        &mut self,
        transaction: &Transaction,
    ) -> impl Future<Output = Result<Transaction, LedgerError>> + Send;

    /// Removes a record.
    fn delete_transaction(
        &mut self,
        id: TransactionId,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Records whose primary account is `account_id`.
    ///
    /// Transfers match on their source account only.
    fn transactions_by_account(
        &mut self,
        account_id: AccountId,
    ) -> impl Future<Output = Result<Vec<Transaction>, LedgerError>> + Send;

    /// Records filed under `category_id`.
    fn transactions_by_category(
        &mut self,
        category_id: CategoryId,
    ) -> impl Future<Output = Result<Vec<Transaction>, LedgerError>> + Send;

    /// Records dated within `[start, end]`, both ends inclusive.
    fn transactions_between(
        &mut self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> impl Future<Output = Result<Vec<Transaction>, LedgerError>> + Send;

    /// Records whose discriminator is `kind`.
    fn transactions_of_kind(
        &mut self,
        kind: TransactionKind,
    ) -> impl Future<Output = Result<Vec<Transaction>, LedgerError>> + Send;

    /// Every record.
    fn all_transactions(
        &mut self,
    ) -> impl Future<Output = Result<Vec<Transaction>, LedgerError>> + Send;
}

/// One atomic unit of work over accounts, categories and transactions.
///
/// Dropping a session without committing discards its writes.
pub trait LedgerSession: AccountStore + CategoryStore + TransactionRepository + Sized {
    /// Makes every write of this session visible.
    fn commit(self) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Discards every write of this session.
    fn rollback(self) -> impl Future<Output = Result<(), LedgerError>> + Send;
}

/// Opens ledger sessions.
pub trait LedgerStore: Send + Sync {
    /// Session type handed out by [`LedgerStore::begin`].
    type Session: LedgerSession;

    /// Starts a new unit of work.
    fn begin(&self) -> impl Future<Output = Result<Self::Session, LedgerError>> + Send;
}

/// Rolls `session` back after `err` and hands the error on.
///
/// A rollback failure is logged; the original error is what the caller sees.
pub(crate) async fn abort<S: LedgerSession, T>(session: S, err: LedgerError) -> Result<T, LedgerError> {
    if let Err(rollback_err) = session.rollback().await {
        tracing::warn!(error = %rollback_err, cause = %err, "Rollback failed");
    }
    Err(err)
}

/// Commits `session` if `result` is `Ok`, rolls it back otherwise.
pub(crate) async fn finish<S: LedgerSession, T>(
    session: S,
    result: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match result {
        Ok(value) => {
            session.commit().await?;
            Ok(value)
        }
        Err(err) => abort(session, err).await,
    }
}
