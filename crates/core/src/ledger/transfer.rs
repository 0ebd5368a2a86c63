//! Transfer ledger: money moved from a source account to a destination account.
//!
//! Transfers accept a category of either type; only incomes and expenses
//! check the category type.
//!
//! # Update ordering
//!
//! An update undoes the recorded transfer on its original accounts before it
//! looks at the new request: same-account check, resolution of the new
//! accounts and category, then the funds check against the restored source
//! balance. The undo happens on the locked working set only. No account row
//! is written until every check has passed, and the undo and the new
//! application are then written and committed together, so a rejected update
//! leaves no trace.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::info;

use budget_shared::types::{AccountId, CategoryId, TransactionId};

use super::book::AccountBook;
use super::error::LedgerError;
use super::factory::TransactionFactory;
use super::query;
use super::store::{CategoryStore, LedgerStore, TransactionRepository, finish};
use super::types::{Transaction, TransactionKind, TransferInput};
use super::validation::{ensure_distinct_accounts, ensure_kind, ensure_sufficient_funds};

const KIND: TransactionKind = TransactionKind::Transfer;

/// Records, changes and removes transfers while keeping both balances consistent.
pub struct TransferLedger<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> Clone for TransferLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> TransferLedger<S> {
    /// Creates a ledger over `store`.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Moves money between two accounts.
    ///
    /// Both accounts and the category are resolved before any rule is
    /// checked. The same-account rule is checked before the funds rule.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` / `CategoryNotFound` for unknown references
    /// - `SameAccountTransfer` if source and destination are equal
    /// - `InsufficientFunds` if the source balance is below the amount
    /// - `InvalidTransaction` if the amount is not positive
    pub async fn create(&self, input: TransferInput) -> Result<Transaction, LedgerError> {
        let mut session = self.store.begin().await?;
        let result = Self::create_in(&mut session, input).await;
        let transfer = finish(session, result).await?;

        info!(
            transaction_id = %transfer.id,
            from_account_id = %transfer.account_id,
            to_account_id = ?transfer.to_account_id(),
            amount = %transfer.amount,
            "Transfer recorded"
        );
        Ok(transfer)
    }

    async fn create_in(
        session: &mut S::Session,
        input: TransferInput,
    ) -> Result<Transaction, LedgerError> {
        let mut book =
            AccountBook::lock(session, [input.from_account_id, input.to_account_id]).await?;
        book.get(input.from_account_id)?;
        book.get(input.to_account_id)?;
        session.find_category(input.category_id).await?;

        ensure_distinct_accounts(input.from_account_id, input.to_account_id)?;
        ensure_sufficient_funds(book.get(input.from_account_id)?, input.amount)?;

        let transfer = TransactionFactory::create(KIND, input.into())?;

        book.apply_all(transfer.effects())?;
        book.flush(session).await?;
        session.insert_transaction(&transfer).await
    }

    /// Replaces a transfer's fields, see the module docs for the check order.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound` if `id` is unknown
    /// - `InvalidTransaction` if `id` is not a transfer, or the new fields are invalid
    /// - `SameAccountTransfer` if the new source and destination are equal
    /// - `AccountNotFound` / `CategoryNotFound` for unknown references
    /// - `InsufficientFunds` if the restored source balance cannot cover the amount
    /// - `InvalidAccount` if undoing the old credit would overdraw the old destination
    pub async fn update(
        &self,
        id: TransactionId,
        input: TransferInput,
    ) -> Result<Transaction, LedgerError> {
        let mut session = self.store.begin().await?;
        let result = Self::update_in(&mut session, id, input).await;
        let transfer = finish(session, result).await?;

        info!(
            transaction_id = %transfer.id,
            from_account_id = %transfer.account_id,
            to_account_id = ?transfer.to_account_id(),
            amount = %transfer.amount,
            "Transfer updated"
        );
        Ok(transfer)
    }

    async fn update_in(
        session: &mut S::Session,
        id: TransactionId,
        input: TransferInput,
    ) -> Result<Transaction, LedgerError> {
        let existing = session
            .lock_transaction(id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))?;
        ensure_kind(id, &existing, KIND)?;

        let mut book = AccountBook::lock(
            session,
            existing
                .touched_accounts()
                .into_iter()
                .chain([input.from_account_id, input.to_account_id]),
        )
        .await?;
        book.reverse_all(existing.effects())?;

        ensure_distinct_accounts(input.from_account_id, input.to_account_id)?;
        book.get(input.from_account_id)?;
        book.get(input.to_account_id)?;
        session.find_category(input.category_id).await?;
        ensure_sufficient_funds(book.get(input.from_account_id)?, input.amount)?;

        let transfer = TransactionFactory::rebuild(&existing, input.into())?;

        book.apply_all(transfer.effects())?;
        book.flush(session).await?;
        session.update_transaction(&transfer).await
    }

    /// Removes a transfer, returning the money to the source account.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound` if `id` is unknown
    /// - `InvalidTransaction` if `id` is not a transfer
    /// - `InvalidAccount` if the destination no longer holds the amount
    pub async fn delete(&self, id: TransactionId) -> Result<(), LedgerError> {
        let mut session = self.store.begin().await?;
        let result = Self::delete_in(&mut session, id).await;
        finish(session, result).await?;

        info!(transaction_id = %id, "Transfer deleted");
        Ok(())
    }

    async fn delete_in(session: &mut S::Session, id: TransactionId) -> Result<(), LedgerError> {
        let existing = session
            .lock_transaction(id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))?;
        ensure_kind(id, &existing, KIND)?;

        let mut book = AccountBook::lock(session, existing.touched_accounts()).await?;
        book.reverse_all(existing.effects())?;
        book.flush(session).await?;
        session.delete_transaction(id).await
    }

    /// Loads one transfer.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound` if absent, `InvalidTransaction` if not a transfer.
    pub async fn find_by_id(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        query::find_by_id(self.store.as_ref(), id, KIND).await
    }

    /// Loads every transfer.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn find_all(&self) -> Result<Vec<Transaction>, LedgerError> {
        query::find_all(self.store.as_ref(), KIND).await
    }

    /// Transfers out of `account_id`.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if the account is unknown.
    pub async fn find_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        query::find_by_account(self.store.as_ref(), account_id, KIND).await
    }

    /// Transfers into `account_id`.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if the account is unknown.
    pub async fn find_by_to_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        query::find_transfers_to(self.store.as_ref(), account_id).await
    }

    /// Transfers filed under `category_id`.
    ///
    /// # Errors
    ///
    /// `CategoryNotFound` if the category is unknown.
    pub async fn find_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        query::find_by_category(self.store.as_ref(), category_id, KIND).await
    }

    /// Transfers dated within `[start, end]`.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn find_by_date_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Transaction>, LedgerError> {
        query::find_by_date_range(self.store.as_ref(), start, end, KIND).await
    }
}
