//! Expense ledger: money debited from one account.
//!
//! Every write checks that the account can cover the amount. On update the
//! check runs against the balance with the old debit already undone.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::info;

use budget_shared::types::{AccountId, CategoryId, TransactionId};

use super::book::AccountBook;
use super::error::LedgerError;
use super::factory::TransactionFactory;
use super::query;
use super::store::{CategoryStore, LedgerStore, TransactionRepository, finish};
use super::types::{CategoryType, EntryInput, Transaction, TransactionKind};
use super::validation::{ensure_category_type, ensure_kind, ensure_sufficient_funds};

const KIND: TransactionKind = TransactionKind::Expense;

/// Records, changes and removes expenses while keeping balances consistent.
pub struct ExpenseLedger<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> Clone for ExpenseLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> ExpenseLedger<S> {
    /// Creates a ledger over `store`.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Records an expense and debits its account.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` / `CategoryNotFound` for unknown references
    /// - `InvalidTransaction` if the category is not an expense category or
    ///   the amount is not positive
    /// - `InsufficientFunds` if the account balance is below the amount
    pub async fn create(&self, input: EntryInput) -> Result<Transaction, LedgerError> {
        let mut session = self.store.begin().await?;
        let result = Self::create_in(&mut session, input).await;
        let expense = finish(session, result).await?;

        info!(
            transaction_id = %expense.id,
            account_id = %expense.account_id,
            amount = %expense.amount,
            "Expense recorded"
        );
        Ok(expense)
    }

    async fn create_in(
        session: &mut S::Session,
        input: EntryInput,
    ) -> Result<Transaction, LedgerError> {
        let mut book = AccountBook::lock(session, [input.account_id]).await?;
        book.get(input.account_id)?;

        let category = session.find_category(input.category_id).await?;
        ensure_category_type(&category, CategoryType::Expense)?;
        ensure_sufficient_funds(book.get(input.account_id)?, input.amount)?;

        let expense = TransactionFactory::create(KIND, input.into())?;

        book.apply_all(expense.effects())?;
        book.flush(session).await?;
        session.insert_transaction(&expense).await
    }

    /// Replaces an expense's fields.
    ///
    /// The old debit is undone first, then the new request is checked
    /// against the restored balance, then the new debit is applied. No
    /// balance is written unless every check passes.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound` if `id` is unknown
    /// - `InvalidTransaction` if `id` is not an expense, or the new fields are invalid
    /// - `AccountNotFound` / `CategoryNotFound` for unknown references
    /// - `InsufficientFunds` if the restored balance cannot cover the new amount
    pub async fn update(
        &self,
        id: TransactionId,
        input: EntryInput,
    ) -> Result<Transaction, LedgerError> {
        let mut session = self.store.begin().await?;
        let result = Self::update_in(&mut session, id, input).await;
        let expense = finish(session, result).await?;

        info!(
            transaction_id = %expense.id,
            account_id = %expense.account_id,
            amount = %expense.amount,
            "Expense updated"
        );
        Ok(expense)
    }

    async fn update_in(
        session: &mut S::Session,
        id: TransactionId,
        input: EntryInput,
    ) -> Result<Transaction, LedgerError> {
        let existing = session
            .lock_transaction(id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))?;
        ensure_kind(id, &existing, KIND)?;

        let mut book = AccountBook::lock(
            session,
            existing.touched_accounts().into_iter().chain([input.account_id]),
        )
        .await?;
        book.reverse_all(existing.effects())?;

        book.get(input.account_id)?;
        let category = session.find_category(input.category_id).await?;
        ensure_category_type(&category, CategoryType::Expense)?;
        ensure_sufficient_funds(book.get(input.account_id)?, input.amount)?;

        let expense = TransactionFactory::rebuild(&existing, input.into())?;

        book.apply_all(expense.effects())?;
        book.flush(session).await?;
        session.update_transaction(&expense).await
    }

    /// Removes an expense and refunds its account.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound` if `id` is unknown
    /// - `InvalidTransaction` if `id` is not an expense
    pub async fn delete(&self, id: TransactionId) -> Result<(), LedgerError> {
        let mut session = self.store.begin().await?;
        let result = Self::delete_in(&mut session, id).await;
        finish(session, result).await?;

        info!(transaction_id = %id, "Expense deleted");
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

    /// Loads one expense.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound` if absent, `InvalidTransaction` if not an expense.
    pub async fn find_by_id(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        query::find_by_id(self.store.as_ref(), id, KIND).await
    }

    /// Loads every expense.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn find_all(&self) -> Result<Vec<Transaction>, LedgerError> {
        query::find_all(self.store.as_ref(), KIND).await
    }

    /// Expenses debited from `account_id`.
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

    /// Expenses filed under `category_id`.
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

    /// Expenses dated within `[start, end]`.
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
