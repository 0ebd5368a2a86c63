//! Income ledger: money credited to one account.

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
use super::validation::{ensure_category_type, ensure_kind};

const KIND: TransactionKind = TransactionKind::Income;

/// Records, changes and removes incomes while keeping balances consistent.
pub struct IncomeLedger<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> Clone for IncomeLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> IncomeLedger<S> {
    /// Creates a ledger over `store`.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Records an income and credits its account.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` / `CategoryNotFound` for unknown references
    /// - `InvalidTransaction` if the category is not an income category or the
    ///   amount is not positive
    pub async fn create(&self, input: EntryInput) -> Result<Transaction, LedgerError> {
        let mut session = self.store.begin().await?;
        let result = Self::create_in(&mut session, input).await;
        let income = finish(session, result).await?;

        info!(
            transaction_id = %income.id,
            account_id = %income.account_id,
            amount = %income.amount,
            "Income recorded"
        );
        Ok(income)
    }

    async fn create_in(
        session: &mut S::Session,
        input: EntryInput,
    ) -> Result<Transaction, LedgerError> {
        let mut book = AccountBook::lock(session, [input.account_id]).await?;
        book.get(input.account_id)?;

        let category = session.find_category(input.category_id).await?;
        ensure_category_type(&category, CategoryType::Income)?;

        let income = TransactionFactory::create(KIND, input.into())?;

        book.apply_all(income.effects())?;
        book.flush(session).await?;
        session.insert_transaction(&income).await
    }

    /// Replaces an income's fields, moving its credit if the account changes.
    ///
    /// The old credit is undone and the new one applied within one session.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound` if `id` is unknown
    /// - `InvalidTransaction` if `id` is not an income, or the new fields are invalid
    /// - `AccountNotFound` / `CategoryNotFound` for unknown references
    /// - `InvalidAccount` if undoing the old credit would overdraw the old account
    pub async fn update(
        &self,
        id: TransactionId,
        input: EntryInput,
    ) -> Result<Transaction, LedgerError> {
        let mut session = self.store.begin().await?;
        let result = Self::update_in(&mut session, id, input).await;
        let income = finish(session, result).await?;

        info!(
            transaction_id = %income.id,
            account_id = %income.account_id,
            amount = %income.amount,
            "Income updated"
        );
        Ok(income)
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
        ensure_category_type(&category, CategoryType::Income)?;

        let income = TransactionFactory::rebuild(&existing, input.into())?;

        book.apply_all(income.effects())?;
        book.flush(session).await?;
        session.update_transaction(&income).await
    }

    /// Removes an income and takes its credit back from the account.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound` if `id` is unknown
    /// - `InvalidTransaction` if `id` is not an income
    /// - `InvalidAccount` if the account no longer holds the credited amount
    pub async fn delete(&self, id: TransactionId) -> Result<(), LedgerError> {
        let mut session = self.store.begin().await?;
        let result = Self::delete_in(&mut session, id).await;
        finish(session, result).await?;

        info!(transaction_id = %id, "Income deleted");
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

    /// Loads one income.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound` if absent, `InvalidTransaction` if not an income.
    pub async fn find_by_id(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        query::find_by_id(self.store.as_ref(), id, KIND).await
    }

    /// Loads every income.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn find_all(&self) -> Result<Vec<Transaction>, LedgerError> {
        query::find_all(self.store.as_ref(), KIND).await
    }

    /// Incomes credited to `account_id`.
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

    /// Incomes filed under `category_id`.
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

    /// Incomes dated within `[start, end]`.
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

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::ledger::testing::{Fixture, at, entry};

    #[tokio::test]
    async fn test_create_credits_account() {
        let fx = Fixture::new().await;
        let ledger = IncomeLedger::new(fx.store.clone());

        let income = ledger
            .create(entry(fx.checking.id, fx.salary.id, dec!(250.00)))
            .await
            .unwrap();

        assert_eq!(income.kind(), TransactionKind::Income);
        assert_eq!(fx.balance(fx.checking.id).await, dec!(1250.00));
        assert_eq!(ledger.find_by_id(income.id).await.unwrap(), income);
    }

    #[tokio::test]
    async fn test_create_rejects_expense_category() {
        let fx = Fixture::new().await;
        let ledger = IncomeLedger::new(fx.store.clone());

        let err = ledger
            .create(entry(fx.checking.id, fx.groceries.id, dec!(10)))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid transaction: Category must be of type INCOME"
        );
        assert_eq!(fx.balance(fx.checking.id).await, dec!(1000.00));
        assert!(fx.store.transactions().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_balance_overflow() {
        let fx = Fixture::new().await;
        let ledger = IncomeLedger::new(fx.store.clone());

        let err = ledger
            .create(entry(fx.checking.id, fx.salary.id, rust_decimal::Decimal::MAX))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::InvalidTransaction(_)));
        assert_eq!(
            err.to_string(),
            "Invalid transaction: Amount is out of range for the balance of account Checking"
        );
        assert_eq!(fx.balance(fx.checking.id).await, dec!(1000.00));
        assert!(fx.store.transactions().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_references() {
        let fx = Fixture::new().await;
        let ledger = IncomeLedger::new(fx.store.clone());

        let missing_account = AccountId::new();
        assert!(matches!(
            ledger
                .create(entry(missing_account, fx.salary.id, dec!(1)))
                .await,
            Err(LedgerError::AccountNotFound(id)) if id == missing_account
        ));

        let missing_category = CategoryId::new();
        assert!(matches!(
            ledger
                .create(entry(fx.checking.id, missing_category, dec!(1)))
                .await,
            Err(LedgerError::CategoryNotFound(id)) if id == missing_category
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_amount() {
        let fx = Fixture::new().await;
        let ledger = IncomeLedger::new(fx.store.clone());

        let err = ledger
            .create(entry(fx.checking.id, fx.salary.id, dec!(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransaction(_)));
        assert_eq!(fx.balance(fx.checking.id).await, dec!(1000.00));
    }

    #[tokio::test]
    async fn test_failed_record_write_rolls_back_credit() {
        let fx = Fixture::new().await;
        let ledger = IncomeLedger::new(fx.store.clone());
        fx.store.set_transaction_writes_failing(true);

        let err = ledger
            .create(entry(fx.checking.id, fx.salary.id, dec!(80)))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Database(_)));
        assert_eq!(fx.balance(fx.checking.id).await, dec!(1000.00));
    }

    #[tokio::test]
    async fn test_update_moves_credit_between_accounts() {
        let fx = Fixture::new().await;
        let ledger = IncomeLedger::new(fx.store.clone());
        let income = ledger
            .create(entry(fx.checking.id, fx.salary.id, dec!(100)))
            .await
            .unwrap();

        let updated = ledger
            .update(income.id, entry(fx.savings.id, fx.salary.id, dec!(40)))
            .await
            .unwrap();

        assert_eq!(updated.id, income.id);
        assert_eq!(updated.created_at, income.created_at);
        assert_eq!(updated.account_id, fx.savings.id);
        assert_eq!(fx.balance(fx.checking.id).await, dec!(1000.00));
        assert_eq!(fx.balance(fx.savings.id).await, dec!(540.00));
    }

    #[tokio::test]
    async fn test_update_with_same_fields_keeps_balance() {
        let fx = Fixture::new().await;
        let ledger = IncomeLedger::new(fx.store.clone());
        let income = ledger
            .create(entry(fx.checking.id, fx.salary.id, dec!(100)))
            .await
            .unwrap();

        ledger
            .update(income.id, entry(fx.checking.id, fx.salary.id, dec!(100)))
            .await
            .unwrap();

        assert_eq!(fx.balance(fx.checking.id).await, dec!(1100.00));
    }

    #[tokio::test]
    async fn test_update_with_wrong_category_leaves_everything() {
        let fx = Fixture::new().await;
        let ledger = IncomeLedger::new(fx.store.clone());
        let income = ledger
            .create(entry(fx.checking.id, fx.salary.id, dec!(100)))
            .await
            .unwrap();

        let err = ledger
            .update(income.id, entry(fx.savings.id, fx.groceries.id, dec!(5)))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::InvalidTransaction(_)));
        assert_eq!(fx.balance(fx.checking.id).await, dec!(1100.00));
        assert_eq!(fx.balance(fx.savings.id).await, dec!(500.00));
        assert_eq!(ledger.find_by_id(income.id).await.unwrap(), income);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let fx = Fixture::new().await;
        let ledger = IncomeLedger::new(fx.store.clone());
        let id = TransactionId::new();

        assert!(matches!(
            ledger
                .update(id, entry(fx.checking.id, fx.salary.id, dec!(1)))
                .await,
            Err(LedgerError::TransactionNotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_delete_takes_credit_back() {
        let fx = Fixture::new().await;
        let ledger = IncomeLedger::new(fx.store.clone());
        let income = ledger
            .create(entry(fx.checking.id, fx.salary.id, dec!(100)))
            .await
            .unwrap();
        assert_eq!(fx.balance(fx.checking.id).await, dec!(1100.00));

        ledger.delete(income.id).await.unwrap();

        assert_eq!(fx.balance(fx.checking.id).await, dec!(1000.00));
        assert!(matches!(
            ledger.find_by_id(income.id).await,
            Err(LedgerError::TransactionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_of_spent_income_fails_without_changes() {
        let fx = Fixture::new().await;
        let ledger = IncomeLedger::new(fx.store.clone());
        let income = ledger
            .create(entry(fx.empty.id, fx.salary.id, dec!(30)))
            .await
            .unwrap();
        let expenses = crate::ledger::ExpenseLedger::new(fx.store.clone());
        expenses
            .create(entry(fx.empty.id, fx.groceries.id, dec!(20)))
            .await
            .unwrap();

        let err = ledger.delete(income.id).await.unwrap_err();

        assert!(matches!(err, LedgerError::InvalidAccount(_)));
        assert_eq!(fx.balance(fx.empty.id).await, dec!(10));
        assert!(ledger.find_by_id(income.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_operations_reject_other_kinds() {
        let fx = Fixture::new().await;
        let expenses = crate::ledger::ExpenseLedger::new(fx.store.clone());
        let expense = expenses
            .create(entry(fx.checking.id, fx.groceries.id, dec!(10)))
            .await
            .unwrap();
        let ledger = IncomeLedger::new(fx.store.clone());

        let expected = format!(
            "Invalid transaction: Transaction with id {} is not an income",
            expense.id
        );
        assert_eq!(
            ledger.find_by_id(expense.id).await.unwrap_err().to_string(),
            expected
        );
        assert_eq!(
            ledger.delete(expense.id).await.unwrap_err().to_string(),
            expected
        );
        assert_eq!(fx.balance(fx.checking.id).await, dec!(990.00));
    }

    #[tokio::test]
    async fn test_queries_only_return_incomes() {
        let fx = Fixture::new().await;
        let ledger = IncomeLedger::new(fx.store.clone());
        let expenses = crate::ledger::ExpenseLedger::new(fx.store.clone());

        let early = ledger
            .create(EntryInput {
                transaction_date: at(2026, 1, 5),
                ..entry(fx.checking.id, fx.salary.id, dec!(10))
            })
            .await
            .unwrap();
        let late = ledger
            .create(EntryInput {
                transaction_date: at(2026, 3, 5),
                ..entry(fx.savings.id, fx.salary.id, dec!(20))
            })
            .await
            .unwrap();
        expenses
            .create(EntryInput {
                transaction_date: at(2026, 1, 6),
                ..entry(fx.checking.id, fx.groceries.id, dec!(5))
            })
            .await
            .unwrap();

        assert_eq!(ledger.find_all().await.unwrap().len(), 2);
        assert_eq!(
            ledger.find_by_account(fx.checking.id).await.unwrap(),
            vec![early.clone()]
        );
        assert_eq!(ledger.find_by_category(fx.salary.id).await.unwrap().len(), 2);
        assert!(ledger.find_by_category(fx.groceries.id).await.unwrap().is_empty());
        assert_eq!(
            ledger
                .find_by_date_range(at(2026, 1, 1), at(2026, 1, 31))
                .await
                .unwrap(),
            vec![early]
        );
        assert_eq!(
            ledger
                .find_by_date_range(at(2026, 3, 5), at(2026, 3, 5))
                .await
                .unwrap(),
            vec![late]
        );
        assert!(matches!(
            ledger.find_by_account(AccountId::new()).await,
            Err(LedgerError::AccountNotFound(_))
        ));
    }
}
