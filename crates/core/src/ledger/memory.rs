//! In-memory reference implementation of the ledger store contracts.
//!
//! A session owns the store's mutex for its whole lifetime and works on a
//! staged copy of the state. `commit` publishes the copy; `rollback` or a
//! plain drop discards it. Holding one lock for every session serializes
//! all operations, which is stricter than the per-account locking the
//! contracts require.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};

use budget_shared::types::{AccountId, CategoryId, TransactionId};

use super::error::LedgerError;
use super::store::{AccountStore, CategoryStore, LedgerSession, LedgerStore, TransactionRepository};
use super::types::{Account, Category, Transaction, TransactionKind};
use super::validation::{validate_account, validate_category};

#[derive(Debug, Clone, Default)]
struct State {
    accounts: HashMap<AccountId, Account>,
    categories: HashMap<CategoryId, Category>,
    transactions: HashMap<TransactionId, Transaction>,
}

/// Map-backed [`LedgerStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<State>>,
    fail_transaction_writes: Arc<AtomicBool>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an account after validating it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccount` if the fields are rejected.
    pub async fn insert_account(&self, account: Account) -> Result<Account, LedgerError> {
        validate_account(&account)?;
        self.state
            .lock()
            .await
            .accounts
            .insert(account.id, account.clone());
        Ok(account)
    }

    /// Seeds a category after validating it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCategory` for an empty name and `DuplicateCategory`
    /// if the name is taken, ignoring case.
    pub async fn insert_category(&self, category: Category) -> Result<Category, LedgerError> {
        validate_category(&category)?;
        let mut state = self.state.lock().await;

        let taken = state
            .categories
            .values()
            .any(|c| c.id != category.id && same_name(&c.name, &category.name));
        if taken {
            return Err(LedgerError::DuplicateCategory(category.name));
        }

        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    /// Returns the committed state of an account.
    pub async fn account(&self, id: AccountId) -> Option<Account> {
        self.state.lock().await.accounts.get(&id).cloned()
    }

    /// Returns every committed transaction record.
    pub async fn transactions(&self) -> Vec<Transaction> {
        self.state
            .lock()
            .await
            .transactions
            .values()
            .cloned()
            .collect()
    }

    /// Makes every later transaction-record write fail with a database error.
    ///
    /// Account writes keep succeeding, so an operation fails after its
    /// balance writes were issued. Used to exercise rollback.
    pub fn set_transaction_writes_failing(&self, failing: bool) {
        self.fail_transaction_writes.store(failing, Ordering::SeqCst);
    }
}

impl LedgerStore for InMemoryLedgerStore {
    type Session = InMemorySession;

    async fn begin(&self) -> Result<Self::Session, LedgerError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(InMemorySession {
            guard,
            staged,
            fail_transaction_writes: Arc::clone(&self.fail_transaction_writes),
        })
    }
}

/// A unit of work over [`InMemoryLedgerStore`].
#[derive(Debug)]
pub struct InMemorySession {
    guard: OwnedMutexGuard<State>,
    staged: State,
    fail_transaction_writes: Arc<AtomicBool>,
}

impl InMemorySession {
    fn check_transaction_write(&self) -> Result<(), LedgerError> {
        if self.fail_transaction_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Database(
                "transaction table unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn collect(&self, predicate: impl Fn(&Transaction) -> bool) -> Vec<Transaction> {
        self.staged
            .transactions
            .values()
            .filter(|t| predicate(t))
            .cloned()
            .collect()
    }
}

impl AccountStore for InMemorySession {
    async fn find_account(&mut self, id: AccountId) -> Result<Account, LedgerError> {
        self.staged
            .accounts
            .get(&id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(id))
    }

    async fn lock_accounts(&mut self, ids: &[AccountId]) -> Result<Vec<Account>, LedgerError> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids
            .iter()
            .filter_map(|id| self.staged.accounts.get(id).cloned())
            .collect())
    }

    async fn save_account(&mut self, account: &Account) -> Result<Account, LedgerError> {
        validate_account(account)?;
        if !self.staged.accounts.contains_key(&account.id) {
            return Err(LedgerError::AccountNotFound(account.id));
        }
        self.staged.accounts.insert(account.id, account.clone());
        Ok(account.clone())
    }
}

impl CategoryStore for InMemorySession {
    async fn find_category(&mut self, id: CategoryId) -> Result<Category, LedgerError> {
        self.staged
            .categories
            .get(&id)
            .cloned()
            .ok_or(LedgerError::CategoryNotFound(id))
    }
}

impl TransactionRepository for InMemorySession {
    async fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, LedgerError> {
        Ok(self.staged.transactions.get(&id).cloned())
    }

    async fn lock_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, LedgerError> {
        Ok(self.staged.transactions.get(&id).cloned())
    }

    async fn insert_transaction(
        &mut self,
        transaction: &Transaction,
    ) -> Result<Transaction, LedgerError> {
        self.check_transaction_write()?;
        self.staged
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(transaction.clone())
    }

    async fn update_transaction(
        &mut self,
        transaction: &Transaction,
    ) -> Result<Transaction, LedgerError> {
        self.check_transaction_write()?;
        let stored = self
            .staged
            .transactions
            .get_mut(&transaction.id)
            .ok_or(LedgerError::TransactionNotFound(transaction.id))?;

        let created_at = stored.created_at;
        *stored = Transaction {
            created_at,
            ..transaction.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_transaction(&mut self, id: TransactionId) -> Result<(), LedgerError> {
        self.check_transaction_write()?;
        self.staged
            .transactions
            .remove(&id)
            .map(|_| ())
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    async fn transactions_by_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.collect(|t| t.account_id == account_id))
    }

    async fn transactions_by_category(
        &mut self,
        category_id: CategoryId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.collect(|t| t.category_id == category_id))
    }

    async fn transactions_between(
        &mut self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.collect(|t| t.transaction_date >= start && t.transaction_date <= end))
    }

    async fn transactions_of_kind(
        &mut self,
        kind: TransactionKind,
    ) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.collect(|t| t.kind() == kind))
    }

    async fn all_transactions(&mut self) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.collect(|_| true))
    }
}

impl LedgerSession for InMemorySession {
    async fn commit(self) -> Result<(), LedgerError> {
        let Self {
            mut guard, staged, ..
        } = self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self) -> Result<(), LedgerError> {
        Ok(())
    }
}

/// Category names compare trimmed and case-folded.
fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
