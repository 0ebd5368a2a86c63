//! Ledger store over a database transaction.
//!
//! [`SeaLedgerStore::begin`] opens one `DatabaseTransaction` per ledger
//! operation. Row locks are `SELECT ... FOR UPDATE` on backends that support
//! them; SQLite already serializes write transactions, so the lock clause is
//! skipped there.

use chrono::{NaiveDateTime, Utc};
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
};

use budget_core::ledger::{
    Account, AccountStore, Category, CategoryStore, LedgerError, LedgerSession, LedgerStore,
    Transaction, TransactionKind, TransactionRepository, validation::validate_account,
};
use budget_shared::types::{AccountId, CategoryId, TransactionId};

use super::{db_error, transaction_active_model};
use crate::entities::{accounts, categories, sea_orm_active_enums, transactions};

/// Opens [`SeaLedgerSession`]s on a connection pool.
#[derive(Debug, Clone)]
pub struct SeaLedgerStore {
    db: DatabaseConnection,
}

impl SeaLedgerStore {
    /// Creates a new ledger store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl LedgerStore for SeaLedgerStore {
    type Session = SeaLedgerSession;

    async fn begin(&self) -> Result<SeaLedgerSession, LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;
        Ok(SeaLedgerSession { txn })
    }
}

/// One ledger unit of work backed by a `DatabaseTransaction`.
///
/// Dropping the session without committing rolls the transaction back.
pub struct SeaLedgerSession {
    txn: DatabaseTransaction,
}

impl std::fmt::Debug for SeaLedgerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeaLedgerSession").finish_non_exhaustive()
    }
}

impl SeaLedgerSession {
    /// Adds an exclusive row lock where the backend has one.
    fn locked<E: EntityTrait>(&self, select: Select<E>) -> Select<E> {
        if self.txn.get_database_backend() == DbBackend::Sqlite {
            select
        } else {
            select.lock_exclusive()
        }
    }

    async fn fetch(
        &self,
        select: Select<transactions::Entity>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        select
            .all(&self.txn)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }
}

impl AccountStore for SeaLedgerSession {
    async fn find_account(&mut self, id: AccountId) -> Result<Account, LedgerError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(db_error)?
            .map(Account::from)
            .ok_or(LedgerError::AccountNotFound(id))
    }

    async fn lock_accounts(&mut self, ids: &[AccountId]) -> Result<Vec<Account>, LedgerError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(ids.iter().copied().map(AccountId::into_inner)))
            .order_by_asc(accounts::Column::Id);

        let rows = self.locked(query).all(&self.txn).await.map_err(db_error)?;
        Ok(rows.into_iter().map(Account::from).collect())
    }

    async fn save_account(&mut self, account: &Account) -> Result<Account, LedgerError> {
        validate_account(account)?;

        let model = accounts::ActiveModel {
            id: Unchanged(account.id.into_inner()),
            name: Set(account.name.clone()),
            balance: Set(account.balance),
            currency: Set(account.currency.clone()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        match model.update(&self.txn).await {
            Ok(_) => Ok(account.clone()),
            Err(DbErr::RecordNotUpdated | DbErr::RecordNotFound(_)) => {
                Err(LedgerError::AccountNotFound(account.id))
            }
            Err(err) => Err(db_error(err)),
        }
    }
}

impl CategoryStore for SeaLedgerSession {
    async fn find_category(&mut self, id: CategoryId) -> Result<Category, LedgerError> {
        categories::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(db_error)?
            .map(Category::from)
            .ok_or(LedgerError::CategoryNotFound(id))
    }
}

impl TransactionRepository for SeaLedgerSession {
    async fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, LedgerError> {
        transactions::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(db_error)?
            .map(Transaction::try_from)
            .transpose()
    }

    async fn lock_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, LedgerError> {
        let query = transactions::Entity::find_by_id(id.into_inner());
        self.locked(query)
            .one(&self.txn)
            .await
            .map_err(db_error)?
            .map(Transaction::try_from)
            .transpose()
    }

    async fn insert_transaction(
        &mut self,
        transaction: &Transaction,
    ) -> Result<Transaction, LedgerError> {
        transactions::Entity::insert(transaction_active_model(transaction, true))
            .exec_without_returning(&self.txn)
            .await
            .map_err(db_error)?;
        Ok(transaction.clone())
    }

    async fn update_transaction(
        &mut self,
        transaction: &Transaction,
    ) -> Result<Transaction, LedgerError> {
        match transaction_active_model(transaction, false)
            .update(&self.txn)
            .await
        {
            Ok(model) => Ok(Transaction {
                created_at: model.created_at,
                ..transaction.clone()
            }),
            Err(DbErr::RecordNotUpdated | DbErr::RecordNotFound(_)) => {
                Err(LedgerError::TransactionNotFound(transaction.id))
            }
            Err(err) => Err(db_error(err)),
        }
    }

    async fn delete_transaction(&mut self, id: TransactionId) -> Result<(), LedgerError> {
        let result = transactions::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(db_error)?;

        if result.rows_affected == 0 {
            return Err(LedgerError::TransactionNotFound(id));
        }
        Ok(())
    }

    async fn transactions_by_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.fetch(
            transactions::Entity::find()
                .filter(transactions::Column::AccountId.eq(account_id.into_inner())),
        )
        .await
    }

    async fn transactions_by_category(
        &mut self,
        category_id: CategoryId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.fetch(
            transactions::Entity::find()
                .filter(transactions::Column::CategoryId.eq(category_id.into_inner())),
        )
        .await
    }

    async fn transactions_between(
        &mut self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.fetch(
            transactions::Entity::find()
                .filter(transactions::Column::TransactionDate.between(start, end)),
        )
        .await
    }

    async fn transactions_of_kind(
        &mut self,
        kind: TransactionKind,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.fetch(
            transactions::Entity::find().filter(
                transactions::Column::Kind.eq(sea_orm_active_enums::TransactionKind::from(kind)),
            ),
        )
        .await
    }

    async fn all_transactions(&mut self) -> Result<Vec<Transaction>, LedgerError> {
        self.fetch(transactions::Entity::find()).await
    }
}

impl LedgerSession for SeaLedgerSession {
    async fn commit(self) -> Result<(), LedgerError> {
        self.txn.commit().await.map_err(db_error)
    }

    async fn rollback(self) -> Result<(), LedgerError> {
        self.txn.rollback().await.map_err(db_error)
    }
}
