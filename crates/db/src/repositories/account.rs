//! Account repository for money account database operations.
//!
//! Plain CRUD outside the ledgers. Balances written here are taken as given,
//! so this is for opening balances and corrections, not money movements.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};

use budget_core::ledger::{Account, LedgerError, validation::validate_account};
use budget_shared::types::AccountId;

use super::db_error;
use crate::entities::{accounts, transactions};

/// Input for creating or updating an account.
#[derive(Debug, Clone)]
pub struct AccountInput {
    /// Display name.
    pub name: String,
    /// Balance to store.
    pub balance: Decimal,
    /// Currency code.
    pub currency: String,
}

/// Repository for account operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccount` if a field is rejected, or a database error.
    pub async fn create(&self, input: AccountInput) -> Result<Account, LedgerError> {
        let account = Account::new(input.name, input.balance, input.currency);
        validate_account(&account)?;

        let now = Utc::now();
        accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            name: Set(account.name.clone()),
            balance: Set(account.balance),
            currency: Set(account.currency.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(db_error)?;

        tracing::info!(account_id = %account.id, name = %account.name, "Account created");
        Ok(account)
    }

    /// Replaces an account's name, balance and currency.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `InvalidAccount`, or a database error.
    pub async fn update(&self, id: AccountId, input: AccountInput) -> Result<Account, LedgerError> {
        let mut account = self.find_by_id(id).await?;
        account.name = input.name;
        account.balance = input.balance;
        account.currency = input.currency;
        validate_account(&account)?;

        accounts::ActiveModel {
            id: Unchanged(id.into_inner()),
            name: Set(account.name.clone()),
            balance: Set(account.balance),
            currency: Set(account.currency.clone()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(db_error)?;

        Ok(account)
    }

    /// Deletes an account that no transaction references.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `InvalidAccount` while transactions still
    /// reference the account, or a database error.
    pub async fn delete(&self, id: AccountId) -> Result<(), LedgerError> {
        self.find_by_id(id).await?;

        let uuid = id.into_inner();
        let references = transactions::Entity::find()
            .filter(
                Condition::any()
                    .add(transactions::Column::AccountId.eq(uuid))
                    .add(transactions::Column::ToAccountId.eq(uuid)),
            )
            .count(&self.db)
            .await
            .map_err(db_error)?;

        if references > 0 {
            return Err(LedgerError::InvalidAccount(format!(
                "Account has {references} recorded transactions and cannot be deleted"
            )));
        }

        accounts::Entity::delete_by_id(uuid)
            .exec(&self.db)
            .await
            .map_err(db_error)?;

        tracing::info!(account_id = %id, "Account deleted");
        Ok(())
    }

    /// Loads an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or a database error.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Account, LedgerError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(Account::from)
            .ok_or(LedgerError::AccountNotFound(id))
    }

    /// Lists every account ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list(&self) -> Result<Vec<Account>, LedgerError> {
        let rows = accounts::Entity::find()
            .order_by_asc(accounts::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Account::from).collect())
    }

    /// Lists accounts whose name contains `needle`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn search_by_name(&self, needle: &str) -> Result<Vec<Account>, LedgerError> {
        let pattern = format!("%{}%", needle.trim().to_lowercase());
        let rows = accounts::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(accounts::Column::Name))).like(pattern))
            .order_by_asc(accounts::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Account::from).collect())
    }
}
