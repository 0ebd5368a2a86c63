//! Shared fixtures for ledger tests.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use budget_shared::types::{AccountId, CategoryId};

use super::memory::InMemoryLedgerStore;
use super::types::{Account, Category, CategoryType, EntryInput, TransferInput};

/// A seeded store: three accounts and one category of each type.
pub(crate) struct Fixture {
    pub store: Arc<InMemoryLedgerStore>,
    /// 1000.00 USD.
    pub checking: Account,
    /// 500.00 USD.
    pub savings: Account,
    /// 0 USD.
    pub empty: Account,
    pub salary: Category,
    pub groceries: Category,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryLedgerStore::new());
        let checking = store
            .insert_account(Account::new("Checking", dec!(1000.00), "USD"))
            .await
            .unwrap();
        let savings = store
            .insert_account(Account::new("Savings", dec!(500.00), "USD"))
            .await
            .unwrap();
        let empty = store
            .insert_account(Account::new("Empty", Decimal::ZERO, "USD"))
            .await
            .unwrap();
        let salary = store
            .insert_category(Category::new("Salary", CategoryType::Income))
            .await
            .unwrap();
        let groceries = store
            .insert_category(Category::new("Groceries", CategoryType::Expense))
            .await
            .unwrap();

        Self {
            store,
            checking,
            savings,
            empty,
            salary,
            groceries,
        }
    }

    pub async fn balance(&self, id: AccountId) -> Decimal {
        self.store.account(id).await.unwrap().balance
    }
}

pub(crate) fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap()
}

pub(crate) fn entry(account_id: AccountId, category_id: CategoryId, amount: Decimal) -> EntryInput {
    EntryInput {
        account_id,
        category_id,
        amount,
        description: Some("test".to_string()),
        transaction_date: at(2026, 2, 1),
    }
}

pub(crate) fn transfer(
    from_account_id: AccountId,
    to_account_id: AccountId,
    category_id: CategoryId,
    amount: Decimal,
) -> TransferInput {
    TransferInput {
        from_account_id,
        to_account_id,
        category_id,
        amount,
        description: None,
        transaction_date: at(2026, 2, 1),
    }
}
