//! Ledger consistency engine.
//!
//! This module implements the core ledger functionality:
//! - Domain types for accounts, categories and kind-tagged transactions
//! - Transaction construction (factory)
//! - Business rule validation
//! - Store contracts and the unit-of-work session
//! - Income, expense and transfer ledgers
//! - An in-memory reference store
//! - Error types for ledger operations

mod book;
pub mod error;
pub mod expense;
pub mod factory;
pub mod income;
pub mod memory;
mod query;
pub mod store;
pub mod transfer;
pub mod types;
pub mod validation;

#[cfg(test)]
mod ledger_props;
#[cfg(test)]
mod testing;

pub use error::LedgerError;
pub use expense::ExpenseLedger;
pub use factory::{FactoryError, TransactionDraft, TransactionFactory};
pub use income::IncomeLedger;
pub use memory::{InMemoryLedgerStore, InMemorySession};
pub use store::{AccountStore, CategoryStore, LedgerSession, LedgerStore, TransactionRepository};
pub use transfer::TransferLedger;
pub use types::{
    Account, BalanceEffect, Category, CategoryType, EntryInput, MONEY_SCALE, Transaction,
    TransactionDetail, TransactionKind, TransferInput,
};
