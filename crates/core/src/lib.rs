//! Core business logic for the budget ledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Domain types, validation rules, and the ledger consistency engine live here;
//! persistence is reached only through the traits in [`ledger::store`].
//!
//! # Modules
//!
//! - `ledger` - Income, expense and transfer ledgers that keep balances consistent

pub mod ledger;
