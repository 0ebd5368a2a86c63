//! `SeaORM` active enums stored as text columns.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use budget_core::ledger::types;

/// Stored category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CategoryType {
    /// `INCOME`
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// `EXPENSE`
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
}

/// Stored transaction discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TransactionKind {
    /// `INCOME`
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// `EXPENSE`
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    /// `TRANSFER`
    #[sea_orm(string_value = "TRANSFER")]
    Transfer,
}

impl From<types::CategoryType> for CategoryType {
    fn from(value: types::CategoryType) -> Self {
        match value {
            types::CategoryType::Income => Self::Income,
            types::CategoryType::Expense => Self::Expense,
        }
    }
}

impl From<CategoryType> for types::CategoryType {
    fn from(value: CategoryType) -> Self {
        match value {
            CategoryType::Income => Self::Income,
            CategoryType::Expense => Self::Expense,
        }
    }
}

impl From<types::TransactionKind> for TransactionKind {
    fn from(value: types::TransactionKind) -> Self {
        match value {
            types::TransactionKind::Income => Self::Income,
            types::TransactionKind::Expense => Self::Expense,
            types::TransactionKind::Transfer => Self::Transfer,
        }
    }
}

impl From<TransactionKind> for types::TransactionKind {
    fn from(value: TransactionKind) -> Self {
        match value {
            TransactionKind::Income => Self::Income,
            TransactionKind::Expense => Self::Expense,
            TransactionKind::Transfer => Self::Transfer,
        }
    }
}
