//! Ledger domain types: accounts, categories and kind-tagged transactions.
//!
//! A transaction is one record with a [`TransactionDetail`] tag. The tag
//! decides which validation rules apply and which balances move, so every
//! place that cares about the kind matches on it exhaustively.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use budget_shared::types::{AccountId, CategoryId, TransactionId};

/// Category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CategoryType {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl CategoryType {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

impl std::fmt::Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Credit to one account.
    Income,
    /// Debit from one account.
    Expense,
    /// Debit from a source account and credit to a destination account.
    Transfer,
}

impl TransactionKind {
    /// Returns the stored discriminator value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
            Self::Transfer => "TRANSFER",
        }
    }

    /// Lowercase noun used in error messages ("an income", "a transfer").
    #[must_use]
    pub const fn article_noun(self) -> &'static str {
        match self {
            Self::Income => "an income",
            Self::Expense => "an expense",
            Self::Transfer => "a transfer",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decimal places kept for amounts and balances.
pub const MONEY_SCALE: u32 = 4;

/// A money account holding a balance in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identity.
    pub id: AccountId,
    /// Display name (non-empty).
    pub name: String,
    /// Current balance, never negative after a committed ledger operation.
    pub balance: Decimal,
    /// Currency code (non-empty).
    pub currency: String,
}

impl Account {
    /// Creates an account with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, balance: Decimal, currency: impl Into<String>) -> Self {
        Self {
            id: AccountId::new(),
            name: name.into(),
            balance,
            currency: currency.into(),
        }
    }
}

/// An income or expense category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable identity.
    pub id: CategoryId,
    /// Name, unique ignoring case.
    pub name: String,
    /// Optional free text.
    pub description: Option<String>,
    /// Whether the category classifies incomes or expenses.
    pub category_type: CategoryType,
}

impl Category {
    /// Creates a category with a fresh id and no description.
    #[must_use]
    pub fn new(name: impl Into<String>, category_type: CategoryType) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            description: None,
            category_type,
        }
    }
}

/// Kind-specific part of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum TransactionDetail {
    /// Adds the amount to the account.
    Income,
    /// Subtracts the amount from the account.
    Expense,
    /// Moves the amount from the account to `to_account_id`.
    Transfer {
        /// Destination account.
        to_account_id: AccountId,
    },
}

impl TransactionDetail {
    /// Returns the discriminator for this detail.
    #[must_use]
    pub const fn kind(&self) -> TransactionKind {
        match self {
            Self::Income => TransactionKind::Income,
            Self::Expense => TransactionKind::Expense,
            Self::Transfer { .. } => TransactionKind::Transfer,
        }
    }
}

/// A signed balance delta a transaction contributes to one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceEffect {
    /// The affected account.
    pub account_id: AccountId,
    /// Positive for credits, negative for debits.
    pub delta: Decimal,
}

impl BalanceEffect {
    /// Returns the effect that undoes this one.
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            account_id: self.account_id,
            delta: -self.delta,
        }
    }
}

/// A recorded money movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Amount moved, strictly positive.
    pub amount: Decimal,
    /// Optional free text.
    pub description: Option<String>,
    /// When the movement happened.
    pub transaction_date: NaiveDateTime,
    /// When the record was created. Never changes after creation.
    pub created_at: DateTime<Utc>,
    /// Primary account (the source account for transfers).
    pub account_id: AccountId,
    /// Category of the movement.
    pub category_id: CategoryId,
    /// Kind tag and kind-specific fields.
    #[serde(flatten)]
    pub detail: TransactionDetail,
}

impl Transaction {
    /// Returns the discriminator.
    #[must_use]
    pub const fn kind(&self) -> TransactionKind {
        self.detail.kind()
    }

    /// Returns the destination account of a transfer.
    #[must_use]
    pub const fn to_account_id(&self) -> Option<AccountId> {
        match self.detail {
            TransactionDetail::Transfer { to_account_id } => Some(to_account_id),
            TransactionDetail::Income | TransactionDetail::Expense => None,
        }
    }

    /// Returns the balance effects this transaction has while persisted.
    #[must_use]
    pub fn effects(&self) -> Vec<BalanceEffect> {
        match self.detail {
            TransactionDetail::Income => vec![BalanceEffect {
                account_id: self.account_id,
                delta: self.amount,
            }],
            TransactionDetail::Expense => vec![BalanceEffect {
                account_id: self.account_id,
                delta: -self.amount,
            }],
            TransactionDetail::Transfer { to_account_id } => vec![
                BalanceEffect {
                    account_id: self.account_id,
                    delta: -self.amount,
                },
                BalanceEffect {
                    account_id: to_account_id,
                    delta: self.amount,
                },
            ],
        }
    }

    /// Returns every account this transaction references.
    #[must_use]
    pub fn touched_accounts(&self) -> Vec<AccountId> {
        match self.detail {
            TransactionDetail::Transfer { to_account_id } => vec![self.account_id, to_account_id],
            TransactionDetail::Income | TransactionDetail::Expense => vec![self.account_id],
        }
    }

    /// Returns true if the transaction references `account_id` in any role.
    #[must_use]
    pub fn references_account(&self, account_id: AccountId) -> bool {
        self.touched_accounts().contains(&account_id)
    }
}

/// Request fields for creating or updating an income or an expense.
#[derive(Debug, Clone)]
pub struct EntryInput {
    /// Account to credit (income) or debit (expense).
    pub account_id: AccountId,
    /// Category; its type must match the ledger kind.
    pub category_id: CategoryId,
    /// Amount, strictly positive.
    pub amount: Decimal,
    /// Optional free text.
    pub description: Option<String>,
    /// When the movement happened.
    pub transaction_date: NaiveDateTime,
}

/// Request fields for creating or updating a transfer.
#[derive(Debug, Clone)]
pub struct TransferInput {
    /// Account to debit.
    pub from_account_id: AccountId,
    /// Account to credit.
    pub to_account_id: AccountId,
    /// Category, any type.
    pub category_id: CategoryId,
    /// Amount, strictly positive.
    pub amount: Decimal,
    /// Optional free text.
    pub description: Option<String>,
    /// When the movement happened.
    pub transaction_date: NaiveDateTime,
}
