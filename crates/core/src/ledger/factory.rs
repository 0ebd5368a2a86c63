//! Construction of kind-tagged transaction records.
//!
//! The factory is stateless: it checks that every field the requested kind
//! needs is present and returns a record with a fresh id and creation stamp.
//! It never touches balances or stores.

use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use budget_shared::types::{AccountId, CategoryId, TransactionId};

use super::types::{
    EntryInput, MONEY_SCALE, Transaction, TransactionDetail, TransactionKind, TransferInput,
};

/// Rejected construction arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    /// No amount given.
    #[error("Transaction amount cannot be null")]
    MissingAmount,

    /// Amount is zero or negative.
    #[error("Transaction amount must be positive")]
    NonPositiveAmount,

    /// Amount has more decimal places than balances are stored with.
    #[error("Transaction amount cannot have more than 4 decimal places")]
    AmountTooPrecise,

    /// No transaction date given.
    #[error("Transaction date cannot be null")]
    MissingDate,

    /// No primary account given.
    #[error("From account cannot be null")]
    MissingFromAccount,

    /// No category given.
    #[error("Category cannot be null")]
    MissingCategory,

    /// Transfer without destination.
    #[error("To account is required for transfer transactions")]
    MissingToAccount,
}

/// Loose construction arguments, each possibly missing.
#[derive(Debug, Clone, Default)]
pub struct TransactionDraft {
    /// Amount to move.
    pub amount: Option<Decimal>,
    /// Optional free text.
    pub description: Option<String>,
    /// When the movement happened.
    pub transaction_date: Option<NaiveDateTime>,
    /// Primary account (source for transfers).
    pub from_account_id: Option<AccountId>,
    /// Destination account, transfers only.
    pub to_account_id: Option<AccountId>,
    /// Category of the movement.
    pub category_id: Option<CategoryId>,
}

impl From<EntryInput> for TransactionDraft {
    fn from(input: EntryInput) -> Self {
        Self {
            amount: Some(input.amount),
            description: input.description,
            transaction_date: Some(input.transaction_date),
            from_account_id: Some(input.account_id),
            to_account_id: None,
            category_id: Some(input.category_id),
        }
    }
}

impl From<TransferInput> for TransactionDraft {
    fn from(input: TransferInput) -> Self {
        Self {
            amount: Some(input.amount),
            description: input.description,
            transaction_date: Some(input.transaction_date),
            from_account_id: Some(input.from_account_id),
            to_account_id: Some(input.to_account_id),
            category_id: Some(input.category_id),
        }
    }
}

/// Builds correctly-tagged [`Transaction`] records.
pub struct TransactionFactory;

impl TransactionFactory {
    /// Creates a transaction of `kind` from `draft`.
    ///
    /// Checks run in a fixed order: amount, date, from account, category,
    /// then the destination account for transfers. `to_account_id` is
    /// ignored for incomes and expenses.
    ///
    /// # Errors
    ///
    /// Returns the first [`FactoryError`] whose precondition fails.
    pub fn create(
        kind: TransactionKind,
        draft: TransactionDraft,
    ) -> Result<Transaction, FactoryError> {
        let amount = draft.amount.ok_or(FactoryError::MissingAmount)?;
        let transaction_date = draft.transaction_date.ok_or(FactoryError::MissingDate)?;
        let account_id = draft
            .from_account_id
            .ok_or(FactoryError::MissingFromAccount)?;
        let category_id = draft.category_id.ok_or(FactoryError::MissingCategory)?;

        let detail = match kind {
            TransactionKind::Income => TransactionDetail::Income,
            TransactionKind::Expense => TransactionDetail::Expense,
            TransactionKind::Transfer => TransactionDetail::Transfer {
                to_account_id: draft.to_account_id.ok_or(FactoryError::MissingToAccount)?,
            },
        };

        if amount <= Decimal::ZERO {
            return Err(FactoryError::NonPositiveAmount);
        }
        if amount.normalize().scale() > MONEY_SCALE {
            return Err(FactoryError::AmountTooPrecise);
        }

        Ok(Transaction {
            id: TransactionId::new(),
            amount,
            description: draft.description,
            transaction_date,
            created_at: Utc::now(),
            account_id,
            category_id,
            detail,
        })
    }

    /// Builds the replacement for `existing` from `draft`.
    ///
    /// The result keeps the identity and creation stamp of `existing`; every
    /// other field comes from the draft and passes the same checks as
    /// [`TransactionFactory::create`].
    ///
    /// # Errors
    ///
    /// Returns the first [`FactoryError`] whose precondition fails.
    pub fn rebuild(
        existing: &Transaction,
        draft: TransactionDraft,
    ) -> Result<Transaction, FactoryError> {
        let fresh = Self::create(existing.kind(), draft)?;
        Ok(Transaction {
            id: existing.id,
            created_at: existing.created_at,
            ..fresh
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn full_draft() -> TransactionDraft {
        TransactionDraft {
            amount: Some(dec!(42.00)),
            description: Some("groceries".to_string()),
            transaction_date: chrono::NaiveDate::from_ymd_opt(2026, 2, 14)
                .and_then(|d| d.and_hms_opt(9, 30, 0)),
            from_account_id: Some(AccountId::new()),
            to_account_id: Some(AccountId::new()),
            category_id: Some(CategoryId::new()),
        }
    }

    #[rstest]
    #[case(TransactionKind::Income)]
    #[case(TransactionKind::Expense)]
    #[case(TransactionKind::Transfer)]
    fn test_creates_requested_kind(#[case] kind: TransactionKind) {
        let draft = full_draft();
        let tx = TransactionFactory::create(kind, draft.clone()).unwrap();
        assert_eq!(tx.kind(), kind);
        assert_eq!(tx.amount, dec!(42.00));
        assert_eq!(tx.account_id, draft.from_account_id.unwrap());
        assert_eq!(tx.category_id, draft.category_id.unwrap());
        assert_eq!(tx.description.as_deref(), Some("groceries"));
    }

    #[test]
    fn test_to_account_only_kept_for_transfers() {
        let draft = full_draft();
        let income = TransactionFactory::create(TransactionKind::Income, draft.clone()).unwrap();
        assert_eq!(income.to_account_id(), None);

        let transfer = TransactionFactory::create(TransactionKind::Transfer, draft.clone()).unwrap();
        assert_eq!(transfer.to_account_id(), draft.to_account_id);
    }

    #[test]
    fn test_description_is_optional() {
        let draft = TransactionDraft {
            description: None,
            ..full_draft()
        };
        let tx = TransactionFactory::create(TransactionKind::Expense, draft).unwrap();
        assert!(tx.description.is_none());
    }

    #[rstest]
    #[case(TransactionDraft { amount: None, ..full_draft() }, FactoryError::MissingAmount)]
    #[case(TransactionDraft { transaction_date: None, ..full_draft() }, FactoryError::MissingDate)]
    #[case(TransactionDraft { from_account_id: None, ..full_draft() }, FactoryError::MissingFromAccount)]
    #[case(TransactionDraft { category_id: None, ..full_draft() }, FactoryError::MissingCategory)]
    #[case(TransactionDraft { amount: Some(Decimal::ZERO), ..full_draft() }, FactoryError::NonPositiveAmount)]
    #[case(TransactionDraft { amount: Some(dec!(-1)), ..full_draft() }, FactoryError::NonPositiveAmount)]
    #[case(TransactionDraft { amount: Some(dec!(0.00004)), ..full_draft() }, FactoryError::AmountTooPrecise)]
    #[case(TransactionDraft { amount: Some(dec!(-0.00004)), ..full_draft() }, FactoryError::NonPositiveAmount)]
    fn test_rejects_incomplete_draft(#[case] draft: TransactionDraft, #[case] expected: FactoryError) {
        assert_eq!(
            TransactionFactory::create(TransactionKind::Income, draft).unwrap_err(),
            expected
        );
    }

    #[test]
    fn test_transfer_requires_destination() {
        let draft = TransactionDraft {
            to_account_id: None,
            ..full_draft()
        };
        assert_eq!(
            TransactionFactory::create(TransactionKind::Transfer, draft.clone()).unwrap_err(),
            FactoryError::MissingToAccount
        );
        // Incomes never look at the destination.
        assert!(TransactionFactory::create(TransactionKind::Income, draft).is_ok());
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let err = TransactionFactory::create(TransactionKind::Transfer, TransactionDraft::default())
            .unwrap_err();
        assert_eq!(err, FactoryError::MissingAmount);
    }

    #[test]
    fn test_rebuild_keeps_identity_and_creation_stamp() {
        let original = TransactionFactory::create(TransactionKind::Expense, full_draft()).unwrap();
        let draft = TransactionDraft {
            amount: Some(dec!(7.25)),
            description: None,
            ..full_draft()
        };
        let rebuilt = TransactionFactory::rebuild(&original, draft).unwrap();
        assert_eq!(rebuilt.id, original.id);
        assert_eq!(rebuilt.created_at, original.created_at);
        assert_eq!(rebuilt.kind(), TransactionKind::Expense);
        assert_eq!(rebuilt.amount, dec!(7.25));
        assert!(rebuilt.description.is_none());
    }

    #[test]
    fn test_transfer_input_converts_to_complete_draft() {
        let input = TransferInput {
            from_account_id: AccountId::new(),
            to_account_id: AccountId::new(),
            category_id: CategoryId::new(),
            amount: dec!(3),
            description: None,
            transaction_date: chrono::NaiveDate::from_ymd_opt(2026, 5, 1)
                .and_then(|d| d.and_hms_opt(8, 0, 0))
                .unwrap(),
        };
        let tx = TransactionFactory::create(TransactionKind::Transfer, input.clone().into()).unwrap();
        assert_eq!(tx.account_id, input.from_account_id);
        assert_eq!(tx.to_account_id(), Some(input.to_account_id));
    }

    #[test]
    fn test_each_record_gets_fresh_id() {
        let a = TransactionFactory::create(TransactionKind::Income, full_draft()).unwrap();
        let b = TransactionFactory::create(TransactionKind::Income, full_draft()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[rstest]
    #[case(dec!(0.0001))]
    #[case(dec!(12.3400000))]
    #[case(dec!(999999999999.9999))]
    fn test_accepts_amounts_within_four_places(#[case] amount: Decimal) {
        let draft = TransactionDraft {
            amount: Some(amount),
            ..full_draft()
        };
        let tx = TransactionFactory::create(TransactionKind::Expense, draft).unwrap();
        assert_eq!(tx.amount, amount);
    }

    #[test]
    fn test_too_precise_amount_becomes_invalid_transaction() {
        let draft = TransactionDraft {
            amount: Some(dec!(10.00005)),
            ..full_draft()
        };
        let err: crate::ledger::LedgerError = TransactionFactory::create(TransactionKind::Income, draft)
            .unwrap_err()
            .into();
        assert_eq!(
            err.to_string(),
            "Invalid transaction: Transaction amount cannot have more than 4 decimal places"
        );
    }
}
