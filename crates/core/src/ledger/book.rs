//! Locked working set of accounts for one ledger operation.
//!
//! Balance effects are applied here in memory. Nothing reaches the store
//! until [`AccountBook::flush`], which the ledgers call only after every
//! check of the operation has passed.

use std::collections::{BTreeMap, BTreeSet};

use budget_shared::types::AccountId;

use super::error::LedgerError;
use super::store::AccountStore;
use super::types::{Account, BalanceEffect};

/// Accounts locked for the current session, keyed by id.
#[derive(Debug, Default)]
pub(crate) struct AccountBook {
    accounts: BTreeMap<AccountId, Account>,
    touched: BTreeSet<AccountId>,
}

impl AccountBook {
    /// Locks `ids` through `store` and loads the rows that exist.
    pub(crate) async fn lock<S: AccountStore>(
        store: &mut S,
        ids: impl IntoIterator<Item = AccountId>,
    ) -> Result<Self, LedgerError> {
        let ids: Vec<AccountId> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let rows = store.lock_accounts(&ids).await?;

        Ok(Self {
            accounts: rows.into_iter().map(|a| (a.id, a)).collect(),
            touched: BTreeSet::new(),
        })
    }

    /// Returns the working copy of an account.
    pub(crate) fn get(&self, id: AccountId) -> Result<&Account, LedgerError> {
        self.accounts
            .get(&id)
            .ok_or(LedgerError::AccountNotFound(id))
    }

    /// Applies one signed delta to the working copy.
    ///
    /// A delta that would overflow the balance is rejected and leaves the
    /// working copy unchanged.
    pub(crate) fn apply(&mut self, effect: BalanceEffect) -> Result<(), LedgerError> {
        let account = self
            .accounts
            .get_mut(&effect.account_id)
            .ok_or(LedgerError::AccountNotFound(effect.account_id))?;

        account.balance = account.balance.checked_add(effect.delta).ok_or_else(|| {
            LedgerError::InvalidTransaction(format!(
                "Amount is out of range for the balance of account {}",
                account.name
            ))
        })?;
        self.touched.insert(effect.account_id);

        tracing::debug!(
            account_id = %effect.account_id,
            delta = %effect.delta,
            balance = %account.balance,
            "Balance effect applied"
        );
        Ok(())
    }

    /// Applies every effect in order.
    pub(crate) fn apply_all(
        &mut self,
        effects: impl IntoIterator<Item = BalanceEffect>,
    ) -> Result<(), LedgerError> {
        effects.into_iter().try_for_each(|effect| self.apply(effect))
    }

    /// Undoes every effect in order.
    pub(crate) fn reverse_all(
        &mut self,
        effects: impl IntoIterator<Item = BalanceEffect>,
    ) -> Result<(), LedgerError> {
        self.apply_all(effects.into_iter().map(BalanceEffect::reversed))
    }

    /// Writes every touched account back in ascending id order.
    ///
    /// The store validates each row, so a balance driven below zero fails
    /// here with `InvalidAccount`.
    pub(crate) async fn flush<S: AccountStore>(self, store: &mut S) -> Result<(), LedgerError> {
        for id in &self.touched {
            if let Some(account) = self.accounts.get(id) {
                store.save_account(account).await?;
            }
        }
        Ok(())
    }
}
