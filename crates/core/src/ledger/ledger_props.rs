//! Property-based tests for the income, expense and transfer ledgers.
//!
//! - Balance invariant: every balance equals its opening balance plus the
//!   effects of the records that are currently stored
//! - Delete undoes create
//! - Updating with unchanged fields leaves balances unchanged
//! - Debits equal to the balance succeed, one cent more fails

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;

use budget_shared::types::AccountId;

use super::error::LedgerError;
use super::memory::InMemoryLedgerStore;
use super::testing::{entry, transfer};
use super::types::{Account, Category, CategoryType, EntryInput, Transaction, TransactionKind};
use super::{ExpenseLedger, IncomeLedger, TransferLedger};

/// Strategy to generate positive decimal amounts (0.01 to 2,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..200_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate opening balances (0.00 to 1,000.00).
fn opening_balance() -> impl Strategy<Value = Decimal> {
    (0i64..100_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn kind_strategy() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![
        Just(TransactionKind::Income),
        Just(TransactionKind::Expense),
        Just(TransactionKind::Transfer),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Create {
        kind: TransactionKind,
        from: usize,
        to: usize,
        amount: Decimal,
    },
    Update {
        pick: usize,
        from: usize,
        to: usize,
        amount: Decimal,
    },
    Delete {
        pick: usize,
    },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (kind_strategy(), 0usize..3, 0usize..3, positive_amount())
            .prop_map(|(kind, from, to, amount)| Op::Create { kind, from, to, amount }),
        2 => (any::<usize>(), 0usize..3, 0usize..3, positive_amount())
            .prop_map(|(pick, from, to, amount)| Op::Update { pick, from, to, amount }),
        1 => any::<usize>().prop_map(|pick| Op::Delete { pick }),
    ]
}

struct World {
    store: Arc<InMemoryLedgerStore>,
    incomes: IncomeLedger<InMemoryLedgerStore>,
    expenses: ExpenseLedger<InMemoryLedgerStore>,
    transfers: TransferLedger<InMemoryLedgerStore>,
    accounts: Vec<Account>,
    income_category: Category,
    expense_category: Category,
}

impl World {
    async fn new(balances: &[Decimal]) -> Self {
        let store = Arc::new(InMemoryLedgerStore::new());
        let mut accounts = Vec::with_capacity(balances.len());
        for (i, balance) in balances.iter().enumerate() {
            accounts.push(
                store
                    .insert_account(Account::new(format!("Account {i}"), *balance, "USD"))
                    .await
                    .unwrap(),
            );
        }
        let income_category = store
            .insert_category(Category::new("Salary", CategoryType::Income))
            .await
            .unwrap();
        let expense_category = store
            .insert_category(Category::new("Rent", CategoryType::Expense))
            .await
            .unwrap();

        Self {
            incomes: IncomeLedger::new(store.clone()),
            expenses: ExpenseLedger::new(store.clone()),
            transfers: TransferLedger::new(store.clone()),
            store,
            accounts,
            income_category,
            expense_category,
        }
    }

    fn entry_for(&self, kind: TransactionKind, account: usize, amount: Decimal) -> EntryInput {
        let category = match kind {
            TransactionKind::Income => self.income_category.id,
            TransactionKind::Expense | TransactionKind::Transfer => self.expense_category.id,
        };
        entry(self.accounts[account].id, category, amount)
    }

    async fn create(
        &self,
        kind: TransactionKind,
        from: usize,
        to: usize,
        amount: Decimal,
    ) -> Result<Transaction, LedgerError> {
        match kind {
            TransactionKind::Income => self.incomes.create(self.entry_for(kind, from, amount)).await,
            TransactionKind::Expense => self.expenses.create(self.entry_for(kind, from, amount)).await,
            TransactionKind::Transfer => {
                self.transfers
                    .create(transfer(
                        self.accounts[from].id,
                        self.accounts[to].id,
                        self.expense_category.id,
                        amount,
                    ))
                    .await
            }
        }
    }

    async fn update(
        &self,
        existing: &Transaction,
        from: usize,
        to: usize,
        amount: Decimal,
    ) -> Result<Transaction, LedgerError> {
        let kind = existing.kind();
        match kind {
            TransactionKind::Income => {
                self.incomes
                    .update(existing.id, self.entry_for(kind, from, amount))
                    .await
            }
            TransactionKind::Expense => {
                self.expenses
                    .update(existing.id, self.entry_for(kind, from, amount))
                    .await
            }
            TransactionKind::Transfer => {
                self.transfers
                    .update(
                        existing.id,
                        transfer(
                            self.accounts[from].id,
                            self.accounts[to].id,
                            self.expense_category.id,
                            amount,
                        ),
                    )
                    .await
            }
        }
    }

    async fn delete(&self, existing: &Transaction) -> Result<(), LedgerError> {
        match existing.kind() {
            TransactionKind::Income => self.incomes.delete(existing.id).await,
            TransactionKind::Expense => self.expenses.delete(existing.id).await,
            TransactionKind::Transfer => self.transfers.delete(existing.id).await,
        }
    }

    async fn balances(&self) -> HashMap<AccountId, Decimal> {
        let mut out = HashMap::new();
        for account in &self.accounts {
            let stored = self.store.account(account.id).await.unwrap();
            out.insert(account.id, stored.balance);
        }
        out
    }

    /// Opening balances plus the effects of every stored record.
    async fn expected_balances(&self) -> HashMap<AccountId, Decimal> {
        let mut expected: HashMap<AccountId, Decimal> =
            self.accounts.iter().map(|a| (a.id, a.balance)).collect();
        for transaction in self.store.transactions().await {
            for effect in transaction.effects() {
                *expected.entry(effect.account_id).or_default() += effect.delta;
            }
        }
        expected
    }
}

fn run<F: std::future::Future<Output = T>, T>(future: F) -> T {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// *For any* sequence of ledger operations, committed or rejected, every
    /// balance SHALL equal its opening balance plus the effects of the stored
    /// records, and no balance SHALL be negative.
    #[test]
    fn prop_balance_invariant(
        openings in prop::collection::vec(opening_balance(), 3),
        ops in prop::collection::vec(op_strategy(), 1..25),
    ) {
        let (actual, expected) = run(async {
            let world = World::new(&openings).await;
            for op in ops {
                match op {
                    Op::Create { kind, from, to, amount } => {
                        let _ = world.create(kind, from, to, amount).await;
                    }
                    Op::Update { pick, from, to, amount } => {
                        let stored = world.store.transactions().await;
                        if !stored.is_empty() {
                            let existing = &stored[pick % stored.len()];
                            let _ = world.update(existing, from, to, amount).await;
                        }
                    }
                    Op::Delete { pick } => {
                        let stored = world.store.transactions().await;
                        if !stored.is_empty() {
                            let _ = world.delete(&stored[pick % stored.len()]).await;
                        }
                    }
                }
            }
            (world.balances().await, world.expected_balances().await)
        });

        prop_assert_eq!(&actual, &expected);
        for balance in actual.values() {
            prop_assert!(*balance >= Decimal::ZERO, "negative balance {}", balance);
        }
    }

    /// *For any* successful create, deleting the new record SHALL restore
    /// every balance exactly.
    #[test]
    fn prop_delete_undoes_create(
        openings in prop::collection::vec(opening_balance(), 3),
        kind in kind_strategy(),
        from in 0usize..3,
        offset in 1usize..3,
        amount in positive_amount(),
    ) {
        let (before, after) = run(async {
            let world = World::new(&openings).await;
            let before = world.balances().await;
            let to = (from + offset) % 3;
            if let Ok(created) = world.create(kind, from, to, amount).await {
                world.delete(&created).await.unwrap();
            }
            (before, world.balances().await)
        });

        prop_assert_eq!(before, after);
    }

    /// *For any* stored record, an update repeating its current fields SHALL
    /// succeed and leave every balance unchanged.
    #[test]
    fn prop_noop_update_keeps_balances(
        openings in prop::collection::vec(opening_balance(), 3),
        kind in kind_strategy(),
        from in 0usize..3,
        offset in 1usize..3,
        amount in positive_amount(),
    ) {
        let (before, after) = run(async {
            let world = World::new(&openings).await;
            let to = (from + offset) % 3;
            let Ok(created) = world.create(kind, from, to, amount).await else {
                return (HashMap::new(), HashMap::new());
            };
            let before = world.balances().await;
            world.update(&created, from, to, amount).await.unwrap();
            (before, world.balances().await)
        });

        prop_assert_eq!(before, after);
    }

    /// *For any* debit equal to the balance the account SHALL end at zero;
    /// one cent more SHALL fail with `InsufficientFunds` and change nothing.
    #[test]
    fn prop_debit_boundary(
        opening in opening_balance(),
        use_transfer in any::<bool>(),
    ) {
        let (over, after_over, exact, after_exact) = run(async {
            let world = World::new(&[opening, Decimal::ZERO, Decimal::ZERO]).await;
            let kind = if use_transfer { TransactionKind::Transfer } else { TransactionKind::Expense };
            let source = world.accounts[0].id;

            let over = world.create(kind, 0, 1, opening + Decimal::new(1, 2)).await;
            let after_over = world.store.account(source).await.unwrap().balance;
            let exact = if opening > Decimal::ZERO {
                Some(world.create(kind, 0, 1, opening).await)
            } else {
                None
            };
            let after_exact = world.store.account(source).await.unwrap().balance;
            (over, after_over, exact, after_exact)
        });

        prop_assert!(
            matches!(over, Err(LedgerError::InsufficientFunds { .. })),
            "expected InsufficientFunds, got {:?}",
            over
        );
        prop_assert_eq!(after_over, opening);
        if let Some(result) = exact {
            prop_assert!(result.is_ok());
            prop_assert_eq!(after_exact, Decimal::ZERO);
        }
    }
}
