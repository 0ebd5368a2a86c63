//! Database seeder for budget ledger development and testing.
//!
//! Applies pending migrations, seeds default categories and a demo account,
//! then records one income, one expense and one transfer through the ledgers.
//! Running it again only fills in what is missing.
//!
//! Usage: cargo run --bin budget-seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use budget_core::ledger::{
    Account, Category, CategoryType, EntryInput, ExpenseLedger, IncomeLedger, TransferInput,
    TransferLedger,
};
use budget_db::migration::Migrator;
use budget_db::{
    AccountInput, AccountRepository, CategoryInput, CategoryRepository, SeaLedgerStore,
};
use budget_shared::{AppConfig, init_tracing};

const DEFAULT_CATEGORIES: &[(&str, CategoryType)] = &[
    ("Salary", CategoryType::Income),
    ("Interest", CategoryType::Income),
    ("Groceries", CategoryType::Expense),
    ("Rent", CategoryType::Expense),
    ("Utilities", CategoryType::Expense),
    ("Transport", CategoryType::Expense),
    ("Savings", CategoryType::Expense),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging).context("failed to install tracing subscriber")?;

    info!("Connecting to database...");
    let db = budget_db::connect_with(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await
    .context("failed to connect to database")?;

    Migrator::up(&db, None)
        .await
        .context("failed to apply migrations")?;

    let categories = CategoryRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());

    info!("Seeding categories...");
    for (name, category_type) in DEFAULT_CATEGORIES {
        seed_category(&categories, name, *category_type).await?;
    }

    info!("Seeding demo accounts...");
    let (checking, checking_created) =
        seed_account(&accounts, "Demo Checking", dec!(2500.00)).await?;
    let (savings, _) = seed_account(&accounts, "Demo Savings", Decimal::ZERO).await?;

    if checking_created {
        info!("Recording sample transactions...");
        let salary = category(&categories, "Salary").await?;
        let groceries = category(&categories, "Groceries").await?;
        let saving = category(&categories, "Savings").await?;
        record_samples(db, &checking, &savings, &salary, &groceries, &saving).await?;
    } else {
        info!("Demo account already present, skipping sample transactions");
    }

    info!("Seeding complete!");
    Ok(())
}

async fn seed_category(
    repo: &CategoryRepository,
    name: &str,
    category_type: CategoryType,
) -> anyhow::Result<()> {
    if repo.find_by_name(name).await?.is_some() {
        info!(name, "Category already exists, skipping");
        return Ok(());
    }
    repo.create(CategoryInput {
        name: name.to_string(),
        description: None,
        category_type,
    })
    .await?;
    Ok(())
}

/// Returns the account named `name`, creating it when absent. The flag is
/// true when the account was created by this run.
async fn seed_account(
    repo: &AccountRepository,
    name: &str,
    balance: Decimal,
) -> anyhow::Result<(Account, bool)> {
    let existing = repo
        .search_by_name(name)
        .await?
        .into_iter()
        .find(|a| a.name == name);
    if let Some(account) = existing {
        return Ok((account, false));
    }

    let account = repo
        .create(AccountInput {
            name: name.to_string(),
            balance,
            currency: "USD".to_string(),
        })
        .await?;
    Ok((account, true))
}

async fn category(repo: &CategoryRepository, name: &str) -> anyhow::Result<Category> {
    repo.find_by_name(name)
        .await?
        .with_context(|| format!("default category {name} is missing"))
}

async fn record_samples(
    db: DatabaseConnection,
    checking: &Account,
    savings: &Account,
    salary: &Category,
    groceries: &Category,
    saving: &Category,
) -> anyhow::Result<()> {
    let store = Arc::new(SeaLedgerStore::new(db));
    let incomes = IncomeLedger::new(store.clone());
    let expenses = ExpenseLedger::new(store.clone());
    let transfers = TransferLedger::new(store);
    let today = Utc::now().naive_utc();

    incomes
        .create(EntryInput {
            account_id: checking.id,
            category_id: salary.id,
            amount: dec!(3200.00),
            description: Some("Monthly salary".to_string()),
            transaction_date: today,
        })
        .await?;

    expenses
        .create(EntryInput {
            account_id: checking.id,
            category_id: groceries.id,
            amount: dec!(84.35),
            description: Some("Weekly groceries".to_string()),
            transaction_date: today,
        })
        .await?;

    transfers
        .create(TransferInput {
            from_account_id: checking.id,
            to_account_id: savings.id,
            category_id: saving.id,
            amount: dec!(500.00),
            description: Some("Monthly savings".to_string()),
            transaction_date: today,
        })
        .await?;

    Ok(())
}
