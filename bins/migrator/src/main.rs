//! Database migration runner for the budget ledger.
//!
//! Usage:
//!   budget-migrator up      - Run all pending migrations
//!   budget-migrator down    - Rollback last migration
//!   budget-migrator status  - Show migration status
//!   budget-migrator fresh   - Drop all tables and re-run migrations
//!
//! The connection string comes from `DATABASE_URL` (or `-u`).

use budget_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Run the migrator CLI (it sets up its own tracing)
    cli::run_cli(Migrator).await;
}
