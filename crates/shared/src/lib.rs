//! Shared types, errors, and configuration for the budget ledger.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management
//! - Tracing bootstrap for binaries

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, LoggingConfig};
pub use error::{AppError, AppResult};
pub use telemetry::init_tracing;
