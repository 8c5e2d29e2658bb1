//! household-budget - Household budget lifecycle and adjustment engine
//!
//! A household keeps versioned personal budgets (the baseline). Each month the
//! active baseline is snapshotted into a monthly budget that can drift from it,
//! scheduled adjustments land when their month starts, categories can be
//! renamed, merged and restored, and reports compare plans with spending.
//!
//! # Architecture
//!
//! - `config`: Paths, settings and the household context
//! - `error`: Custom error types
//! - `models`: Core data models (budgets, snapshots, adjustments, transactions)
//! - `storage`: JSON file storage layer
//! - `services`: Business logic layer
//! - `reports`: Comparison and performance analysis
//! - `audit`: Audit logging system
//! - `display`: Terminal formatting
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use household_budget::config::{paths::BudgetPaths, settings::Settings};
//! use household_budget::storage::Storage;
//!
//! let paths = BudgetPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let mut storage = Storage::new(paths)?;
//! storage.load_all()?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::{BudgetError, BudgetResult};
