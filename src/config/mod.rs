//! Configuration module
//!
//! This module provides configuration management including:
//! - Data directory resolution
//! - User settings persistence
//! - The household context operations run under

pub mod context;
pub mod paths;
pub mod settings;

pub use context::HouseholdContext;
pub use paths::BudgetPaths;
pub use settings::Settings;
