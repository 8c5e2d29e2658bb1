//! Path management for the budget engine
//!
//! ## Path Resolution Order
//!
//! 1. `HBUDGET_DATA_DIR` environment variable (if set)
//! 2. The platform configuration directory from `directories`
//!    (`~/.config/hbudget` on Linux, `~/Library/Application Support/...` on
//!    macOS, `%APPDATA%\...` on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::{BudgetError, BudgetResult};

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "HBUDGET_DATA_DIR";

/// Manages all paths used by the engine
#[derive(Debug, Clone)]
pub struct BudgetPaths {
    base_dir: PathBuf,
}

impl BudgetPaths {
    /// Resolve the base directory from the environment or the platform default
    ///
    /// # Errors
    ///
    /// Returns a config error if no home directory can be determined.
    pub fn new() -> BudgetResult<Self> {
        let base_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => ProjectDirs::from("", "", "hbudget")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    BudgetError::Config("Could not determine a home directory".into())
                })?,
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Directory holding the entity files
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    pub fn personal_budgets_file(&self) -> PathBuf {
        self.data_dir().join("personal_budgets.json")
    }

    pub fn monthly_budgets_file(&self) -> PathBuf {
        self.data_dir().join("monthly_budgets.json")
    }

    pub fn adjustments_file(&self) -> PathBuf {
        self.data_dir().join("adjustments.json")
    }

    pub fn merges_file(&self) -> PathBuf {
        self.data_dir().join("merges.json")
    }

    pub fn category_history_file(&self) -> PathBuf {
        self.data_dir().join("category_history.json")
    }

    pub fn transactions_file(&self) -> PathBuf {
        self.data_dir().join("transactions.json")
    }

    pub fn alert_views_file(&self) -> PathBuf {
        self.data_dir().join("alert_views.json")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> BudgetResult<()> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| BudgetError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| BudgetError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Whether settings have been written yet
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}
