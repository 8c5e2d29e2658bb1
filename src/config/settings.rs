//! User settings for the budget engine
//!
//! Holds display preferences, engine policy switches and the household
//! context the CLI acts for.

use serde::{Deserialize, Serialize};

use super::paths::BudgetPaths;
use crate::error::{BudgetError, BudgetResult};
use crate::models::category::DEFAULT_WARNING_THRESHOLD;
use crate::models::{HouseholdId, UserId};

/// User settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency symbol used when printing amounts
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Warning threshold given to categories created without one
    #[serde(default = "default_warning_threshold")]
    pub default_warning_threshold: u8,

    /// Also write applied adjustments into the active baseline
    #[serde(default = "default_true")]
    pub propagate_adjustments_to_baseline: bool,

    /// Apply due adjustments whenever the CLI starts
    #[serde(default = "default_true")]
    pub auto_apply_on_load: bool,

    /// Household this installation acts for
    #[serde(default)]
    pub household_id: HouseholdId,

    /// User recorded on alert views
    #[serde(default)]
    pub user_id: UserId,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_warning_threshold() -> u8 {
    DEFAULT_WARNING_THRESHOLD
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            default_warning_threshold: default_warning_threshold(),
            propagate_adjustments_to_baseline: true,
            auto_apply_on_load: true,
            household_id: HouseholdId::new(),
            user_id: UserId::new(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create and persist defaults
    ///
    /// Defaults are saved immediately so the generated household id is stable
    /// across runs.
    pub fn load_or_create(paths: &BudgetPaths) -> BudgetResult<Self> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| BudgetError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                BudgetError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            if settings.default_warning_threshold > 100 {
                return Err(BudgetError::Config(format!(
                    "default_warning_threshold must be at most 100, got {}",
                    settings.default_warning_threshold
                )));
            }
            Ok(settings)
        } else {
            let settings = Settings::default();
            settings.save(paths)?;
            Ok(settings)
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &BudgetPaths) -> BudgetResult<()> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| BudgetError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| BudgetError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
