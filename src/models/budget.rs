//! Personal (baseline) budget model
//!
//! A personal budget is the household's versioned spending plan. At most one
//! personal budget per household is active; monthly budgets are copied from
//! the active one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::{validate_category_map, CategoryConfig, CategoryMap, CategoryValidationError};
use super::ids::{HouseholdId, PersonalBudgetId};
use super::money::Money;

/// Household-wide budget settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Currency code or symbol used for display
    pub currency: String,

    #[serde(default = "default_true")]
    pub warning_notifications: bool,

    #[serde(default)]
    pub email_alerts: bool,

    /// Names of active categories, kept in sync with `CategoryConfig::is_active`
    #[serde(default)]
    pub active_category_names: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            warning_notifications: true,
            email_alerts: false,
            active_category_names: Vec::new(),
        }
    }
}

/// A baseline budget definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalBudget {
    pub id: PersonalBudgetId,
    pub household_id: HouseholdId,
    pub name: String,

    /// Starts at 1 and is bumped on every update
    pub version: u32,

    pub categories: CategoryMap,

    #[serde(default)]
    pub global_settings: GlobalSettings,

    pub is_active: bool,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PersonalBudget {
    /// Create a new, inactive budget at version 1
    pub fn new(
        household_id: HouseholdId,
        name: impl Into<String>,
        categories: CategoryMap,
        global_settings: GlobalSettings,
    ) -> Self {
        let now = Utc::now();
        let mut budget = Self {
            id: PersonalBudgetId::new(),
            household_id,
            name: name.into(),
            version: 1,
            categories,
            global_settings,
            is_active: false,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        };
        budget.sync_active_names();
        budget
    }

    /// Record a modification: bump the version and timestamp
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// Rebuild `active_category_names` from the category flags
    pub fn sync_active_names(&mut self) {
        self.global_settings.active_category_names = self
            .categories
            .iter()
            .filter(|(_, c)| c.is_active)
            .map(|(name, _)| name.clone())
            .collect();
    }

    /// Look up a category by exact name
    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        self.categories.get(name)
    }

    /// Set a category's active flag; returns false if the category is absent
    pub fn set_category_active(&mut self, name: &str, active: bool) -> bool {
        match self.categories.get_mut(name) {
            Some(config) => {
                config.is_active = active;
                self.sync_active_names();
                true
            }
            None => false,
        }
    }

    /// Move a category to a new key; returns false if `old` is absent
    pub fn rename_category(&mut self, old: &str, new: &str) -> bool {
        match self.categories.remove(old) {
            Some(config) => {
                self.categories.insert(new.to_string(), config);
                self.sync_active_names();
                true
            }
            None => false,
        }
    }

    /// Total of all active category limits
    pub fn total_active_limit(&self) -> Money {
        self.categories
            .values()
            .filter(|c| c.is_active)
            .map(|c| c.monthly_limit)
            .sum()
    }

    /// Validate the budget
    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        if self.name.trim().is_empty() {
            return Err(BudgetValidationError::EmptyName);
        }
        if self.categories.is_empty() {
            return Err(BudgetValidationError::NoCategories);
        }
        validate_category_map(&self.categories).map_err(BudgetValidationError::Category)?;
        Ok(())
    }
}

impl fmt::Display for PersonalBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (v{})", self.name, self.version)?;
        if self.is_active {
            write!(f, " [active]")?;
        }
        Ok(())
    }
}

/// Result of asking for a household's active budget
///
/// Having no active budget is a normal state for new households and after
/// deleting the active budget, so it is a variant rather than an error.
#[derive(Debug, Clone)]
pub enum ActiveBudget {
    Active(PersonalBudget),
    NoActiveBudget,
}

impl ActiveBudget {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

impl From<Option<PersonalBudget>> for ActiveBudget {
    fn from(value: Option<PersonalBudget>) -> Self {
        match value {
            Some(budget) => Self::Active(budget),
            None => Self::NoActiveBudget,
        }
    }
}

/// Validation errors for personal budgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetValidationError {
    EmptyName,
    NoCategories,
    Category(CategoryValidationError),
}

impl fmt::Display for BudgetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Budget name cannot be empty"),
            Self::NoCategories => write!(f, "Budget must have at least one category"),
            Self::Category(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BudgetValidationError {}
