//! Monthly budget snapshot model
//!
//! A monthly budget is an independent copy of the active personal budget for
//! one calendar month. Later edits to the personal budget never reach an
//! existing snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::budget::{GlobalSettings, PersonalBudget};
use super::category::{CategoryConfig, CategoryMap};
use super::ids::{HouseholdId, MonthlyBudgetId, PersonalBudgetId};
use super::money::Money;
use super::period::YearMonth;

/// A per-month budget snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyBudget {
    pub id: MonthlyBudgetId,
    pub household_id: HouseholdId,
    pub year: i32,
    pub month: u32,

    /// Current, editable limits
    pub categories: CategoryMap,

    /// Limits as they were when the snapshot was created
    pub original_categories: CategoryMap,

    #[serde(default)]
    pub global_settings: GlobalSettings,

    #[serde(default)]
    pub is_locked: bool,

    /// Number of limit edits and applied adjustments
    #[serde(default)]
    pub adjustment_count: u32,

    pub source_budget_id: Option<PersonalBudgetId>,
    pub source_budget_version: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MonthlyBudget {
    /// Deep-copy a baseline into a new snapshot for `period`
    pub fn from_baseline(baseline: &PersonalBudget, period: YearMonth) -> Self {
        let now = Utc::now();
        Self {
            id: MonthlyBudgetId::new(),
            household_id: baseline.household_id,
            year: period.year,
            month: period.month,
            categories: baseline.categories.clone(),
            original_categories: baseline.categories.clone(),
            global_settings: baseline.global_settings.clone(),
            is_locked: false,
            adjustment_count: 0,
            source_budget_id: Some(baseline.id),
            source_budget_version: baseline.version,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn period(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }

    /// Write a new limit into the editable categories
    ///
    /// Creates the entry when `create_if_absent` is set (a scheduled new
    /// category). Returns false when the category is absent and was not
    /// created.
    pub fn write_limit(&mut self, name: &str, limit: Money, create_if_absent: bool) -> bool {
        match self.categories.get_mut(name) {
            Some(config) => config.monthly_limit = limit,
            None if create_if_absent => {
                self.categories
                    .insert(name.to_string(), CategoryConfig::new(limit));
                self.global_settings.active_category_names.push(name.to_string());
            }
            None => return false,
        }
        self.adjustment_count += 1;
        self.updated_at = Utc::now();
        true
    }

    /// Rename a category key in both the current and original copies
    pub fn rename_category(&mut self, old: &str, new: &str) -> bool {
        let mut renamed = false;
        if let Some(config) = self.categories.remove(old) {
            self.categories.insert(new.to_string(), config);
            renamed = true;
        }
        if let Some(config) = self.original_categories.remove(old) {
            self.original_categories.insert(new.to_string(), config);
            renamed = true;
        }
        if renamed {
            for active in self.global_settings.active_category_names.iter_mut() {
                if active == old {
                    *active = new.to_string();
                }
            }
            self.updated_at = Utc::now();
        }
        renamed
    }

    /// Set a category's active flag in the current copy
    pub fn set_category_active(&mut self, name: &str, active: bool) -> bool {
        let Some(config) = self.categories.get_mut(name) else {
            return false;
        };
        config.is_active = active;
        let names = &mut self.global_settings.active_category_names;
        names.retain(|n| n != name);
        if active {
            names.push(name.to_string());
        }
        self.updated_at = Utc::now();
        true
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.is_locked = locked;
        self.updated_at = Utc::now();
    }

    /// Total of active category limits in the current copy
    pub fn total_active_limit(&self) -> Money {
        self.categories
            .values()
            .filter(|c| c.is_active)
            .map(|c| c.monthly_limit)
            .sum()
    }
}

impl fmt::Display for MonthlyBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.period())?;
        if self.is_locked {
            write!(f, " [locked]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> PersonalBudget {
        let mut categories = CategoryMap::new();
        categories.insert("Groceries".into(), CategoryConfig::new(Money::from_units(1500)));
        categories.insert("Transport".into(), CategoryConfig::new(Money::from_units(600)));
        PersonalBudget::new(HouseholdId::new(), "Home", categories, GlobalSettings::default())
    }

    #[test]
    fn test_from_baseline_copies_categories() {
        let base = baseline();
        let period = YearMonth::new(2025, 6).unwrap();
        let snapshot = MonthlyBudget::from_baseline(&base, period);

        assert_eq!(snapshot.categories, base.categories);
        assert_eq!(snapshot.original_categories, base.categories);
        assert_eq!(snapshot.period(), period);
        assert!(!snapshot.is_locked);
        assert_eq!(snapshot.adjustment_count, 0);
        assert_eq!(snapshot.source_budget_version, 1);
    }

    #[test]
    fn test_write_limit_leaves_original_untouched() {
        let base = baseline();
        let mut snapshot = MonthlyBudget::from_baseline(&base, YearMonth::new(2025, 6).unwrap());

        assert!(snapshot.write_limit("Groceries", Money::from_units(1800), false));
        assert_eq!(
            snapshot.categories["Groceries"].monthly_limit,
            Money::from_units(1800)
        );
        assert_eq!(
            snapshot.original_categories["Groceries"].monthly_limit,
            Money::from_units(1500)
        );
        assert_eq!(snapshot.adjustment_count, 1);
    }

    #[test]
    fn test_write_limit_creates_scheduled_category() {
        let base = baseline();
        let mut snapshot = MonthlyBudget::from_baseline(&base, YearMonth::new(2025, 6).unwrap());

        assert!(!snapshot.write_limit("Pets", Money::from_units(100), false));
        assert!(snapshot.write_limit("Pets", Money::from_units(100), true));
        assert!(snapshot.categories.contains_key("Pets"));
        assert!(!snapshot.original_categories.contains_key("Pets"));
        assert!(snapshot
            .global_settings
            .active_category_names
            .contains(&"Pets".to_string()));
    }

    #[test]
    fn test_rename_updates_both_copies() {
        let base = baseline();
        let mut snapshot = MonthlyBudget::from_baseline(&base, YearMonth::new(2025, 6).unwrap());

        assert!(snapshot.rename_category("Transport", "Transit"));
        assert!(snapshot.categories.contains_key("Transit"));
        assert!(snapshot.original_categories.contains_key("Transit"));
        assert!(!snapshot.rename_category("Missing", "Other"));
    }
}
