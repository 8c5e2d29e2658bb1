//! Personal budget service
//!
//! Baseline budget lifecycle: create, update, activate, delete and reset.
//! The single-active-budget invariant itself is enforced by
//! [`PersonalBudgetRepository`](crate::storage::PersonalBudgetRepository).

use tracing::{debug, info, warn};

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::category::same_name;
use crate::models::ids::match_short_id;
use crate::models::{
    ActiveBudget, CategoryEventKind, CategoryMap, GlobalSettings, HouseholdId, PersonalBudget,
    PersonalBudgetId,
};
use crate::storage::Storage;

/// Input for creating a personal budget
#[derive(Debug, Clone, Default)]
pub struct CreateBudgetInput {
    pub name: String,
    pub categories: CategoryMap,
    pub global_settings: GlobalSettings,
    pub notes: String,
}

/// Optional changes to a personal budget
#[derive(Debug, Clone, Default)]
pub struct BudgetPatch {
    pub name: Option<String>,
    pub notes: Option<String>,
    pub categories: Option<CategoryMap>,
    pub global_settings: Option<GlobalSettings>,
}

impl BudgetPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.notes.is_none()
            && self.categories.is_none()
            && self.global_settings.is_none()
    }
}

/// What `reset_all` should delete besides personal budgets
#[derive(Debug, Clone, Copy, Default)]
pub struct ResetOptions {
    pub include_monthly: bool,
    pub include_transactions: bool,
    /// Explicit confirmation; reset is refused without it
    pub confirmed: bool,
}

/// Number of records deleted per entity type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetReport {
    pub personal_budgets: usize,
    pub scheduled_adjustments: usize,
    pub monthly_budgets: usize,
    pub transactions: usize,
    pub merge_records: usize,
}

impl ResetReport {
    pub fn total(&self) -> usize {
        self.personal_budgets
            + self.scheduled_adjustments
            + self.monthly_budgets
            + self.transactions
            + self.merge_records
    }
}

/// Service for baseline budget management
pub struct PersonalBudgetService<'a> {
    storage: &'a Storage,
}

impl<'a> PersonalBudgetService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a budget; it becomes active only if the household has none
    pub fn create(&self, household_id: HouseholdId, input: CreateBudgetInput) -> BudgetResult<PersonalBudget> {
        let mut budget = PersonalBudget::new(
            household_id,
            input.name.trim(),
            input.categories,
            input.global_settings,
        );
        budget.notes = input.notes;
        budget
            .validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        let budget = self.storage.personal_budgets.insert_new(budget)?;
        self.storage.personal_budgets.save()?;

        self.storage.log_create(
            EntityType::PersonalBudget,
            budget.id.to_string(),
            Some(budget.name.clone()),
            &budget,
        )?;
        info!(
            budget_id = %budget.id,
            household_id = %household_id,
            active = budget.is_active,
            "created personal budget"
        );

        Ok(budget)
    }

    pub fn get(&self, id: PersonalBudgetId) -> BudgetResult<Option<PersonalBudget>> {
        self.storage.personal_budgets.get(id)
    }

    /// Find a household budget by name (case-insensitive) or id
    pub fn find(&self, household_id: HouseholdId, identifier: &str) -> BudgetResult<Option<PersonalBudget>> {
        let budgets = self.list(household_id)?;
        if let Some(budget) = budgets.iter().find(|b| same_name(&b.name, identifier)) {
            return Ok(Some(budget.clone()));
        }
        let ids: Vec<_> = budgets.iter().map(|b| b.id).collect();
        Ok(match_short_id(identifier, &ids)
            .and_then(|id| budgets.into_iter().find(|b| b.id == id)))
    }

    pub fn list(&self, household_id: HouseholdId) -> BudgetResult<Vec<PersonalBudget>> {
        self.storage.personal_budgets.list_for_household(household_id)
    }

    /// The household's active budget, or `NoActiveBudget`
    pub fn get_active(&self, household_id: HouseholdId) -> BudgetResult<ActiveBudget> {
        let active = self.storage.personal_budgets.get_active(household_id)?;
        if active.is_none() {
            debug!(household_id = %household_id, "household has no active budget");
        }
        Ok(active.into())
    }

    /// The active budget, for operations that cannot proceed without one
    pub fn require_active(&self, household_id: HouseholdId) -> BudgetResult<PersonalBudget> {
        self.storage
            .personal_budgets
            .get_active(household_id)?
            .ok_or_else(|| BudgetError::no_active_budget(household_id.to_string()))
    }

    /// Apply a patch, bumping the version
    ///
    /// Existing monthly snapshots are independent copies and stay untouched.
    /// A category patch may not drop a category that transactions still
    /// reference; those go through `category delete` or `category merge`.
    /// Every category the patch adds, removes or changes is recorded in the
    /// category history.
    pub fn update(&self, id: PersonalBudgetId, patch: BudgetPatch) -> BudgetResult<PersonalBudget> {
        if patch.is_empty() {
            return Err(BudgetError::Validation("Nothing to update".into()));
        }

        let _guard = self.storage.lifecycle_guard()?;
        let current = self
            .storage
            .personal_budgets
            .get(id)?
            .ok_or_else(|| BudgetError::budget_not_found(id.to_string()))?;
        if let Some(categories) = &patch.categories {
            for name in current.categories.keys().filter(|n| !categories.contains_key(*n)) {
                let referenced = self
                    .storage
                    .transactions
                    .count_by_category(current.household_id, name)?;
                if referenced > 0 {
                    return Err(BudgetError::Conflict(format!(
                        "Category '{}' has {} transactions; delete or merge it instead of dropping it",
                        name, referenced
                    )));
                }
            }
        }

        let (before, after) = self.storage.personal_budgets.update_with(id, |budget| {
            let before = budget.clone();
            if let Some(name) = &patch.name {
                budget.name = name.trim().to_string();
            }
            if let Some(notes) = &patch.notes {
                budget.notes = notes.clone();
            }
            if let Some(settings) = &patch.global_settings {
                budget.global_settings = settings.clone();
            }
            if let Some(categories) = &patch.categories {
                budget.categories = categories.clone();
            }
            budget.sync_active_names();
            budget
                .validate()
                .map_err(|e| BudgetError::Validation(e.to_string()))?;
            budget.touch();
            Ok(before)
        })?;
        self.storage.personal_budgets.save()?;

        let changes = category_changes(&before.categories, &after.categories);
        if !changes.is_empty() {
            for (kind, name) in changes {
                self.storage
                    .category_history
                    .append(after.household_id, kind, vec![name])?;
            }
            self.storage.category_history.save()?;
        }

        self.storage.log_update(
            EntityType::PersonalBudget,
            after.id.to_string(),
            Some(after.name.clone()),
            &before,
            &after,
            None,
        )?;
        info!(budget_id = %after.id, version = after.version, "updated personal budget");

        Ok(after)
    }

    /// Make a budget the household's only active budget
    pub fn set_active(&self, id: PersonalBudgetId) -> BudgetResult<PersonalBudget> {
        let previous = self.storage.personal_budgets.set_active(id)?;
        self.storage.personal_budgets.save()?;

        let activated = self
            .storage
            .personal_budgets
            .get(id)?
            .ok_or_else(|| BudgetError::budget_not_found(id.to_string()))?;

        let before = PersonalBudget {
            is_active: false,
            ..activated.clone()
        };
        self.storage.log_update(
            EntityType::PersonalBudget,
            activated.id.to_string(),
            Some(activated.name.clone()),
            &before,
            &activated,
            Some(match &previous {
                Some(prev) => format!("activated (replacing {})", prev.name),
                None => "activated".to_string(),
            }),
        )?;
        info!(
            budget_id = %id,
            previous = ?previous.as_ref().map(|p| p.id.to_string()),
            "switched active budget"
        );

        Ok(activated)
    }

    /// Delete a budget
    ///
    /// Deleting the active budget needs `confirmed` and leaves the household
    /// with no active budget. Monthly snapshots are never cascaded.
    pub fn delete(&self, id: PersonalBudgetId, confirmed: bool) -> BudgetResult<PersonalBudget> {
        let budget = self
            .storage
            .personal_budgets
            .get(id)?
            .ok_or_else(|| BudgetError::budget_not_found(id.to_string()))?;

        if budget.is_active && !confirmed {
            return Err(BudgetError::Validation(format!(
                "Budget '{}' is active; deleting it requires confirmation",
                budget.name
            )));
        }

        self.storage.personal_budgets.delete(id)?;
        self.storage.personal_budgets.save()?;

        self.storage.log_delete(
            EntityType::PersonalBudget,
            budget.id.to_string(),
            Some(budget.name.clone()),
            &budget,
        )?;
        if budget.is_active {
            warn!(budget_id = %id, "deleted the active budget; household has no active budget");
        } else {
            info!(budget_id = %id, "deleted personal budget");
        }

        Ok(budget)
    }

    /// Delete all of a household's budgets and, per options, related data
    ///
    /// Every entity type is deleted and saved on its own, so a retry after a
    /// partial failure only deletes what is left.
    pub fn reset_all(&self, household_id: HouseholdId, options: ResetOptions) -> BudgetResult<ResetReport> {
        if !options.confirmed {
            return Err(BudgetError::Validation(
                "Reset deletes all budgets and requires confirmation".into(),
            ));
        }

        let storage = self.storage;
        let mut report = ResetReport {
            personal_budgets: storage.personal_budgets.delete_for_household(household_id)?,
            ..ResetReport::default()
        };
        storage.personal_budgets.save()?;

        report.scheduled_adjustments = storage.adjustments.delete_for_household(household_id)?;
        storage.adjustments.save()?;

        if options.include_monthly {
            report.monthly_budgets = storage.monthly_budgets.delete_for_household(household_id)?;
            storage.monthly_budgets.save()?;
        }

        if options.include_transactions {
            report.transactions = storage.transactions.delete_for_household(household_id)?;
            storage.transactions.save()?;

            // Merge records point at transaction ids and cannot be undone without them
            report.merge_records = storage.merges.delete_for_household(household_id)?;
            storage.merges.save()?;
        }

        warn!(
            household_id = %household_id,
            personal_budgets = report.personal_budgets,
            scheduled_adjustments = report.scheduled_adjustments,
            monthly_budgets = report.monthly_budgets,
            transactions = report.transactions,
            merge_records = report.merge_records,
            "reset household budgets"
        );

        Ok(report)
    }
}

/// History events for the keys that differ between two category maps
fn category_changes(before: &CategoryMap, after: &CategoryMap) -> Vec<(CategoryEventKind, String)> {
    let removed = before
        .keys()
        .filter(|n| !after.contains_key(*n))
        .map(|n| (CategoryEventKind::Deleted, n.clone()));
    let changed = after.iter().filter_map(|(name, config)| {
        let kind = match before.get(name) {
            None => CategoryEventKind::Created,
            Some(old) if old == config => return None,
            Some(old) if old.is_active && !config.is_active => CategoryEventKind::Deleted,
            Some(old) if !old.is_active && config.is_active => CategoryEventKind::Restored,
            Some(_) => CategoryEventKind::LimitChanged,
        };
        Some((kind, name.clone()))
    });
    removed.chain(changed).collect()
}
