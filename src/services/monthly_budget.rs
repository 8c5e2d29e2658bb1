//! Monthly budget service
//!
//! Lazily creates per-month snapshots of the active baseline and guards edits
//! with the snapshot lock.

use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{
    CategoryEventKind, HouseholdId, Money, MonthlyBudget, MonthlyBudgetId, YearMonth,
};
use crate::storage::Storage;

/// Service for monthly budget snapshots
pub struct MonthlyBudgetService<'a> {
    storage: &'a Storage,
}

impl<'a> MonthlyBudgetService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Return the snapshot for a month, creating it from the active baseline
    ///
    /// Creation deep-copies the baseline at call time. Without an existing
    /// snapshot and without an active budget there is nothing to copy, which
    /// is a not-found error.
    pub fn get_or_create(&self, household_id: HouseholdId, period: YearMonth) -> BudgetResult<MonthlyBudget> {
        let personal_budgets = &self.storage.personal_budgets;
        let (snapshot, created) =
            self.storage
                .monthly_budgets
                .get_or_insert_with(household_id, period, || {
                    let baseline = personal_budgets
                        .get_active(household_id)?
                        .ok_or_else(|| BudgetError::no_active_budget(household_id.to_string()))?;
                    Ok(MonthlyBudget::from_baseline(&baseline, period))
                })?;

        if created {
            self.storage.monthly_budgets.save()?;
            self.storage.log_create(
                EntityType::MonthlyBudget,
                snapshot.id.to_string(),
                Some(period.to_string()),
                &snapshot,
            )?;
            info!(
                household_id = %household_id,
                period = %period,
                source_version = snapshot.source_budget_version,
                "created monthly snapshot"
            );
        } else {
            debug!(household_id = %household_id, period = %period, "reusing monthly snapshot");
        }

        Ok(snapshot)
    }

    /// The snapshot for a month, without creating one
    pub fn get(&self, household_id: HouseholdId, period: YearMonth) -> BudgetResult<Option<MonthlyBudget>> {
        self.storage.monthly_budgets.find(household_id, period)
    }

    pub fn get_by_id(&self, id: MonthlyBudgetId) -> BudgetResult<Option<MonthlyBudget>> {
        self.storage.monthly_budgets.get(id)
    }

    pub fn list(&self, household_id: HouseholdId) -> BudgetResult<Vec<MonthlyBudget>> {
        self.storage.monthly_budgets.list_for_household(household_id)
    }

    /// Change one category limit in a snapshot
    ///
    /// The lock is checked and the adjustment count incremented inside the
    /// repository's read-modify-write, never against a stale copy. The
    /// baseline is never touched.
    pub fn update_category_limit(
        &self,
        id: MonthlyBudgetId,
        category_name: &str,
        new_limit: Money,
    ) -> BudgetResult<MonthlyBudget> {
        if new_limit.is_negative() {
            return Err(BudgetError::Validation(
                "Monthly limit cannot be negative".into(),
            ));
        }

        let _guard = self.storage.lifecycle_guard()?;
        let (before, after) = self.storage.monthly_budgets.update_with(id, |snapshot| {
            if snapshot.is_locked {
                return Err(BudgetError::Locked {
                    year: snapshot.year,
                    month: snapshot.month,
                });
            }
            let before = snapshot.clone();
            if !snapshot.write_limit(category_name, new_limit, false) {
                return Err(BudgetError::category_not_found(category_name));
            }
            Ok(before)
        })?;
        self.storage.monthly_budgets.save()?;
        self.storage.category_history.append(
            after.household_id,
            CategoryEventKind::LimitChanged,
            vec![category_name.to_string()],
        )?;
        self.storage.category_history.save()?;

        self.storage.log_update(
            EntityType::MonthlyBudget,
            after.id.to_string(),
            Some(after.period().to_string()),
            &before,
            &after,
            None,
        )?;
        info!(
            period = %after.period(),
            category = category_name,
            limit = %new_limit,
            adjustment_count = after.adjustment_count,
            "updated monthly category limit"
        );

        Ok(after)
    }

    /// Get-or-create the month's snapshot, then change one limit
    pub fn set_limit_for_month(
        &self,
        household_id: HouseholdId,
        period: YearMonth,
        category_name: &str,
        new_limit: Money,
    ) -> BudgetResult<MonthlyBudget> {
        let snapshot = self.get_or_create(household_id, period)?;
        self.update_category_limit(snapshot.id, category_name, new_limit)
    }

    /// Lock a month against edits
    pub fn lock(&self, household_id: HouseholdId, period: YearMonth) -> BudgetResult<MonthlyBudget> {
        self.set_locked(household_id, period, true)
    }

    /// Unlock a month; locks are only ever lifted by this call
    pub fn unlock(&self, household_id: HouseholdId, period: YearMonth) -> BudgetResult<MonthlyBudget> {
        self.set_locked(household_id, period, false)
    }

    fn set_locked(&self, household_id: HouseholdId, period: YearMonth, locked: bool) -> BudgetResult<MonthlyBudget> {
        let snapshot = self.get_or_create(household_id, period)?;
        let (before, after) = self.storage.monthly_budgets.update_with(snapshot.id, |s| {
            let before = s.clone();
            s.set_locked(locked);
            Ok(before)
        })?;
        self.storage.monthly_budgets.save()?;

        if before.is_locked != after.is_locked {
            self.storage.log_update(
                EntityType::MonthlyBudget,
                after.id.to_string(),
                Some(period.to_string()),
                &before,
                &after,
                Some(if locked { "locked" } else { "unlocked" }.to_string()),
            )?;
        }
        info!(household_id = %household_id, period = %period, locked, "set monthly lock");

        Ok(after)
    }
}
