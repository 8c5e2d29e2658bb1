//! Category lifecycle service
//!
//! Create, rename, merge, undo-merge, delete and restore categories across a
//! household's baseline budgets, monthly snapshots, pending adjustments and
//! transactions.
//!
//! Every operation runs as a saga: each write records the prior copy of the
//! entity it changed, transactions are reattributed first, then budgets are
//! updated and everything is saved. Any failure puts back exactly the
//! entities the saga wrote, reverts the reattributed transactions and
//! surfaces as [`BudgetError::Consistency`].

use tracing::{debug, info, warn};

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::category::{same_name, validate_category_name, DEFAULT_WARNING_THRESHOLD};
use crate::models::{
    CategoryConfig, CategoryEvent, CategoryEventId, CategoryEventKind, CategoryMergeRecord,
    HouseholdId, MergeId, Money, MonthlyBudget, MonthlyBudgetId, PersonalBudget,
    PersonalBudgetId, ScheduledAdjustment, TransactionId,
};
use crate::storage::Storage;

/// Input for creating a category in the active budget
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub monthly_limit: Money,
    pub warning_threshold: u8,
    pub color: String,
    pub description: String,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, monthly_limit: Money) -> Self {
        Self {
            name: name.into(),
            monthly_limit,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            color: String::new(),
            description: String::new(),
        }
    }

    fn config(&self) -> CategoryConfig {
        let mut config = CategoryConfig::new(self.monthly_limit)
            .with_threshold(self.warning_threshold)
            .with_color(self.color.clone());
        config.description = self.description.clone();
        config
    }
}

/// A category of the active budget with its usage
#[derive(Debug, Clone)]
pub struct CategorySummary {
    pub name: String,
    pub config: CategoryConfig,
    pub transaction_count: usize,
}

/// What a rename touched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub old_name: String,
    pub new_name: String,
    pub transactions: usize,
    pub budgets: usize,
    pub snapshots: usize,
    pub adjustments: usize,
}

/// Household state read up front to plan a multi-step operation
struct SavedState {
    budgets: Vec<PersonalBudget>,
    snapshots: Vec<MonthlyBudget>,
    adjustments: Vec<ScheduledAdjustment>,
}

/// Compensating actions, applied newest first on rollback
enum Undo {
    Budget(Box<PersonalBudget>),
    Snapshot(Box<MonthlyBudget>),
    Adjustment(Box<ScheduledAdjustment>),
    Transactions {
        ids: Vec<TransactionId>,
        category: String,
    },
    Event(CategoryEventId),
    RemoveMerge(MergeId),
    RestoreMerge(Box<CategoryMergeRecord>),
}

/// Service for category lifecycle management
pub struct CategoryService<'a> {
    storage: &'a Storage,
}

impl<'a> CategoryService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Categories of the active budget, with transaction counts
    ///
    /// Empty when the household has no active budget.
    pub fn list(&self, household_id: HouseholdId) -> BudgetResult<Vec<CategorySummary>> {
        let Some(budget) = self.storage.personal_budgets.get_active(household_id)? else {
            return Ok(Vec::new());
        };
        budget
            .categories
            .into_iter()
            .map(|(name, config)| {
                let transaction_count = self.storage.transactions.count_by_category(household_id, &name)?;
                Ok(CategorySummary {
                    name,
                    config,
                    transaction_count,
                })
            })
            .collect()
    }

    /// The household's category history, oldest first
    pub fn history(&self, household_id: HouseholdId) -> BudgetResult<Vec<CategoryEvent>> {
        self.storage.category_history.list_for_household(household_id)
    }

    pub fn list_merges(&self, household_id: HouseholdId) -> BudgetResult<Vec<CategoryMergeRecord>> {
        self.storage.merges.list_for_household(household_id)
    }

    /// Add a category to the active budget
    pub fn create(&self, household_id: HouseholdId, input: NewCategory) -> BudgetResult<PersonalBudget> {
        let name = input.name.trim().to_string();
        validate_category_name(&name).map_err(|e| BudgetError::Validation(e.to_string()))?;
        let config = input.config();
        config
            .validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        let _guard = self.storage.lifecycle_guard()?;
        let budget = self
            .storage
            .personal_budgets
            .get_active(household_id)?
            .ok_or_else(|| BudgetError::no_active_budget(household_id.to_string()))?;

        if let Some((existing, existing_config)) =
            budget.categories.iter().find(|(n, _)| same_name(n, &name))
        {
            if existing_config.is_active {
                return Err(BudgetError::Duplicate {
                    entity_type: "Category",
                    identifier: existing.clone(),
                });
            }
            return Err(BudgetError::Conflict(format!(
                "Category '{}' was deleted; restore it instead of creating it again",
                existing
            )));
        }

        let scheduled = self.storage.adjustments.pending_for_household(household_id)?;
        if let Some(pending) = scheduled
            .iter()
            .find(|a| a.is_new_category && same_name(&a.category_name, &name))
        {
            return Err(BudgetError::Duplicate {
                entity_type: "Category",
                identifier: format!(
                    "{} (scheduled for {})",
                    pending.category_name,
                    pending.effective_period()
                ),
            });
        }

        let updated = self.run_saga("create", |undo| {
            let updated = self.update_budget(undo, budget.id, |b| {
                b.categories.insert(name.clone(), config.clone());
                b.sync_active_names();
            })?;
            self.record(undo, household_id, CategoryEventKind::Created, vec![name.clone()])?;
            Ok(updated)
        })?;

        self.storage
            .log_create(EntityType::Category, name.clone(), Some(name.clone()), &config)?;
        info!(
            household_id = %household_id,
            category = %name,
            budget_version = updated.version,
            "created category"
        );

        Ok(updated)
    }

    /// Rename a category everywhere it is referenced
    pub fn rename(&self, household_id: HouseholdId, old_name: &str, new_name: &str) -> BudgetResult<RenameReport> {
        let new_name = new_name.trim().to_string();
        validate_category_name(&new_name).map_err(|e| BudgetError::Validation(e.to_string()))?;

        let _guard = self.storage.lifecycle_guard()?;
        let state = self.capture(household_id)?;
        let old_name = resolve_name(&state, old_name)
            .ok_or_else(|| BudgetError::category_not_found(old_name.trim()))?;

        if old_name == new_name {
            return Err(BudgetError::Validation(
                "New name is the same as the current name".into(),
            ));
        }
        let collides = state
            .budgets
            .iter()
            .flat_map(|b| b.categories.keys())
            .chain(state.snapshots.iter().flat_map(|s| s.categories.keys()))
            .chain(
                state
                    .adjustments
                    .iter()
                    .filter(|a| a.is_pending())
                    .map(|a| &a.category_name),
            )
            .any(|n| *n != old_name && same_name(n, &new_name));
        if collides {
            return Err(BudgetError::Duplicate {
                entity_type: "Category",
                identifier: new_name,
            });
        }

        let mut report = RenameReport {
            old_name: old_name.clone(),
            new_name: new_name.clone(),
            ..RenameReport::default()
        };

        let budget_ids: Vec<_> = state
            .budgets
            .iter()
            .filter(|b| b.categories.contains_key(&old_name))
            .map(|b| b.id)
            .collect();
        let snapshot_ids: Vec<_> = state
            .snapshots
            .iter()
            .filter(|s| {
                s.categories.contains_key(&old_name) || s.original_categories.contains_key(&old_name)
            })
            .map(|s| s.id)
            .collect();
        let pending: Vec<_> = state
            .adjustments
            .iter()
            .filter(|a| a.is_pending() && a.category_name == old_name)
            .cloned()
            .collect();

        self.run_saga("rename", |undo| {
            let moved = self
                .storage
                .transactions
                .reassign_category(household_id, &old_name, &new_name)?;
            report.transactions = moved.len();
            undo.push(Undo::Transactions {
                ids: moved,
                category: old_name.clone(),
            });

            for id in &budget_ids {
                self.update_budget(undo, *id, |b| {
                    b.rename_category(&old_name, &new_name);
                })?;
                report.budgets += 1;
            }
            for id in &snapshot_ids {
                self.update_snapshot(undo, *id, |s| {
                    s.rename_category(&old_name, &new_name);
                })?;
                report.snapshots += 1;
            }
            for adjustment in &pending {
                self.storage.adjustments.upsert(ScheduledAdjustment {
                    category_name: new_name.clone(),
                    ..adjustment.clone()
                })?;
                undo.push(Undo::Adjustment(Box::new(adjustment.clone())));
                report.adjustments += 1;
            }

            self.record(
                undo,
                household_id,
                CategoryEventKind::Renamed,
                vec![old_name.clone(), new_name.clone()],
            )?;
            Ok(())
        })?;

        self.storage.log_update(
            EntityType::Category,
            new_name.clone(),
            Some(new_name.clone()),
            &old_name,
            &new_name,
            Some(format!(
                "renamed {} -> {} ({} transactions)",
                old_name, new_name, report.transactions
            )),
        )?;
        info!(
            household_id = %household_id,
            from = %old_name,
            to = %new_name,
            transactions = report.transactions,
            budgets = report.budgets,
            snapshots = report.snapshots,
            adjustments = report.adjustments,
            "renamed category"
        );

        Ok(report)
    }

    /// Merge `source` into `target`
    ///
    /// Every transaction of the source is reattributed and the source is
    /// deactivated in every budget and snapshot. Limits are not summed.
    pub fn merge(
        &self,
        household_id: HouseholdId,
        source: &str,
        target: &str,
        reason: &str,
    ) -> BudgetResult<CategoryMergeRecord> {
        if same_name(source, target) {
            return Err(BudgetError::Conflict(
                "A category cannot be merged into itself".into(),
            ));
        }

        let _guard = self.storage.lifecycle_guard()?;
        let state = self.capture(household_id)?;

        let source_name = state
            .budgets
            .iter()
            .flat_map(|b| b.categories.iter())
            .filter(|(_, c)| c.is_active)
            .map(|(n, _)| n)
            .find(|n| same_name(n, source))
            .cloned()
            .ok_or_else(|| BudgetError::category_not_found(source.trim()))?;
        let target_name = state
            .budgets
            .iter()
            .find(|b| b.is_active)
            .and_then(|b| {
                b.categories
                    .iter()
                    .find(|(n, c)| c.is_active && same_name(n, target))
                    .map(|(n, _)| n.clone())
            })
            .ok_or_else(|| BudgetError::category_not_found(target.trim()))?;

        let mut record = CategoryMergeRecord::new(household_id, &source_name, &target_name, reason.trim());
        for budget in &state.budgets {
            if let Some(config) = budget.categories.get(&source_name) {
                record.source_definitions.insert(budget.id, config.clone());
            }
        }
        for snapshot in &state.snapshots {
            if let Some(config) = snapshot.categories.get(&source_name) {
                record.snapshot_definitions.insert(snapshot.id, config.clone());
            }
        }

        let record = self.run_saga("merge", |undo| {
            let moved = self
                .storage
                .transactions
                .reassign_category(household_id, &source_name, &target_name)?;
            undo.push(Undo::Transactions {
                ids: moved.clone(),
                category: source_name.clone(),
            });

            for id in record.source_definitions.keys() {
                self.update_budget(undo, *id, |b| {
                    b.set_category_active(&source_name, false);
                })?;
            }
            for id in record.snapshot_definitions.keys() {
                self.update_snapshot(undo, *id, |s| {
                    s.set_category_active(&source_name, false);
                })?;
            }

            let event = self.record(
                undo,
                household_id,
                CategoryEventKind::Merged,
                vec![source_name.clone(), target_name.clone()],
            )?;

            let mut record = record.clone();
            record.sequence = event.sequence;
            record.merged_transaction_ids = moved;
            self.storage.merges.insert(record.clone())?;
            undo.push(Undo::RemoveMerge(record.id));
            Ok(record)
        })?;

        self.storage.log_create(
            EntityType::CategoryMerge,
            record.id.to_string(),
            Some(format!("{} -> {}", record.source_name, record.target_name)),
            &record,
        )?;
        info!(
            household_id = %household_id,
            merge_id = %record.id,
            source = %record.source_name,
            target = %record.target_name,
            transactions = record.transaction_count(),
            "merged categories"
        );

        Ok(record)
    }

    /// Reverse a merge exactly
    ///
    /// Refused when either category has been touched by a later operation
    /// or the merge was already undone.
    pub fn undo_merge(&self, household_id: HouseholdId, merge_id: MergeId) -> BudgetResult<CategoryMergeRecord> {
        let _guard = self.storage.lifecycle_guard()?;
        let record = self
            .storage
            .merges
            .get(merge_id)?
            .filter(|m| m.household_id == household_id)
            .ok_or_else(|| BudgetError::merge_not_found(merge_id.to_string()))?;

        if record.is_undone() {
            return Err(BudgetError::Conflict(format!(
                "Merge of '{}' into '{}' was already undone",
                record.source_name, record.target_name
            )));
        }
        let later = self.storage.category_history.touched_since(
            household_id,
            record.sequence,
            &[&record.source_name, &record.target_name],
        )?;
        if let Some(event) = later.first() {
            return Err(BudgetError::Conflict(format!(
                "Cannot undo merge: '{}' changed afterwards ({})",
                event.names.join("', '"),
                event.kind
            )));
        }

        let undone = self.run_saga("undo merge", |undo| {
            self.storage
                .transactions
                .set_category_for(&record.merged_transaction_ids, &record.source_name)
                .map_err(|e| match e {
                    BudgetError::NotFound { identifier, .. } => BudgetError::Conflict(format!(
                        "Merged transaction {} no longer exists",
                        identifier
                    )),
                    other => other,
                })?;
            undo.push(Undo::Transactions {
                ids: record.merged_transaction_ids.clone(),
                category: record.target_name.clone(),
            });

            for (id, definition) in &record.source_definitions {
                if self.storage.personal_budgets.get(*id)?.is_none() {
                    debug!(budget_id = %id, "budget gone; skipping definition restore");
                    continue;
                }
                self.update_budget(undo, *id, |b| {
                    b.categories.insert(record.source_name.clone(), definition.clone());
                    b.sync_active_names();
                })?;
            }
            for (id, definition) in &record.snapshot_definitions {
                if self.storage.monthly_budgets.get(*id)?.is_none() {
                    continue;
                }
                self.update_snapshot(undo, *id, |s| {
                    s.categories.insert(record.source_name.clone(), definition.clone());
                    s.set_category_active(&record.source_name, definition.is_active);
                })?;
            }

            self.record(
                undo,
                household_id,
                CategoryEventKind::MergeUndone,
                vec![record.source_name.clone(), record.target_name.clone()],
            )?;

            undo.push(Undo::RestoreMerge(Box::new(record.clone())));
            self.storage.merges.mark_undone(record.id)
        })?;

        self.storage.log_update(
            EntityType::CategoryMerge,
            undone.id.to_string(),
            Some(format!("{} -> {}", undone.source_name, undone.target_name)),
            &record,
            &undone,
            Some(format!(
                "undone: {} transactions back to {}",
                undone.transaction_count(),
                undone.source_name
            )),
        )?;
        info!(
            household_id = %household_id,
            merge_id = %undone.id,
            source = %undone.source_name,
            transactions = undone.transaction_count(),
            "undid category merge"
        );

        Ok(undone)
    }

    /// Delete a category from the household's baseline budgets
    ///
    /// Soft delete deactivates it. Hard delete removes the key and requires
    /// that no transaction references it. Snapshots keep it either way.
    /// Returns the number of budgets changed.
    pub fn delete(&self, household_id: HouseholdId, name: &str, hard: bool) -> BudgetResult<usize> {
        let _guard = self.storage.lifecycle_guard()?;
        let budgets = self.storage.personal_budgets.list_for_household(household_id)?;
        let name = resolve_in_budgets(&budgets, name)
            .ok_or_else(|| BudgetError::category_not_found(name.trim()))?;
        let owners: Vec<_> = budgets
            .iter()
            .filter(|b| b.categories.contains_key(&name))
            .collect();

        if hard {
            let referenced = self.storage.transactions.count_by_category(household_id, &name)?;
            if referenced > 0 {
                return Err(BudgetError::Conflict(format!(
                    "Category '{}' has {} transactions; merge it or soft-delete it instead",
                    name, referenced
                )));
            }
        } else if owners
            .iter()
            .all(|b| b.categories.get(&name).is_some_and(|c| !c.is_active))
        {
            return Err(BudgetError::Conflict(format!(
                "Category '{}' is already deleted",
                name
            )));
        }

        let before: Vec<_> = owners.iter().map(|b| (*b).clone()).collect();
        self.run_saga("delete", |undo| {
            for budget in &before {
                self.update_budget(undo, budget.id, |b| {
                    if hard {
                        b.categories.remove(&name);
                        b.sync_active_names();
                    } else {
                        b.set_category_active(&name, false);
                    }
                })?;
            }
            self.record(undo, household_id, CategoryEventKind::Deleted, vec![name.clone()])?;
            Ok(())
        })?;

        if let Some(config) = before.iter().find_map(|b| b.categories.get(&name)) {
            self.storage
                .log_delete(EntityType::Category, name.clone(), Some(name.clone()), config)?;
        }
        info!(
            household_id = %household_id,
            category = %name,
            hard,
            budgets = before.len(),
            "deleted category"
        );

        Ok(before.len())
    }

    /// Reactivate a soft-deleted category; returns the number of budgets changed
    pub fn restore(&self, household_id: HouseholdId, name: &str) -> BudgetResult<usize> {
        let _guard = self.storage.lifecycle_guard()?;
        let budgets = self.storage.personal_budgets.list_for_household(household_id)?;
        let name = resolve_in_budgets(&budgets, name)
            .ok_or_else(|| BudgetError::category_not_found(name.trim()))?;

        let clash = budgets
            .iter()
            .flat_map(|b| b.categories.iter())
            .find(|(n, c)| c.is_active && **n != name && same_name(n, &name));
        if let Some((other, _)) = clash {
            return Err(BudgetError::Conflict(format!(
                "An active category '{}' already uses this name",
                other
            )));
        }

        let inactive: Vec<_> = budgets
            .iter()
            .filter(|b| b.categories.get(&name).is_some_and(|c| !c.is_active))
            .map(|b| b.id)
            .collect();
        if inactive.is_empty() {
            return Err(BudgetError::Conflict(format!(
                "Category '{}' is already active",
                name
            )));
        }

        self.run_saga("restore", |undo| {
            for id in &inactive {
                self.update_budget(undo, *id, |b| {
                    b.set_category_active(&name, true);
                })?;
            }
            self.record(undo, household_id, CategoryEventKind::Restored, vec![name.clone()])?;
            Ok(())
        })?;

        self.storage.log_update(
            EntityType::Category,
            name.clone(),
            Some(name.clone()),
            &false,
            &true,
            Some("restored".into()),
        )?;
        info!(household_id = %household_id, category = %name, budgets = inactive.len(), "restored category");

        Ok(inactive.len())
    }

    fn capture(&self, household_id: HouseholdId) -> BudgetResult<SavedState> {
        Ok(SavedState {
            budgets: self.storage.personal_budgets.list_for_household(household_id)?,
            snapshots: self.storage.monthly_budgets.list_for_household(household_id)?,
            adjustments: self.storage.adjustments.list_for_household(household_id)?,
        })
    }

    /// Change one baseline, remembering the prior copy
    fn update_budget<F>(&self, undo: &mut Vec<Undo>, id: PersonalBudgetId, change: F) -> BudgetResult<PersonalBudget>
    where
        F: FnOnce(&mut PersonalBudget),
    {
        let (before, after) = self.storage.personal_budgets.update_with(id, |b| {
            let before = b.clone();
            change(b);
            b.touch();
            Ok(before)
        })?;
        undo.push(Undo::Budget(Box::new(before)));
        Ok(after)
    }

    fn update_snapshot<F>(&self, undo: &mut Vec<Undo>, id: MonthlyBudgetId, change: F) -> BudgetResult<MonthlyBudget>
    where
        F: FnOnce(&mut MonthlyBudget),
    {
        let (before, after) = self.storage.monthly_budgets.update_with(id, |s| {
            let before = s.clone();
            change(s);
            Ok(before)
        })?;
        undo.push(Undo::Snapshot(Box::new(before)));
        Ok(after)
    }

    fn record(
        &self,
        undo: &mut Vec<Undo>,
        household_id: HouseholdId,
        kind: CategoryEventKind,
        names: Vec<String>,
    ) -> BudgetResult<CategoryEvent> {
        let event = self.storage.category_history.append(household_id, kind, names)?;
        undo.push(Undo::Event(event.id));
        Ok(event)
    }

    /// Run the mutating steps and commit, rolling back on failure
    fn run_saga<T, F>(&self, operation: &str, steps: F) -> BudgetResult<T>
    where
        F: FnOnce(&mut Vec<Undo>) -> BudgetResult<T>,
    {
        let mut undo = Vec::new();
        match steps(&mut undo).and_then(|value| self.commit().map(|()| value)) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(operation, error = %e, "category operation failed; rolling back");
                self.roll_back(undo);
                Err(BudgetError::Consistency(format!(
                    "{} failed and was rolled back: {}",
                    operation, e
                )))
            }
        }
    }

    /// Transactions are saved first so budgets never name a category no
    /// transaction file agrees with.
    fn commit(&self) -> BudgetResult<()> {
        self.storage.transactions.save()?;
        self.storage.personal_budgets.save()?;
        self.storage.monthly_budgets.save()?;
        self.storage.adjustments.save()?;
        self.storage.merges.save()?;
        self.storage.category_history.save()?;
        Ok(())
    }

    /// Best effort: every step runs even if an earlier one fails. Only the
    /// entities the saga wrote are put back.
    fn roll_back(&self, undo: Vec<Undo>) {
        let mut failures = Vec::new();

        for action in undo.into_iter().rev() {
            let result = match action {
                Undo::Budget(budget) => self.storage.personal_budgets.upsert(*budget),
                Undo::Snapshot(snapshot) => self.storage.monthly_budgets.upsert(*snapshot),
                Undo::Adjustment(adjustment) => self.storage.adjustments.upsert(*adjustment),
                Undo::Transactions { ids, category } => {
                    self.storage.transactions.set_category_for(&ids, &category)
                }
                Undo::Event(id) => self.storage.category_history.remove(id),
                Undo::RemoveMerge(id) => self.storage.merges.remove(id).map(|_| ()),
                Undo::RestoreMerge(record) => self.storage.merges.upsert(*record),
            };
            if let Err(e) = result {
                failures.push(e);
            }
        }

        let saves = [
            self.storage.transactions.save(),
            self.storage.personal_budgets.save(),
            self.storage.monthly_budgets.save(),
            self.storage.adjustments.save(),
            self.storage.merges.save(),
            self.storage.category_history.save(),
        ];
        failures.extend(saves.into_iter().filter_map(Result::err));
        for e in failures {
            warn!(error = %e, "rollback step failed");
        }
    }
}

/// The stored key matching `name`, preferring an exact match
fn resolve_name(state: &SavedState, name: &str) -> Option<String> {
    let keys = || {
        state
            .budgets
            .iter()
            .flat_map(|b| b.categories.keys())
            .chain(state.snapshots.iter().flat_map(|s| s.categories.keys()))
    };
    let name = name.trim();
    keys()
        .find(|k| k.as_str() == name)
        .or_else(|| keys().find(|k| same_name(k, name)))
        .cloned()
}

fn resolve_in_budgets(budgets: &[PersonalBudget], name: &str) -> Option<String> {
    let name = name.trim();
    let keys = || budgets.iter().flat_map(|b| b.categories.keys());
    keys()
        .find(|k| k.as_str() == name)
        .or_else(|| keys().find(|k| same_name(k, name)))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BudgetPaths;
    use crate::models::{CategoryMap, Transaction, YearMonth};
    use crate::services::personal_budget::CreateBudgetInput;
    use crate::services::{AdjustmentService, MonthlyBudgetService, PersonalBudgetService};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn setup(storage: &Storage) -> (HouseholdId, PersonalBudget) {
        let household = HouseholdId::new();
        let mut categories = CategoryMap::new();
        categories.insert("Groceries".into(), CategoryConfig::new(Money::from_units(1500)));
        categories.insert(
            "Dining".into(),
            CategoryConfig::new(Money::from_units(300)).with_threshold(70).with_color("#aa3300"),
        );
        categories.insert("Transport".into(), CategoryConfig::new(Money::from_units(600)));
        let budget = PersonalBudgetService::new(storage)
            .create(
                household,
                CreateBudgetInput {
                    name: "Home".into(),
                    categories,
                    ..CreateBudgetInput::default()
                },
            )
            .unwrap();
        (household, budget)
    }

    fn add_transactions(storage: &Storage, household: HouseholdId, category: &str, count: u32) -> Vec<TransactionId> {
        let ids: Vec<_> = (1..=count)
            .map(|day| {
                let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
                let txn = Transaction::expense(household, category, Money::from_units(10), date);
                let id = txn.id;
                storage.transactions.upsert(txn).unwrap();
                id
            })
            .collect();
        storage.transactions.save().unwrap();
        ids
    }

    fn june() -> YearMonth {
        YearMonth::new(2025, 6).unwrap()
    }

    #[test]
    fn test_scenario_e_merge_and_undo() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        let dining = add_transactions(&storage, household, "Dining", 12);
        add_transactions(&storage, household, "Groceries", 3);
        MonthlyBudgetService::new(&storage).get_or_create(household, june()).unwrap();
        let service = CategoryService::new(&storage);

        let record = service.merge(household, "Dining", "Groceries", "eating in").unwrap();
        assert_eq!(record.merged_transaction_ids, dining);
        assert_eq!(record.transaction_count(), 12);
        assert_eq!(storage.transactions.count_by_category(household, "Groceries").unwrap(), 15);
        assert_eq!(storage.transactions.count_by_category(household, "Dining").unwrap(), 0);

        let budget = PersonalBudgetService::new(&storage).require_active(household).unwrap();
        assert!(!budget.categories["Dining"].is_active);
        assert_eq!(budget.categories["Groceries"].monthly_limit, Money::from_units(1500));
        let snapshot = MonthlyBudgetService::new(&storage).get(household, june()).unwrap().unwrap();
        assert!(!snapshot.categories["Dining"].is_active);

        let undone = service.undo_merge(household, record.id).unwrap();
        assert!(undone.is_undone());
        assert_eq!(storage.transactions.count_by_category(household, "Dining").unwrap(), 12);
        assert_eq!(storage.transactions.count_by_category(household, "Groceries").unwrap(), 3);

        let budget = PersonalBudgetService::new(&storage).require_active(household).unwrap();
        let restored = &budget.categories["Dining"];
        assert!(restored.is_active);
        assert_eq!(restored.warning_threshold, 70);
        assert_eq!(restored.color, "#aa3300");
        assert!(budget
            .global_settings
            .active_category_names
            .contains(&"Dining".to_string()));
        let snapshot = MonthlyBudgetService::new(&storage).get(household, june()).unwrap().unwrap();
        assert!(snapshot.categories["Dining"].is_active);

        assert!(service.undo_merge(household, record.id).unwrap_err().is_conflict());
    }

    #[test]
    fn test_undo_rejected_after_later_change() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        add_transactions(&storage, household, "Dining", 2);
        let service = CategoryService::new(&storage);

        let record = service.merge(household, "Dining", "Groceries", "").unwrap();
        service.rename(household, "Groceries", "Food").unwrap();

        let err = service.undo_merge(household, record.id).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(storage.transactions.count_by_category(household, "Food").unwrap(), 2);
    }

    #[test]
    fn test_unrelated_change_does_not_block_undo() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        let service = CategoryService::new(&storage);

        let record = service.merge(household, "Dining", "Groceries", "").unwrap();
        service.rename(household, "Transport", "Travel").unwrap();
        assert!(service.undo_merge(household, record.id).is_ok());
    }

    #[test]
    fn test_undo_rejected_after_adjustment_to_target() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        add_transactions(&storage, household, "Dining", 2);
        let service = CategoryService::new(&storage);
        let record = service.merge(household, "Dining", "Groceries", "").unwrap();

        let adjustments = AdjustmentService::new(&storage);
        adjustments
            .schedule(
                household,
                "Groceries",
                Money::from_units(1500),
                Money::from_units(1800),
                "",
                NaiveDate::from_ymd_opt(2025, 5, 15).unwrap(),
            )
            .unwrap();
        let applied = adjustments
            .auto_apply_due(household, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
            .unwrap();
        assert_eq!(applied.applied.len(), 1);

        let err = service.undo_merge(household, record.id).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(storage.transactions.count_by_category(household, "Groceries").unwrap(), 2);
        assert!(!storage.merges.get(record.id).unwrap().unwrap().is_undone());
    }

    #[test]
    fn test_undo_rejected_after_snapshot_limit_edit() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        let service = CategoryService::new(&storage);
        let record = service.merge(household, "Dining", "Groceries", "").unwrap();

        MonthlyBudgetService::new(&storage)
            .set_limit_for_month(household, june(), "Groceries", Money::from_units(1650))
            .unwrap();

        assert!(service.undo_merge(household, record.id).unwrap_err().is_conflict());
    }

    #[test]
    fn test_merge_rejections() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        let service = CategoryService::new(&storage);

        assert!(service.merge(household, "Dining", "dining", "").unwrap_err().is_conflict());
        assert!(service.merge(household, "Nope", "Groceries", "").unwrap_err().is_not_found());
        assert!(service.merge(household, "Dining", "Nope", "").unwrap_err().is_not_found());
        assert!(service.undo_merge(household, MergeId::new()).unwrap_err().is_not_found());
        assert!(service.history(household).unwrap().is_empty());
    }

    #[test]
    fn test_rename_everywhere() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        add_transactions(&storage, household, "Groceries", 4);
        let months = MonthlyBudgetService::new(&storage);
        months.get_or_create(household, june()).unwrap();
        months.lock(household, june()).unwrap();
        let adjustment = AdjustmentService::new(&storage)
            .schedule(
                household,
                "Groceries",
                Money::from_units(1500),
                Money::from_units(1700),
                "",
                NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            )
            .unwrap();

        let report = CategoryService::new(&storage)
            .rename(household, "groceries", "Food")
            .unwrap();
        assert_eq!(report.old_name, "Groceries");
        assert_eq!(report.transactions, 4);
        assert_eq!(report.budgets, 1);
        assert_eq!(report.snapshots, 1);
        assert_eq!(report.adjustments, 1);

        let budget = PersonalBudgetService::new(&storage).require_active(household).unwrap();
        assert!(budget.categories.contains_key("Food"));
        assert!(!budget.categories.contains_key("Groceries"));
        assert_eq!(budget.version, 2);

        let snapshot = months.get(household, june()).unwrap().unwrap();
        assert!(snapshot.categories.contains_key("Food"));
        assert!(snapshot.original_categories.contains_key("Food"));
        assert!(snapshot.is_locked);

        assert_eq!(storage.transactions.count_by_category(household, "Food").unwrap(), 4);
        let adjustment = storage.adjustments.get(adjustment.id).unwrap().unwrap();
        assert_eq!(adjustment.category_name, "Food");

        let history = CategoryService::new(&storage).history(household).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, CategoryEventKind::Renamed);
    }

    #[test]
    fn test_rename_rejections() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        let service = CategoryService::new(&storage);

        assert!(service.rename(household, "Dining", "groceries").unwrap_err().is_validation());
        assert!(service.rename(household, "Dining", "Dining").unwrap_err().is_validation());
        assert!(service.rename(household, "Dining", "  ").unwrap_err().is_validation());
        assert!(service.rename(household, "Nope", "Other").unwrap_err().is_not_found());
    }

    #[test]
    fn test_rename_rolls_back_on_save_failure() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        add_transactions(&storage, household, "Groceries", 3);
        MonthlyBudgetService::new(&storage).get_or_create(household, june()).unwrap();

        let monthly_file = storage.paths().monthly_budgets_file();
        std::fs::remove_file(&monthly_file).unwrap();
        std::fs::create_dir(&monthly_file).unwrap();

        let err = CategoryService::new(&storage)
            .rename(household, "Groceries", "Food")
            .unwrap_err();
        assert!(err.is_consistency());

        assert_eq!(storage.transactions.count_by_category(household, "Groceries").unwrap(), 3);
        assert_eq!(storage.transactions.count_by_category(household, "Food").unwrap(), 0);
        let budget = PersonalBudgetService::new(&storage).require_active(household).unwrap();
        assert!(budget.categories.contains_key("Groceries"));
        assert_eq!(budget.version, 1);
        let snapshot = storage.monthly_budgets.find(household, june()).unwrap().unwrap();
        assert!(snapshot.categories.contains_key("Groceries"));
        assert!(CategoryService::new(&storage).history(household).unwrap().is_empty());

        let on_disk = crate::storage::PersonalBudgetRepository::new(storage.paths().personal_budgets_file());
        on_disk.load().unwrap();
        let reloaded = on_disk.get_active(household).unwrap().unwrap();
        assert!(reloaded.categories.contains_key("Groceries"));
    }

    #[test]
    fn test_create_and_delete_roll_back_on_save_failure() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        let budgets_file = storage.paths().personal_budgets_file();
        std::fs::remove_file(&budgets_file).unwrap();
        std::fs::create_dir(&budgets_file).unwrap();
        let service = CategoryService::new(&storage);

        let created = service.create(household, NewCategory::new("Childcare", Money::from_units(400)));
        assert!(created.unwrap_err().is_consistency());
        let deleted = service.delete(household, "Dining", false);
        assert!(deleted.unwrap_err().is_consistency());

        let budget = PersonalBudgetService::new(&storage).require_active(household).unwrap();
        assert!(!budget.categories.contains_key("Childcare"));
        assert!(budget.categories["Dining"].is_active);
        assert_eq!(budget.version, 1);
        assert!(service.history(household).unwrap().is_empty());
    }

    #[test]
    fn test_roll_back_leaves_unwritten_entities_alone() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, budget) = setup(&storage);
        let months = MonthlyBudgetService::new(&storage);
        months.get_or_create(household, june()).unwrap();
        let service = CategoryService::new(&storage);

        let mut undo = Vec::new();
        service
            .update_budget(&mut undo, budget.id, |b| {
                b.rename_category("Dining", "Eating Out");
            })
            .unwrap();
        months
            .set_limit_for_month(household, june(), "Groceries", Money::from_units(1700))
            .unwrap();
        service.roll_back(undo);

        let restored = storage.personal_budgets.get(budget.id).unwrap().unwrap();
        assert!(restored.categories.contains_key("Dining"));
        assert_eq!(restored.version, budget.version);
        let snapshot = months.get(household, june()).unwrap().unwrap();
        assert_eq!(snapshot.categories["Groceries"].monthly_limit, Money::from_units(1700));
    }

    #[test]
    fn test_create_category() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        let service = CategoryService::new(&storage);

        let budget = service
            .create(household, NewCategory::new("Childcare", Money::from_units(400)))
            .unwrap();
        assert!(budget.categories["Childcare"].is_active);
        assert_eq!(budget.version, 2);

        let duplicate = service.create(household, NewCategory::new("childcare", Money::from_units(1)));
        assert!(duplicate.unwrap_err().is_validation());

        let invalid = service.create(household, NewCategory::new("Gym", Money::from_cents(-1)));
        assert!(invalid.unwrap_err().is_validation());

        AdjustmentService::new(&storage)
            .schedule_new_category(
                household,
                "Pets",
                Money::from_units(80),
                "",
                NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            )
            .unwrap();
        let scheduled = service.create(household, NewCategory::new("pets", Money::from_units(80)));
        assert!(scheduled.unwrap_err().is_validation());

        service.delete(household, "Dining", false).unwrap();
        let deleted = service.create(household, NewCategory::new("Dining", Money::from_units(1)));
        assert!(deleted.unwrap_err().is_conflict());
    }

    #[test]
    fn test_create_requires_active_budget() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CategoryService::new(&storage);
        let err = service
            .create(HouseholdId::new(), NewCategory::new("Pets", Money::from_units(80)))
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(service.list(HouseholdId::new()).unwrap().is_empty());
    }

    #[test]
    fn test_soft_delete_and_restore() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        let service = CategoryService::new(&storage);

        assert_eq!(service.delete(household, "Dining", false).unwrap(), 1);
        assert!(service.delete(household, "Dining", false).unwrap_err().is_conflict());
        let budget = PersonalBudgetService::new(&storage).require_active(household).unwrap();
        assert!(!budget.categories["Dining"].is_active);

        assert_eq!(service.restore(household, "dining").unwrap(), 1);
        assert!(service.restore(household, "Dining").unwrap_err().is_conflict());

        let kinds: Vec<_> = service.history(household).unwrap().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![CategoryEventKind::Deleted, CategoryEventKind::Restored]);
    }

    #[test]
    fn test_restore_rejected_when_name_taken() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, budget) = setup(&storage);
        let service = CategoryService::new(&storage);
        service.delete(household, "Dining", false).unwrap();

        storage
            .personal_budgets
            .update_with(budget.id, |b| {
                b.categories.insert("DINING".into(), CategoryConfig::new(Money::from_units(5)));
                b.sync_active_names();
                Ok(())
            })
            .unwrap();

        assert!(service.restore(household, "Dining").unwrap_err().is_conflict());
    }

    #[test]
    fn test_hard_delete_requires_no_transactions() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        add_transactions(&storage, household, "Dining", 1);
        MonthlyBudgetService::new(&storage).get_or_create(household, june()).unwrap();
        let service = CategoryService::new(&storage);

        assert!(service.delete(household, "Dining", true).unwrap_err().is_conflict());

        service.delete(household, "Transport", true).unwrap();
        let budget = PersonalBudgetService::new(&storage).require_active(household).unwrap();
        assert!(!budget.categories.contains_key("Transport"));
        let snapshot = MonthlyBudgetService::new(&storage).get(household, june()).unwrap().unwrap();
        assert!(snapshot.categories.contains_key("Transport"));
    }

    #[test]
    fn test_list_counts_transactions() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        add_transactions(&storage, household, "Dining", 5);

        let list = CategoryService::new(&storage).list(household).unwrap();
        assert_eq!(list.len(), 3);
        let dining = list.iter().find(|c| c.name == "Dining").unwrap();
        assert_eq!(dining.transaction_count, 5);
    }

    #[test]
    fn test_list_merges() {
        let (_temp_dir, storage) = create_test_storage();
        let (household, _) = setup(&storage);
        let service = CategoryService::new(&storage);
        service.merge(household, "Dining", "Groceries", "").unwrap();

        let merges = service.list_merges(household).unwrap();
        assert_eq!(merges.len(), 1);
        assert_eq!(merges[0].sequence, 1);
    }
}
