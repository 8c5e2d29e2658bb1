//! Personal budget repository for JSON storage
//!
//! Owns the single-active-budget invariant: activation and auto-activation
//! happen inside one write-lock critical section.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{BudgetError, BudgetResult};
use crate::models::{HouseholdId, PersonalBudget, PersonalBudgetId};

use super::file_io::{read_json, write_json_atomic};
use super::{read_lock, write_lock};

/// Serializable personal budget data
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct PersonalBudgetData {
    budgets: Vec<PersonalBudget>,
}

/// Repository for personal budget persistence
pub struct PersonalBudgetRepository {
    path: PathBuf,
    data: RwLock<HashMap<PersonalBudgetId, PersonalBudget>>,
}

impl PersonalBudgetRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load budgets from disk
    pub fn load(&self) -> BudgetResult<()> {
        let file_data: PersonalBudgetData = read_json(&self.path)?;
        let mut data = write_lock(&self.data)?;
        data.clear();
        for budget in file_data.budgets {
            data.insert(budget.id, budget);
        }
        Ok(())
    }

    /// Save budgets to disk
    pub fn save(&self) -> BudgetResult<()> {
        let data = read_lock(&self.data)?;
        let mut budgets: Vec<_> = data.values().cloned().collect();
        budgets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        write_json_atomic(&self.path, &PersonalBudgetData { budgets })
    }

    pub fn get(&self, id: PersonalBudgetId) -> BudgetResult<Option<PersonalBudget>> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    /// All budgets for a household, oldest first
    pub fn list_for_household(&self, household_id: HouseholdId) -> BudgetResult<Vec<PersonalBudget>> {
        let data = read_lock(&self.data)?;
        let mut budgets: Vec<_> = data
            .values()
            .filter(|b| b.household_id == household_id)
            .cloned()
            .collect();
        budgets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(budgets)
    }

    /// The household's active budget, if any
    pub fn get_active(&self, household_id: HouseholdId) -> BudgetResult<Option<PersonalBudget>> {
        let data = read_lock(&self.data)?;
        Ok(data
            .values()
            .find(|b| b.household_id == household_id && b.is_active)
            .cloned())
    }

    /// Insert a new budget, activating it only if the household has no active budget
    ///
    /// Returns the stored budget (with its final `is_active` flag).
    pub fn insert_new(&self, mut budget: PersonalBudget) -> BudgetResult<PersonalBudget> {
        let mut data = write_lock(&self.data)?;
        let has_active = data
            .values()
            .any(|b| b.household_id == budget.household_id && b.is_active);
        budget.is_active = !has_active;
        data.insert(budget.id, budget.clone());
        Ok(budget)
    }

    /// Make `id` the household's only active budget
    ///
    /// Both flips happen under one write lock, so no reader ever observes zero
    /// or two active budgets. Returns the previously active budget, if any.
    pub fn set_active(&self, id: PersonalBudgetId) -> BudgetResult<Option<PersonalBudget>> {
        let mut data = write_lock(&self.data)?;

        let target = data
            .get(&id)
            .ok_or_else(|| BudgetError::budget_not_found(id.to_string()))?;
        if target.is_active {
            return Err(BudgetError::Conflict(format!(
                "Budget '{}' is already active",
                target.name
            )));
        }
        let household_id = target.household_id;

        let previous_id = data
            .values()
            .find(|b| b.household_id == household_id && b.is_active)
            .map(|b| b.id);

        let mut previous = None;
        if let Some(prev_id) = previous_id {
            if let Some(prev) = data.get_mut(&prev_id) {
                prev.is_active = false;
                prev.updated_at = chrono::Utc::now();
                previous = Some(prev.clone());
            }
        }
        if let Some(target) = data.get_mut(&id) {
            target.is_active = true;
            target.updated_at = chrono::Utc::now();
        }

        Ok(previous)
    }

    /// Read-modify-write a budget under the write lock
    ///
    /// The closure works on a copy; the stored budget is replaced only if it
    /// returns Ok. Returns the closure's value and the updated budget.
    pub fn update_with<T, F>(&self, id: PersonalBudgetId, f: F) -> BudgetResult<(T, PersonalBudget)>
    where
        F: FnOnce(&mut PersonalBudget) -> BudgetResult<T>,
    {
        let mut data = write_lock(&self.data)?;
        let current = data
            .get(&id)
            .ok_or_else(|| BudgetError::budget_not_found(id.to_string()))?;
        let mut working = current.clone();
        let value = f(&mut working)?;
        data.insert(id, working.clone());
        Ok((value, working))
    }

    /// Insert or replace a budget as-is
    pub fn upsert(&self, budget: PersonalBudget) -> BudgetResult<()> {
        write_lock(&self.data)?.insert(budget.id, budget);
        Ok(())
    }

    pub fn delete(&self, id: PersonalBudgetId) -> BudgetResult<Option<PersonalBudget>> {
        Ok(write_lock(&self.data)?.remove(&id))
    }

    /// Delete every budget of a household; returns the number removed
    pub fn delete_for_household(&self, household_id: HouseholdId) -> BudgetResult<usize> {
        let mut data = write_lock(&self.data)?;
        let before = data.len();
        data.retain(|_, b| b.household_id != household_id);
        Ok(before - data.len())
    }

    pub fn count(&self) -> BudgetResult<usize> {
        Ok(read_lock(&self.data)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryConfig, CategoryMap, GlobalSettings, Money};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, PersonalBudgetRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = PersonalBudgetRepository::new(temp_dir.path().join("personal_budgets.json"));
        (temp_dir, repo)
    }

    fn budget(household: HouseholdId, name: &str) -> PersonalBudget {
        let mut categories = CategoryMap::new();
        categories.insert("Groceries".into(), CategoryConfig::new(Money::from_units(100)));
        PersonalBudget::new(household, name, categories, GlobalSettings::default())
    }

    fn active_count(repo: &PersonalBudgetRepository, household: HouseholdId) -> usize {
        repo.list_for_household(household)
            .unwrap()
            .iter()
            .filter(|b| b.is_active)
            .count()
    }

    #[test]
    fn test_first_insert_activates() {
        let (_temp_dir, repo) = create_test_repo();
        let household = HouseholdId::new();

        let first = repo.insert_new(budget(household, "First")).unwrap();
        let second = repo.insert_new(budget(household, "Second")).unwrap();

        assert!(first.is_active);
        assert!(!second.is_active);
        assert_eq!(active_count(&repo, household), 1);
    }

    #[test]
    fn test_set_active_swaps() {
        let (_temp_dir, repo) = create_test_repo();
        let household = HouseholdId::new();
        let first = repo.insert_new(budget(household, "First")).unwrap();
        let second = repo.insert_new(budget(household, "Second")).unwrap();

        let previous = repo.set_active(second.id).unwrap();
        assert_eq!(previous.map(|b| b.id), Some(first.id));
        assert_eq!(active_count(&repo, household), 1);
        assert_eq!(repo.get_active(household).unwrap().unwrap().id, second.id);

        let again = repo.set_active(second.id);
        assert!(matches!(again, Err(BudgetError::Conflict(_))));
    }

    #[test]
    fn test_households_are_independent() {
        let (_temp_dir, repo) = create_test_repo();
        let a = HouseholdId::new();
        let b = HouseholdId::new();

        assert!(repo.insert_new(budget(a, "A")).unwrap().is_active);
        assert!(repo.insert_new(budget(b, "B")).unwrap().is_active);
    }

    #[test]
    fn test_update_with_discards_on_error() {
        let (_temp_dir, repo) = create_test_repo();
        let stored = repo.insert_new(budget(HouseholdId::new(), "Home")).unwrap();

        let result: BudgetResult<((), PersonalBudget)> = repo.update_with(stored.id, |b| {
            b.name = "Changed".into();
            Err(BudgetError::Validation("nope".into()))
        });
        assert!(result.is_err());
        assert_eq!(repo.get(stored.id).unwrap().unwrap().name, "Home");
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let household = HouseholdId::new();
        let stored = repo.insert_new(budget(household, "Home")).unwrap();
        repo.save().unwrap();

        let repo2 = PersonalBudgetRepository::new(temp_dir.path().join("personal_budgets.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.count().unwrap(), 1);
        assert!(repo2.get(stored.id).unwrap().unwrap().is_active);
    }
}
