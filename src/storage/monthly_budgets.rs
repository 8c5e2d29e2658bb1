//! Monthly budget snapshot repository for JSON storage
//!
//! Snapshots are unique on (household, year, month). The period index and the
//! entity map live behind one lock so lookups and inserts cannot disagree.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{BudgetError, BudgetResult};
use crate::models::{HouseholdId, MonthlyBudget, MonthlyBudgetId, YearMonth};

use super::file_io::{read_json, write_json_atomic};
use super::{read_lock, write_lock};

/// Serializable snapshot data
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct MonthlyBudgetData {
    monthly_budgets: Vec<MonthlyBudget>,
}

#[derive(Default)]
struct Snapshots {
    by_id: HashMap<MonthlyBudgetId, MonthlyBudget>,
    /// Index: (household, period) -> snapshot id
    by_period: HashMap<(HouseholdId, YearMonth), MonthlyBudgetId>,
}

impl Snapshots {
    fn insert(&mut self, snapshot: MonthlyBudget) {
        self.by_period
            .insert((snapshot.household_id, snapshot.period()), snapshot.id);
        self.by_id.insert(snapshot.id, snapshot);
    }
}

/// Repository for monthly budget persistence
pub struct MonthlyBudgetRepository {
    path: PathBuf,
    data: RwLock<Snapshots>,
}

impl MonthlyBudgetRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(Snapshots::default()),
        }
    }

    /// Load snapshots from disk and rebuild the period index
    pub fn load(&self) -> BudgetResult<()> {
        let file_data: MonthlyBudgetData = read_json(&self.path)?;
        let mut data = write_lock(&self.data)?;
        *data = Snapshots::default();
        for snapshot in file_data.monthly_budgets {
            data.insert(snapshot);
        }
        Ok(())
    }

    /// Save snapshots to disk
    pub fn save(&self) -> BudgetResult<()> {
        let data = read_lock(&self.data)?;
        let mut monthly_budgets: Vec<_> = data.by_id.values().cloned().collect();
        monthly_budgets.sort_by(|a, b| {
            a.household_id
                .cmp(&b.household_id)
                .then(a.period().cmp(&b.period()))
        });
        write_json_atomic(&self.path, &MonthlyBudgetData { monthly_budgets })
    }

    pub fn get(&self, id: MonthlyBudgetId) -> BudgetResult<Option<MonthlyBudget>> {
        Ok(read_lock(&self.data)?.by_id.get(&id).cloned())
    }

    /// Find the snapshot for a household and month
    pub fn find(&self, household_id: HouseholdId, period: YearMonth) -> BudgetResult<Option<MonthlyBudget>> {
        let data = read_lock(&self.data)?;
        Ok(data
            .by_period
            .get(&(household_id, period))
            .and_then(|id| data.by_id.get(id))
            .cloned())
    }

    /// Return the existing snapshot or insert the one built by `create`
    ///
    /// The existence check and the insert share one write lock, so concurrent
    /// callers converge on a single snapshot. `create` only runs when the
    /// snapshot is missing. The flag is true when a snapshot was created.
    pub fn get_or_insert_with<F>(
        &self,
        household_id: HouseholdId,
        period: YearMonth,
        create: F,
    ) -> BudgetResult<(MonthlyBudget, bool)>
    where
        F: FnOnce() -> BudgetResult<MonthlyBudget>,
    {
        let mut data = write_lock(&self.data)?;
        if let Some(existing) = data
            .by_period
            .get(&(household_id, period))
            .and_then(|id| data.by_id.get(id))
        {
            return Ok((existing.clone(), false));
        }

        let snapshot = create()?;
        if snapshot.household_id != household_id || snapshot.period() != period {
            return Err(BudgetError::Storage(format!(
                "Snapshot built for {} does not match requested period {}",
                snapshot.period(),
                period
            )));
        }
        data.insert(snapshot.clone());
        Ok((snapshot, true))
    }

    /// Read-modify-write a snapshot under the write lock
    ///
    /// The closure sees the authoritative current state and works on a copy;
    /// the stored snapshot is replaced only when it returns Ok.
    pub fn update_with<T, F>(&self, id: MonthlyBudgetId, f: F) -> BudgetResult<(T, MonthlyBudget)>
    where
        F: FnOnce(&mut MonthlyBudget) -> BudgetResult<T>,
    {
        let mut data = write_lock(&self.data)?;
        let current = data
            .by_id
            .get(&id)
            .ok_or_else(|| BudgetError::monthly_not_found(id.to_string()))?;
        let mut working = current.clone();
        let value = f(&mut working)?;
        data.by_id.insert(id, working.clone());
        Ok((value, working))
    }

    /// All snapshots for a household, oldest month first
    pub fn list_for_household(&self, household_id: HouseholdId) -> BudgetResult<Vec<MonthlyBudget>> {
        let data = read_lock(&self.data)?;
        let mut snapshots: Vec<_> = data
            .by_id
            .values()
            .filter(|s| s.household_id == household_id)
            .cloned()
            .collect();
        snapshots.sort_by_key(|s| s.period());
        Ok(snapshots)
    }

    /// Insert or replace a snapshot as-is
    pub fn upsert(&self, snapshot: MonthlyBudget) -> BudgetResult<()> {
        let mut data = write_lock(&self.data)?;
        data.insert(snapshot);
        Ok(())
    }

    /// Delete every snapshot of a household; returns the number removed
    pub fn delete_for_household(&self, household_id: HouseholdId) -> BudgetResult<usize> {
        let mut data = write_lock(&self.data)?;
        let before = data.by_id.len();
        data.by_id.retain(|_, s| s.household_id != household_id);
        data.by_period.retain(|(h, _), _| *h != household_id);
        Ok(before - data.by_id.len())
    }

    pub fn count(&self) -> BudgetResult<usize> {
        Ok(read_lock(&self.data)?.by_id.len())
    }
}
