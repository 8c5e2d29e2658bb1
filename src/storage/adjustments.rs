//! Scheduled adjustment repository for JSON storage
//!
//! Status transitions go through [`AdjustmentRepository::transition`], a
//! compare-and-set under the write lock: only a caller that observes the
//! expected status wins.
//!
//! The lock lives in this process. Two `hbudget` processes sharing a data
//! directory each load their own copy, and the last `save()` replaces the
//! file, so an adjustment can be applied once per process. Run one process
//! per data directory.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::Utc;

use crate::error::{BudgetError, BudgetResult};
use crate::models::category::same_name;
use crate::models::{AdjustmentId, AdjustmentStatus, HouseholdId, ScheduledAdjustment, YearMonth};

use super::file_io::{read_json, write_json_atomic};
use super::{read_lock, write_lock};

/// Serializable adjustment data
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct AdjustmentData {
    adjustments: Vec<ScheduledAdjustment>,
}

/// Repository for scheduled adjustments
pub struct AdjustmentRepository {
    path: PathBuf,
    data: RwLock<HashMap<AdjustmentId, ScheduledAdjustment>>,
}

fn sort_by_schedule(adjustments: &mut [ScheduledAdjustment]) {
    adjustments.sort_by(|a, b| {
        a.effective_period()
            .cmp(&b.effective_period())
            .then(a.created_at.cmp(&b.created_at))
    });
}

impl AdjustmentRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load adjustments from disk
    pub fn load(&self) -> BudgetResult<()> {
        let file_data: AdjustmentData = read_json(&self.path)?;
        let mut data = write_lock(&self.data)?;
        data.clear();
        for adjustment in file_data.adjustments {
            data.insert(adjustment.id, adjustment);
        }
        Ok(())
    }

    /// Save adjustments to disk
    pub fn save(&self) -> BudgetResult<()> {
        let data = read_lock(&self.data)?;
        let mut adjustments: Vec<_> = data.values().cloned().collect();
        sort_by_schedule(&mut adjustments);
        write_json_atomic(&self.path, &AdjustmentData { adjustments })
    }

    pub fn get(&self, id: AdjustmentId) -> BudgetResult<Option<ScheduledAdjustment>> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    /// Insert a pending adjustment unless one already exists for the same
    /// category and effective month
    pub fn insert_pending(&self, adjustment: ScheduledAdjustment) -> BudgetResult<()> {
        let mut data = write_lock(&self.data)?;
        let period = adjustment.effective_period();
        let duplicate = data.values().any(|a| {
            a.household_id == adjustment.household_id
                && a.is_pending()
                && a.effective_period() == period
                && same_name(&a.category_name, &adjustment.category_name)
        });
        if duplicate {
            return Err(BudgetError::Conflict(format!(
                "A pending adjustment for '{}' in {} already exists",
                adjustment.category_name, period
            )));
        }
        data.insert(adjustment.id, adjustment);
        Ok(())
    }

    /// Compare-and-set a status transition
    ///
    /// Returns the updated adjustment if the stored status was `from`, or
    /// `None` if another caller already moved it.
    pub fn transition(
        &self,
        id: AdjustmentId,
        from: AdjustmentStatus,
        to: AdjustmentStatus,
    ) -> BudgetResult<Option<ScheduledAdjustment>> {
        if !from.can_transition_to(to) {
            return Err(BudgetError::Conflict(format!(
                "Adjustment cannot move from {} to {}",
                from, to
            )));
        }

        let mut data = write_lock(&self.data)?;
        let adjustment = data
            .get_mut(&id)
            .ok_or_else(|| BudgetError::adjustment_not_found(id.to_string()))?;
        if adjustment.status != from {
            return Ok(None);
        }

        adjustment.status = to;
        match to {
            AdjustmentStatus::Applied => adjustment.applied_at = Some(Utc::now()),
            AdjustmentStatus::Cancelled => adjustment.cancelled_at = Some(Utc::now()),
            AdjustmentStatus::Pending => {}
        }
        Ok(Some(adjustment.clone()))
    }

    /// Return an applied claim to pending after its snapshot write failed
    pub fn release_claim(&self, id: AdjustmentId) -> BudgetResult<()> {
        let mut data = write_lock(&self.data)?;
        let adjustment = data
            .get_mut(&id)
            .ok_or_else(|| BudgetError::adjustment_not_found(id.to_string()))?;
        if adjustment.status == AdjustmentStatus::Applied {
            adjustment.status = AdjustmentStatus::Pending;
            adjustment.applied_at = None;
        }
        Ok(())
    }

    /// All adjustments for a household in schedule order
    pub fn list_for_household(&self, household_id: HouseholdId) -> BudgetResult<Vec<ScheduledAdjustment>> {
        let data = read_lock(&self.data)?;
        let mut adjustments: Vec<_> = data
            .values()
            .filter(|a| a.household_id == household_id)
            .cloned()
            .collect();
        sort_by_schedule(&mut adjustments);
        Ok(adjustments)
    }

    /// Pending adjustments for a household
    pub fn pending_for_household(&self, household_id: HouseholdId) -> BudgetResult<Vec<ScheduledAdjustment>> {
        let mut pending = self.list_for_household(household_id)?;
        pending.retain(|a| a.is_pending());
        Ok(pending)
    }

    /// Pending adjustments effective in exactly `period`
    pub fn pending_for_period(
        &self,
        household_id: HouseholdId,
        period: YearMonth,
    ) -> BudgetResult<Vec<ScheduledAdjustment>> {
        let mut pending = self.pending_for_household(household_id)?;
        pending.retain(|a| a.effective_period() == period);
        Ok(pending)
    }

    /// Pending adjustments effective in or before `period`
    pub fn pending_due(&self, household_id: HouseholdId, period: YearMonth) -> BudgetResult<Vec<ScheduledAdjustment>> {
        let mut pending = self.pending_for_household(household_id)?;
        pending.retain(|a| a.effective_period() <= period);
        Ok(pending)
    }

    /// Insert or replace an adjustment as-is
    pub fn upsert(&self, adjustment: ScheduledAdjustment) -> BudgetResult<()> {
        write_lock(&self.data)?.insert(adjustment.id, adjustment);
        Ok(())
    }

    /// Delete every adjustment of a household; returns the number removed
    pub fn delete_for_household(&self, household_id: HouseholdId) -> BudgetResult<usize> {
        let mut data = write_lock(&self.data)?;
        let before = data.len();
        data.retain(|_, a| a.household_id != household_id);
        Ok(before - data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, AdjustmentRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = AdjustmentRepository::new(temp_dir.path().join("adjustments.json"));
        (temp_dir, repo)
    }

    fn adjustment(household: HouseholdId, name: &str) -> ScheduledAdjustment {
        ScheduledAdjustment::new(
            household,
            name,
            Money::from_units(1500),
            Money::from_units(1800),
            YearMonth::new(2025, 6).unwrap(),
            "inflation",
        )
    }

    #[test]
    fn test_duplicate_pending_rejected() {
        let (_temp_dir, repo) = create_test_repo();
        let household = HouseholdId::new();
        repo.insert_pending(adjustment(household, "Groceries")).unwrap();

        let result = repo.insert_pending(adjustment(household, "groceries"));
        assert!(matches!(result, Err(BudgetError::Conflict(_))));

        // A different household is unaffected
        repo.insert_pending(adjustment(HouseholdId::new(), "Groceries")).unwrap();
    }

    #[test]
    fn test_cancelled_does_not_block_rescheduling() {
        let (_temp_dir, repo) = create_test_repo();
        let household = HouseholdId::new();
        let first = adjustment(household, "Groceries");
        let id = first.id;
        repo.insert_pending(first).unwrap();
        repo.transition(id, AdjustmentStatus::Pending, AdjustmentStatus::Cancelled)
            .unwrap();

        repo.insert_pending(adjustment(household, "Groceries")).unwrap();
    }

    #[test]
    fn test_transition_is_compare_and_set() {
        let (_temp_dir, repo) = create_test_repo();
        let adj = adjustment(HouseholdId::new(), "Groceries");
        let id = adj.id;
        repo.insert_pending(adj).unwrap();

        let won = repo
            .transition(id, AdjustmentStatus::Pending, AdjustmentStatus::Applied)
            .unwrap();
        assert!(won.is_some_and(|a| a.applied_at.is_some()));

        let lost = repo
            .transition(id, AdjustmentStatus::Pending, AdjustmentStatus::Applied)
            .unwrap();
        assert!(lost.is_none());
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let (_temp_dir, repo) = create_test_repo();
        let adj = adjustment(HouseholdId::new(), "Groceries");
        let id = adj.id;
        repo.insert_pending(adj).unwrap();

        let result = repo.transition(id, AdjustmentStatus::Applied, AdjustmentStatus::Cancelled);
        assert!(matches!(result, Err(BudgetError::Conflict(_))));
    }

    #[test]
    fn test_release_claim_returns_to_pending() {
        let (_temp_dir, repo) = create_test_repo();
        let adj = adjustment(HouseholdId::new(), "Groceries");
        let id = adj.id;
        repo.insert_pending(adj).unwrap();
        repo.transition(id, AdjustmentStatus::Pending, AdjustmentStatus::Applied)
            .unwrap();

        repo.release_claim(id).unwrap();
        let stored = repo.get(id).unwrap().unwrap();
        assert!(stored.is_pending());
        assert!(stored.applied_at.is_none());
    }

    #[test]
    fn test_pending_due_filters_by_period() {
        let (_temp_dir, repo) = create_test_repo();
        let household = HouseholdId::new();
        repo.insert_pending(adjustment(household, "Groceries")).unwrap();
        let mut later = adjustment(household, "Transport");
        later.effective_month = 7;
        repo.insert_pending(later).unwrap();

        let may = YearMonth::new(2025, 5).unwrap();
        let june = YearMonth::new(2025, 6).unwrap();
        assert!(repo.pending_due(household, may).unwrap().is_empty());
        assert_eq!(repo.pending_due(household, june).unwrap().len(), 1);
        assert_eq!(repo.pending_due(household, june.next()).unwrap().len(), 2);
        assert_eq!(repo.pending_for_period(household, june.next()).unwrap().len(), 1);
    }
}
