//! Category merge record repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::Utc;

use crate::error::{BudgetError, BudgetResult};
use crate::models::{CategoryMergeRecord, HouseholdId, MergeId};

use super::file_io::{read_json, write_json_atomic};
use super::{read_lock, write_lock};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct MergeData {
    merges: Vec<CategoryMergeRecord>,
}

/// Repository for merge records
pub struct MergeRepository {
    path: PathBuf,
    data: RwLock<HashMap<MergeId, CategoryMergeRecord>>,
}

impl MergeRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> BudgetResult<()> {
        let file_data: MergeData = read_json(&self.path)?;
        let mut data = write_lock(&self.data)?;
        data.clear();
        for record in file_data.merges {
            data.insert(record.id, record);
        }
        Ok(())
    }

    pub fn save(&self) -> BudgetResult<()> {
        let data = read_lock(&self.data)?;
        let mut merges: Vec<_> = data.values().cloned().collect();
        merges.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        write_json_atomic(&self.path, &MergeData { merges })
    }

    pub fn get(&self, id: MergeId) -> BudgetResult<Option<CategoryMergeRecord>> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    /// Merge records for a household, oldest first
    pub fn list_for_household(&self, household_id: HouseholdId) -> BudgetResult<Vec<CategoryMergeRecord>> {
        let data = read_lock(&self.data)?;
        let mut merges: Vec<_> = data
            .values()
            .filter(|m| m.household_id == household_id)
            .cloned()
            .collect();
        merges.sort_by_key(|m| m.sequence);
        Ok(merges)
    }

    pub fn insert(&self, record: CategoryMergeRecord) -> BudgetResult<()> {
        write_lock(&self.data)?.insert(record.id, record);
        Ok(())
    }

    /// Mark a merge as undone; fails if it already was
    pub fn mark_undone(&self, id: MergeId) -> BudgetResult<CategoryMergeRecord> {
        let mut data = write_lock(&self.data)?;
        let record = data
            .get_mut(&id)
            .ok_or_else(|| BudgetError::merge_not_found(id.to_string()))?;
        if record.is_undone() {
            return Err(BudgetError::Conflict(format!(
                "Merge of '{}' into '{}' was already undone",
                record.source_name, record.target_name
            )));
        }
        record.undone_at = Some(Utc::now());
        Ok(record.clone())
    }

    pub fn remove(&self, id: MergeId) -> BudgetResult<Option<CategoryMergeRecord>> {
        Ok(write_lock(&self.data)?.remove(&id))
    }

    /// Replace a record as-is (used to roll back `mark_undone`)
    pub fn upsert(&self, record: CategoryMergeRecord) -> BudgetResult<()> {
        self.insert(record)
    }

    pub fn delete_for_household(&self, household_id: HouseholdId) -> BudgetResult<usize> {
        let mut data = write_lock(&self.data)?;
        let before = data.len();
        data.retain(|_, m| m.household_id != household_id);
        Ok(before - data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mark_undone_once() {
        let temp_dir = TempDir::new().unwrap();
        let repo = MergeRepository::new(temp_dir.path().join("merges.json"));
        let record = CategoryMergeRecord::new(HouseholdId::new(), "Dining", "Groceries", "");
        let id = record.id;
        repo.insert(record).unwrap();

        assert!(repo.mark_undone(id).unwrap().is_undone());
        assert!(matches!(repo.mark_undone(id), Err(BudgetError::Conflict(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("merges.json");
        let repo = MergeRepository::new(path.clone());
        let household = HouseholdId::new();
        repo.insert(CategoryMergeRecord::new(household, "Dining", "Groceries", "tidy up"))
            .unwrap();
        repo.save().unwrap();

        let repo2 = MergeRepository::new(path);
        repo2.load().unwrap();
        let merges = repo2.list_for_household(household).unwrap();
        assert_eq!(merges.len(), 1);
        assert_eq!(merges[0].reason, "tidy up");
    }
}
