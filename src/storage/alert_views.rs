//! Alert view repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::BudgetResult;
use crate::models::{AlertId, AlertView, HouseholdId};

use super::file_io::{read_json, write_json_atomic};
use super::{read_lock, write_lock};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct AlertViewData {
    views: Vec<AlertView>,
}

/// Repository for "mark as viewed" records
pub struct AlertViewRepository {
    path: PathBuf,
    data: RwLock<HashMap<(HouseholdId, AlertId), AlertView>>,
}

impl AlertViewRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> BudgetResult<()> {
        let file_data: AlertViewData = read_json(&self.path)?;
        let mut data = write_lock(&self.data)?;
        data.clear();
        for view in file_data.views {
            data.insert((view.household_id, view.alert_id), view);
        }
        Ok(())
    }

    pub fn save(&self) -> BudgetResult<()> {
        let data = read_lock(&self.data)?;
        let mut views: Vec<_> = data.values().cloned().collect();
        views.sort_by(|a, b| a.viewed_at.cmp(&b.viewed_at));
        write_json_atomic(&self.path, &AlertViewData { views })
    }

    /// Record a view; the first view of an alert is kept
    ///
    /// Returns true when the alert had not been viewed before.
    pub fn mark_viewed(&self, view: AlertView) -> BudgetResult<bool> {
        let mut data = write_lock(&self.data)?;
        let key = (view.household_id, view.alert_id);
        if data.contains_key(&key) {
            return Ok(false);
        }
        data.insert(key, view);
        Ok(true)
    }

    pub fn is_viewed(&self, household_id: HouseholdId, alert_id: AlertId) -> BudgetResult<bool> {
        Ok(read_lock(&self.data)?.contains_key(&(household_id, alert_id)))
    }

    pub fn delete_for_household(&self, household_id: HouseholdId) -> BudgetResult<usize> {
        let mut data = write_lock(&self.data)?;
        let before = data.len();
        data.retain(|(h, _), _| *h != household_id);
        Ok(before - data.len())
    }
}
