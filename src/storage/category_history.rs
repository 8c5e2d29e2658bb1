//! Category history repository for JSON storage
//!
//! An append-only log of category lifecycle events. Sequences are assigned
//! under the write lock and are strictly increasing per household.

use std::path::PathBuf;
use std::sync::RwLock;

use chrono::Utc;

use crate::error::BudgetResult;
use crate::models::{CategoryEvent, CategoryEventId, CategoryEventKind, HouseholdId};

use super::file_io::{read_json, write_json_atomic};
use super::{read_lock, write_lock};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct HistoryData {
    events: Vec<CategoryEvent>,
}

/// Repository for category lifecycle events
pub struct CategoryHistoryRepository {
    path: PathBuf,
    data: RwLock<Vec<CategoryEvent>>,
}

impl CategoryHistoryRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(Vec::new()),
        }
    }

    pub fn load(&self) -> BudgetResult<()> {
        let file_data: HistoryData = read_json(&self.path)?;
        *write_lock(&self.data)? = file_data.events;
        Ok(())
    }

    pub fn save(&self) -> BudgetResult<()> {
        let events = read_lock(&self.data)?.clone();
        write_json_atomic(&self.path, &HistoryData { events })
    }

    /// Append an event, assigning the next sequence for the household
    pub fn append(
        &self,
        household_id: HouseholdId,
        kind: CategoryEventKind,
        names: Vec<String>,
    ) -> BudgetResult<CategoryEvent> {
        let mut data = write_lock(&self.data)?;
        let sequence = data
            .iter()
            .filter(|e| e.household_id == household_id)
            .map(|e| e.sequence)
            .max()
            .unwrap_or(0)
            + 1;

        let event = CategoryEvent {
            id: CategoryEventId::new(),
            household_id,
            sequence,
            kind,
            names,
            created_at: Utc::now(),
        };
        data.push(event.clone());
        Ok(event)
    }

    /// Remove an event appended by an operation that was later rolled back
    pub fn remove(&self, id: CategoryEventId) -> BudgetResult<()> {
        write_lock(&self.data)?.retain(|e| e.id != id);
        Ok(())
    }

    /// The household's events in sequence order
    pub fn list_for_household(&self, household_id: HouseholdId) -> BudgetResult<Vec<CategoryEvent>> {
        let data = read_lock(&self.data)?;
        let mut events: Vec<_> = data
            .iter()
            .filter(|e| e.household_id == household_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    /// Events after `sequence` that touched any of `names`
    pub fn touched_since(
        &self,
        household_id: HouseholdId,
        sequence: u64,
        names: &[&str],
    ) -> BudgetResult<Vec<CategoryEvent>> {
        let mut events = self.list_for_household(household_id)?;
        events.retain(|e| e.sequence > sequence && names.iter().any(|n| e.touches(n)));
        Ok(events)
    }
}
