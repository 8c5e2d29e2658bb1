//! Category merge record
//!
//! Records exactly what a merge changed so it can be undone: the ordered list
//! of reattributed transactions and the source category's definition in every
//! budget it was deactivated in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::category::CategoryConfig;
use super::ids::{HouseholdId, MergeId, MonthlyBudgetId, PersonalBudgetId, TransactionId};

/// Audit and undo record of a category merge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryMergeRecord {
    pub id: MergeId,
    pub household_id: HouseholdId,
    pub source_name: String,
    pub target_name: String,

    #[serde(default)]
    pub reason: String,

    /// Transactions moved from source to target, in the order they were moved
    pub merged_transaction_ids: Vec<TransactionId>,

    /// Source definition per personal budget, before the merge
    #[serde(default)]
    pub source_definitions: BTreeMap<PersonalBudgetId, CategoryConfig>,

    /// Source definition per monthly snapshot, before the merge
    #[serde(default)]
    pub snapshot_definitions: BTreeMap<MonthlyBudgetId, CategoryConfig>,

    /// Position of the merge in the household's category history
    pub sequence: u64,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undone_at: Option<DateTime<Utc>>,
}

impl CategoryMergeRecord {
    pub fn new(
        household_id: HouseholdId,
        source_name: impl Into<String>,
        target_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: MergeId::new(),
            household_id,
            source_name: source_name.into(),
            target_name: target_name.into(),
            reason: reason.into(),
            merged_transaction_ids: Vec::new(),
            source_definitions: BTreeMap::new(),
            snapshot_definitions: BTreeMap::new(),
            sequence: 0,
            created_at: Utc::now(),
            undone_at: None,
        }
    }

    pub fn transaction_count(&self) -> usize {
        self.merged_transaction_ids.len()
    }

    pub fn is_undone(&self) -> bool {
        self.undone_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_keeps_transaction_order() {
        let mut record = CategoryMergeRecord::new(HouseholdId::new(), "Dining", "Groceries", "");
        let ids: Vec<_> = (0..3).map(|_| TransactionId::new()).collect();
        record.merged_transaction_ids = ids.clone();

        let json = serde_json::to_string(&record).unwrap();
        let back: CategoryMergeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.merged_transaction_ids, ids);
        assert!(!back.is_undone());
    }
}
