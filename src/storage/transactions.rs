//! Transaction repository for JSON storage
//!
//! Manages loading and saving transactions to transactions.json. Category
//! reattribution (rename, merge, undo) happens here in one critical section
//! and reports exactly which transactions moved.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::error::{BudgetError, BudgetResult};
use crate::models::{HouseholdId, Transaction, TransactionId};

use super::file_io::{read_json, write_json_atomic};
use super::{read_lock, write_lock};

/// Serializable transaction data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransactionData {
    transactions: Vec<Transaction>,
}

/// Repository for transaction persistence
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
}

/// Oldest first, with id as a stable tie-breaker
fn chronological(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
}

impl TransactionRepository {
    /// Create a new transaction repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load transactions from disk
    pub fn load(&self) -> BudgetResult<()> {
        let file_data: TransactionData = read_json(&self.path)?;
        let mut data = write_lock(&self.data)?;
        data.clear();
        for txn in file_data.transactions {
            data.insert(txn.id, txn);
        }
        Ok(())
    }

    /// Save transactions to disk
    pub fn save(&self) -> BudgetResult<()> {
        let data = read_lock(&self.data)?;
        let mut transactions: Vec<_> = data.values().cloned().collect();
        chronological(&mut transactions);
        write_json_atomic(&self.path, &TransactionData { transactions })
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> BudgetResult<Option<Transaction>> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    /// All transactions for a household, oldest first
    pub fn list_for_household(&self, household_id: HouseholdId) -> BudgetResult<Vec<Transaction>> {
        let data = read_lock(&self.data)?;
        let mut transactions: Vec<_> = data
            .values()
            .filter(|t| t.household_id == household_id)
            .cloned()
            .collect();
        chronological(&mut transactions);
        Ok(transactions)
    }

    /// Number of transactions attributed to a category
    pub fn count_by_category(&self, household_id: HouseholdId, category_name: &str) -> BudgetResult<usize> {
        let data = read_lock(&self.data)?;
        Ok(data
            .values()
            .filter(|t| t.household_id == household_id && t.category_name == category_name)
            .count())
    }

    /// Transactions dated within `[start, end]`
    pub fn get_by_date_range(
        &self,
        household_id: HouseholdId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BudgetResult<Vec<Transaction>> {
        let mut transactions = self.list_for_household(household_id)?;
        transactions.retain(|t| t.date >= start && t.date <= end);
        Ok(transactions)
    }

    /// Insert or update a transaction
    pub fn upsert(&self, txn: Transaction) -> BudgetResult<()> {
        write_lock(&self.data)?.insert(txn.id, txn);
        Ok(())
    }

    /// Delete a transaction
    pub fn delete(&self, id: TransactionId) -> BudgetResult<Option<Transaction>> {
        Ok(write_lock(&self.data)?.remove(&id))
    }

    /// Move every transaction of `from` to `to`
    ///
    /// Returns the moved ids in chronological order.
    pub fn reassign_category(
        &self,
        household_id: HouseholdId,
        from: &str,
        to: &str,
    ) -> BudgetResult<Vec<TransactionId>> {
        let mut data = write_lock(&self.data)?;
        let mut moving: Vec<_> = data
            .values()
            .filter(|t| t.household_id == household_id && t.category_name == from)
            .cloned()
            .collect();
        chronological(&mut moving);

        let mut moved = Vec::with_capacity(moving.len());
        for txn in moving {
            if let Some(stored) = data.get_mut(&txn.id) {
                stored.set_category(to);
                moved.push(txn.id);
            }
        }
        Ok(moved)
    }

    /// Attribute exactly the listed transactions to `category_name`
    ///
    /// Fails without changing anything if any id is unknown.
    pub fn set_category_for(&self, ids: &[TransactionId], category_name: &str) -> BudgetResult<()> {
        let mut data = write_lock(&self.data)?;
        if let Some(missing) = ids.iter().find(|id| !data.contains_key(*id)) {
            return Err(BudgetError::transaction_not_found(missing.to_string()));
        }
        for id in ids {
            if let Some(txn) = data.get_mut(id) {
                txn.set_category(category_name);
            }
        }
        Ok(())
    }

    /// Delete every transaction of a household; returns the number removed
    pub fn delete_for_household(&self, household_id: HouseholdId) -> BudgetResult<usize> {
        let mut data = write_lock(&self.data)?;
        let before = data.len();
        data.retain(|_, t| t.household_id != household_id);
        Ok(before - data.len())
    }

    /// Count all transactions
    pub fn count(&self) -> BudgetResult<usize> {
        Ok(read_lock(&self.data)?.len())
    }
}
