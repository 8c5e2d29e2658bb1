//! Transaction service
//!
//! A minimal ledger of household transactions so spending can be tracked
//! against budgets. Transactions may only reference categories that exist in
//! some budget of the household.

use chrono::NaiveDate;
use tracing::info;

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::category::same_name;
use crate::models::ids::match_short_id;
use crate::models::{HouseholdId, Money, Transaction, TransactionId, TransactionType, YearMonth};
use crate::storage::Storage;

/// Options for filtering transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Only transactions dated in this month
    pub period: Option<YearMonth>,
    /// Only transactions of this category (case-insensitive)
    pub category: Option<String>,
    /// Maximum number of transactions to return (most recent kept)
    pub limit: Option<usize>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn period(mut self, period: YearMonth) -> Self {
        self.period = Some(period);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Input for recording a transaction
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub category: String,
    pub amount: Money,
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
    pub description: String,
}

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
}

impl<'a> TransactionService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record a transaction against an existing category
    pub fn add(&self, household_id: HouseholdId, input: NewTransaction) -> BudgetResult<Transaction> {
        let category = self
            .known_category(household_id, &input.category)?
            .ok_or_else(|| BudgetError::category_not_found(input.category.trim()))?;

        let mut txn = Transaction::new(
            household_id,
            category,
            input.amount,
            input.transaction_type,
            input.date,
        );
        txn.description = input.description.trim().to_string();
        txn.validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;

        self.storage.log_create(
            EntityType::Transaction,
            txn.id.to_string(),
            Some(txn.category_name.clone()),
            &txn,
        )?;
        info!(
            transaction_id = %txn.id,
            category = %txn.category_name,
            amount = %txn.amount,
            kind = %txn.transaction_type,
            "recorded transaction"
        );

        Ok(txn)
    }

    pub fn get(&self, id: TransactionId) -> BudgetResult<Option<Transaction>> {
        self.storage.transactions.get(id)
    }

    /// Find a household transaction by full or short id
    pub fn find(&self, household_id: HouseholdId, identifier: &str) -> BudgetResult<Option<Transaction>> {
        let transactions = self.storage.transactions.list_for_household(household_id)?;
        let ids: Vec<_> = transactions.iter().map(|t| t.id).collect();
        Ok(match_short_id(identifier, &ids)
            .and_then(|id| transactions.into_iter().find(|t| t.id == id)))
    }

    /// Transactions in chronological order
    pub fn list(&self, household_id: HouseholdId, filter: &TransactionFilter) -> BudgetResult<Vec<Transaction>> {
        let mut transactions = match filter.period {
            Some(period) => self.storage.transactions.get_by_date_range(
                household_id,
                period.start_date(),
                period.end_date(),
            )?,
            None => self.storage.transactions.list_for_household(household_id)?,
        };
        if let Some(category) = &filter.category {
            transactions.retain(|t| same_name(&t.category_name, category));
        }
        if let Some(limit) = filter.limit {
            let skip = transactions.len().saturating_sub(limit);
            transactions.drain(..skip);
        }
        Ok(transactions)
    }

    /// Delete a transaction
    ///
    /// Merge records referencing it can no longer be undone.
    pub fn delete(&self, household_id: HouseholdId, id: TransactionId) -> BudgetResult<Transaction> {
        let txn = self
            .storage
            .transactions
            .get(id)?
            .filter(|t| t.household_id == household_id)
            .ok_or_else(|| BudgetError::transaction_not_found(id.to_string()))?;

        self.storage.transactions.delete(id)?;
        self.storage.transactions.save()?;

        self.storage.log_delete(
            EntityType::Transaction,
            txn.id.to_string(),
            Some(txn.category_name.clone()),
            &txn,
        )?;
        info!(transaction_id = %id, "deleted transaction");

        Ok(txn)
    }

    /// The stored spelling of a category known to any budget or snapshot
    fn known_category(&self, household_id: HouseholdId, name: &str) -> BudgetResult<Option<String>> {
        let name = name.trim();
        let budgets = self.storage.personal_budgets.list_for_household(household_id)?;
        let snapshots = self.storage.monthly_budgets.list_for_household(household_id)?;
        let mut keys = budgets
            .iter()
            .flat_map(|b| b.categories.keys())
            .chain(snapshots.iter().flat_map(|s| s.categories.keys()));
        Ok(keys.find(|k| same_name(k, name)).cloned())
    }
}
