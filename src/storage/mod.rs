//! Storage layer for the budget engine
//!
//! Provides JSON file storage with atomic writes. Each repository keeps its
//! entities in memory behind an `RwLock` and is persisted with `save()`.
//! Operations that must be atomic (single-active switch, compare-and-set
//! status transitions, counter increments) run inside one write-lock
//! critical section in the owning repository.

pub mod adjustments;
pub mod alert_views;
pub mod category_history;
pub mod file_io;
pub mod merges;
pub mod monthly_budgets;
pub mod personal_budgets;
pub mod transactions;

pub use adjustments::AdjustmentRepository;
pub use alert_views::AlertViewRepository;
pub use category_history::CategoryHistoryRepository;
pub use file_io::{read_json, write_json_atomic};
pub use merges::MergeRepository;
pub use monthly_budgets::MonthlyBudgetRepository;
pub use personal_budgets::PersonalBudgetRepository;
pub use transactions::TransactionRepository;

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::BudgetPaths;
use crate::error::{BudgetError, BudgetResult};

/// Acquire a read guard, mapping poisoning to a storage error
pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> BudgetResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))
}

/// Acquire a write guard, mapping poisoning to a storage error
pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> BudgetResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| BudgetError::Storage(format!("Failed to acquire write lock: {}", e)))
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: BudgetPaths,
    audit: AuditLogger,
    pub personal_budgets: PersonalBudgetRepository,
    pub monthly_budgets: MonthlyBudgetRepository,
    pub adjustments: AdjustmentRepository,
    pub merges: MergeRepository,
    pub category_history: CategoryHistoryRepository,
    pub transactions: TransactionRepository,
    pub alert_views: AlertViewRepository,
    lifecycle: Mutex<()>,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: BudgetPaths) -> BudgetResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            audit: AuditLogger::new(paths.audit_log()),
            personal_budgets: PersonalBudgetRepository::new(paths.personal_budgets_file()),
            monthly_budgets: MonthlyBudgetRepository::new(paths.monthly_budgets_file()),
            adjustments: AdjustmentRepository::new(paths.adjustments_file()),
            merges: MergeRepository::new(paths.merges_file()),
            category_history: CategoryHistoryRepository::new(paths.category_history_file()),
            transactions: TransactionRepository::new(paths.transactions_file()),
            alert_views: AlertViewRepository::new(paths.alert_views_file()),
            lifecycle: Mutex::new(()),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &BudgetPaths {
        &self.paths
    }

    /// Get the audit logger
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Serialize category operations and the limit writes they check against
    ///
    /// Held for the whole of a rename/merge/undo so two of them never
    /// interleave their compensating steps, and by every write that records
    /// a category event so an undo never checks a history that is mid-update.
    /// Not reentrant: a holder must not call another guarded operation.
    pub fn lifecycle_guard(&self) -> BudgetResult<MutexGuard<'_, ()>> {
        self.lifecycle
            .lock()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire lifecycle lock: {}", e)))
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> BudgetResult<()> {
        self.personal_budgets.load()?;
        self.monthly_budgets.load()?;
        self.adjustments.load()?;
        self.merges.load()?;
        self.category_history.load()?;
        self.transactions.load()?;
        self.alert_views.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> BudgetResult<()> {
        self.personal_budgets.save()?;
        self.monthly_budgets.save()?;
        self.adjustments.save()?;
        self.merges.save()?;
        self.category_history.save()?;
        self.transactions.save()?;
        self.alert_views.save()?;
        Ok(())
    }

    /// Record a create in the audit log
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> BudgetResult<()> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    /// Record an update in the audit log
    ///
    /// When no summary is given, one is generated from the JSON diff.
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        diff_summary: Option<String>,
    ) -> BudgetResult<()> {
        self.audit.log(&AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            diff_summary,
        ))
    }

    /// Record a delete in the audit log
    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> BudgetResult<()> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }
}
