//! Report service
//!
//! Wires the pure comparison and performance analyses to stored snapshots,
//! baselines, transactions and alert views.

use tracing::debug;

use crate::config::HouseholdContext;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{HouseholdId, YearMonth};
use crate::reports::{self, Alert, ComparisonReport, PerformanceReport};
use crate::services::AlertService;
use crate::storage::Storage;

pub struct ReportService<'a> {
    storage: &'a Storage,
}

impl<'a> ReportService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Compare a month's snapshot with the active budget
    pub fn compare(&self, household_id: HouseholdId, period: YearMonth) -> BudgetResult<ComparisonReport> {
        let snapshot = self
            .storage
            .monthly_budgets
            .find(household_id, period)?
            .ok_or_else(|| BudgetError::monthly_not_found(period.to_string()))?;
        let baseline = self
            .storage
            .personal_budgets
            .get_active(household_id)?
            .ok_or_else(|| BudgetError::no_active_budget(household_id.to_string()))?;
        Ok(reports::compare(&snapshot, &baseline))
    }

    /// Compare a month's snapshot with its limits as created
    pub fn compare_to_original(&self, household_id: HouseholdId, period: YearMonth) -> BudgetResult<ComparisonReport> {
        let snapshot = self
            .storage
            .monthly_budgets
            .find(household_id, period)?
            .ok_or_else(|| BudgetError::monthly_not_found(period.to_string()))?;
        Ok(reports::compare_to_original(&snapshot))
    }

    /// Budget-vs-actual for a month
    ///
    /// Uses the month's snapshot when one exists, otherwise the active
    /// baseline. Never creates a snapshot.
    pub fn performance(&self, household_id: HouseholdId, period: YearMonth) -> BudgetResult<PerformanceReport> {
        let categories = match self.storage.monthly_budgets.find(household_id, period)? {
            Some(snapshot) => snapshot.categories,
            None => {
                debug!(household_id = %household_id, period = %period, "no snapshot; analysing baseline");
                self.storage
                    .personal_budgets
                    .get_active(household_id)?
                    .ok_or_else(|| BudgetError::no_active_budget(household_id.to_string()))?
                    .categories
            }
        };
        let transactions = self.storage.transactions.get_by_date_range(
            household_id,
            period.start_date(),
            period.end_date(),
        )?;

        let mut report = reports::analyze_performance(household_id, period, &categories, &transactions);
        AlertService::new(self.storage).annotate(household_id, &mut report.alerts)?;
        Ok(report)
    }

    /// Mark one of a month's current alerts as viewed
    ///
    /// The alert is looked up by full or short id among the month's alerts.
    pub fn mark_alert_viewed(
        &self,
        ctx: &HouseholdContext,
        period: YearMonth,
        identifier: &str,
    ) -> BudgetResult<(Alert, bool)> {
        let report = self.performance(ctx.household_id, period)?;
        let ids: Vec<_> = report.alerts.iter().map(|a| a.id).collect();
        let alert = crate::models::ids::match_short_id(identifier, &ids)
            .and_then(|id| report.alerts.into_iter().find(|a| a.id == id))
            .ok_or_else(|| BudgetError::NotFound {
                entity_type: "Alert",
                identifier: identifier.to_string(),
            })?;
        let first = AlertService::new(self.storage).mark_viewed(ctx, alert.id)?;
        Ok((Alert { viewed: true, ..alert }, first))
    }
}
