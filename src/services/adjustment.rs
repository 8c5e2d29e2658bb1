//! Adjustment scheduler service
//!
//! Queues category-limit changes for future months and applies them lazily
//! when a session notices the month has rolled over.
//!
//! Application is claim-then-write: an adjustment is first moved
//! pending -> applied with a compare-and-set, and only the caller that won
//! the claim writes the snapshot. If that write fails the claim is released
//! so a later rollover retries it. "At most once" holds across threads
//! sharing one [`Storage`]; see [`crate::storage::adjustments`] for the
//! multi-process limit.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::category::{same_name, validate_category_name};
use crate::models::ids::match_short_id;
use crate::models::{
    AdjustmentId, AdjustmentStatus, CategoryConfig, CategoryEventKind, HouseholdId, Money,
    ScheduledAdjustment, YearMonth,
};
use crate::services::MonthlyBudgetService;
use crate::storage::Storage;

/// Pending changes for one month
#[derive(Debug, Clone)]
pub struct AdjustmentSummary {
    pub period: YearMonth,
    pub adjustment_count: usize,
    pub total_increase: Money,
    pub total_decrease: Money,
    pub net_change: Money,
    pub adjustments: Vec<ScheduledAdjustment>,
}

impl AdjustmentSummary {
    fn from_pending(period: YearMonth, adjustments: Vec<ScheduledAdjustment>) -> Self {
        let mut total_increase = Money::zero();
        let mut total_decrease = Money::zero();
        for adjustment in &adjustments {
            let delta = adjustment.delta();
            if delta.is_positive() {
                total_increase += delta;
            } else {
                total_decrease += delta.abs();
            }
        }
        Self {
            period,
            adjustment_count: adjustments.len(),
            total_increase,
            total_decrease,
            net_change: total_increase - total_decrease,
            adjustments,
        }
    }
}

/// An adjustment that was due but could not be applied this time
#[derive(Debug, Clone)]
pub struct SkippedAdjustment {
    pub adjustment: ScheduledAdjustment,
    pub reason: String,
}

/// Outcome of one auto-apply pass
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub applied: Vec<ScheduledAdjustment>,
    pub skipped: Vec<SkippedAdjustment>,
}

impl ApplyReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.skipped.is_empty()
    }
}

/// Service for scheduled adjustments
pub struct AdjustmentService<'a> {
    storage: &'a Storage,
    propagate_to_baseline: bool,
}

impl<'a> AdjustmentService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            propagate_to_baseline: true,
        }
    }

    /// Whether applied adjustments are also written into the active baseline
    pub fn propagate_to_baseline(mut self, propagate: bool) -> Self {
        self.propagate_to_baseline = propagate;
        self
    }

    /// Schedule a change effective the month after `today`
    pub fn schedule(
        &self,
        household_id: HouseholdId,
        category_name: &str,
        current_limit: Money,
        new_limit: Money,
        reason: &str,
        today: NaiveDate,
    ) -> BudgetResult<ScheduledAdjustment> {
        let effective = YearMonth::from_date(today).next();
        self.schedule_for(
            household_id,
            category_name,
            current_limit,
            new_limit,
            reason,
            effective,
            today,
        )
    }

    /// Schedule a change for an explicit month, which must be after `today`'s month
    #[allow(clippy::too_many_arguments)]
    pub fn schedule_for(
        &self,
        household_id: HouseholdId,
        category_name: &str,
        current_limit: Money,
        new_limit: Money,
        reason: &str,
        effective: YearMonth,
        today: NaiveDate,
    ) -> BudgetResult<ScheduledAdjustment> {
        let category_name = category_name.trim();
        let mut adjustment = ScheduledAdjustment::new(
            household_id,
            category_name,
            current_limit,
            new_limit,
            effective,
            reason.trim(),
        );
        adjustment
            .validate(today)
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        adjustment.is_new_category = match self.storage.personal_budgets.get_active(household_id)? {
            Some(baseline) => !baseline.categories.contains_key(category_name),
            None => false,
        };

        self.insert(adjustment)
    }

    /// Schedule a category that does not exist yet
    pub fn schedule_new_category(
        &self,
        household_id: HouseholdId,
        category_name: &str,
        limit: Money,
        reason: &str,
        today: NaiveDate,
    ) -> BudgetResult<ScheduledAdjustment> {
        let category_name = category_name.trim();
        validate_category_name(category_name).map_err(|e| BudgetError::Validation(e.to_string()))?;

        if let Some(baseline) = self.storage.personal_budgets.get_active(household_id)? {
            if baseline
                .categories
                .iter()
                .any(|(name, config)| config.is_active && same_name(name, category_name))
            {
                return Err(BudgetError::Duplicate {
                    entity_type: "Category",
                    identifier: category_name.to_string(),
                });
            }
        }

        let mut adjustment = ScheduledAdjustment::new(
            household_id,
            category_name,
            Money::zero(),
            limit,
            YearMonth::from_date(today).next(),
            reason.trim(),
        );
        adjustment
            .validate(today)
            .map_err(|e| BudgetError::Validation(e.to_string()))?;
        adjustment.is_new_category = true;

        self.insert(adjustment)
    }

    fn insert(&self, adjustment: ScheduledAdjustment) -> BudgetResult<ScheduledAdjustment> {
        self.storage.adjustments.insert_pending(adjustment.clone())?;
        self.storage.adjustments.save()?;

        self.storage.log_create(
            EntityType::ScheduledAdjustment,
            adjustment.id.to_string(),
            Some(adjustment.category_name.clone()),
            &adjustment,
        )?;
        info!(
            adjustment_id = %adjustment.id,
            category = %adjustment.category_name,
            effective = %adjustment.effective_period(),
            kind = %adjustment.kind,
            new_category = adjustment.is_new_category,
            "scheduled adjustment"
        );

        Ok(adjustment)
    }

    /// Cancel a pending adjustment
    pub fn cancel(&self, id: AdjustmentId) -> BudgetResult<ScheduledAdjustment> {
        let before = self
            .storage
            .adjustments
            .get(id)?
            .ok_or_else(|| BudgetError::adjustment_not_found(id.to_string()))?;

        let cancelled = self
            .storage
            .adjustments
            .transition(id, AdjustmentStatus::Pending, AdjustmentStatus::Cancelled)?
            .ok_or_else(|| {
                BudgetError::Conflict(format!(
                    "Only pending adjustments can be cancelled; this one is {}",
                    before.status
                ))
            })?;
        self.storage.adjustments.save()?;

        self.storage.log_update(
            EntityType::ScheduledAdjustment,
            cancelled.id.to_string(),
            Some(cancelled.category_name.clone()),
            &before,
            &cancelled,
            None,
        )?;
        info!(adjustment_id = %id, "cancelled adjustment");

        Ok(cancelled)
    }

    pub fn get(&self, id: AdjustmentId) -> BudgetResult<Option<ScheduledAdjustment>> {
        self.storage.adjustments.get(id)
    }

    /// Find a household adjustment by full or short id
    pub fn find(&self, household_id: HouseholdId, identifier: &str) -> BudgetResult<Option<ScheduledAdjustment>> {
        let adjustments = self.list(household_id)?;
        let ids: Vec<_> = adjustments.iter().map(|a| a.id).collect();
        Ok(match_short_id(identifier, &ids)
            .and_then(|id| adjustments.into_iter().find(|a| a.id == id)))
    }

    pub fn list(&self, household_id: HouseholdId) -> BudgetResult<Vec<ScheduledAdjustment>> {
        self.storage.adjustments.list_for_household(household_id)
    }

    pub fn list_pending(&self, household_id: HouseholdId) -> BudgetResult<Vec<ScheduledAdjustment>> {
        self.storage.adjustments.pending_for_household(household_id)
    }

    /// Pending changes for the month after `today`
    pub fn next_month_summary(&self, household_id: HouseholdId, today: NaiveDate) -> BudgetResult<AdjustmentSummary> {
        let period = YearMonth::from_date(today).next();
        let pending = self.storage.adjustments.pending_for_period(household_id, period)?;
        Ok(AdjustmentSummary::from_pending(period, pending))
    }

    /// Apply every pending adjustment whose month has arrived
    ///
    /// Safe to call repeatedly and from concurrent sessions: each adjustment
    /// is applied at most once.
    pub fn auto_apply_due(&self, household_id: HouseholdId, today: NaiveDate) -> BudgetResult<ApplyReport> {
        let due = self
            .storage
            .adjustments
            .pending_due(household_id, YearMonth::from_date(today))?;
        if due.is_empty() {
            debug!(household_id = %household_id, "no adjustments due");
            return Ok(ApplyReport::default());
        }

        let _guard = self.storage.lifecycle_guard()?;
        let mut report = ApplyReport::default();
        let mut baseline_changed = false;

        for adjustment in due {
            let Some(claimed) = self.storage.adjustments.transition(
                adjustment.id,
                AdjustmentStatus::Pending,
                AdjustmentStatus::Applied,
            )?
            else {
                debug!(adjustment_id = %adjustment.id, "adjustment already claimed");
                continue;
            };

            if let Err(e) = self.write_snapshot(&claimed) {
                self.storage.adjustments.release_claim(claimed.id)?;
                warn!(
                    adjustment_id = %claimed.id,
                    effective = %claimed.effective_period(),
                    error = %e,
                    "skipped due adjustment; will retry on a later rollover"
                );
                report.skipped.push(SkippedAdjustment {
                    adjustment: claimed,
                    reason: e.to_string(),
                });
                continue;
            }

            if self.propagate_to_baseline {
                baseline_changed |= self.write_baseline(&claimed)?;
            }
            report.applied.push(claimed);
        }

        if report.applied.is_empty() {
            return Ok(report);
        }

        // The claims are persisted first; if the snapshots then fail to save,
        // release the claims so the on-disk state never shows an applied
        // adjustment without its snapshot change.
        self.storage.adjustments.save()?;
        if let Err(e) = self.storage.monthly_budgets.save() {
            for applied in &report.applied {
                self.storage.adjustments.release_claim(applied.id)?;
            }
            self.storage.adjustments.save()?;
            return Err(e);
        }
        if baseline_changed {
            self.storage.personal_budgets.save()?;
        }
        for applied in &report.applied {
            let kind = if applied.is_new_category {
                CategoryEventKind::Created
            } else {
                CategoryEventKind::LimitChanged
            };
            self.storage
                .category_history
                .append(household_id, kind, vec![applied.category_name.clone()])?;
        }
        self.storage.category_history.save()?;

        for applied in &report.applied {
            let before = ScheduledAdjustment {
                status: AdjustmentStatus::Pending,
                applied_at: None,
                ..applied.clone()
            };
            self.storage.log_update(
                EntityType::ScheduledAdjustment,
                applied.id.to_string(),
                Some(applied.category_name.clone()),
                &before,
                applied,
                None,
            )?;
            info!(
                adjustment_id = %applied.id,
                category = %applied.category_name,
                effective = %applied.effective_period(),
                new_limit = %applied.new_limit,
                "applied adjustment"
            );
        }

        Ok(report)
    }

    /// Write the new limit into the effective month's snapshot
    fn write_snapshot(&self, adjustment: &ScheduledAdjustment) -> BudgetResult<()> {
        let snapshot = MonthlyBudgetService::new(self.storage)
            .get_or_create(adjustment.household_id, adjustment.effective_period())?;

        self.storage.monthly_budgets.update_with(snapshot.id, |s| {
            if s.is_locked {
                return Err(BudgetError::Locked {
                    year: s.year,
                    month: s.month,
                });
            }
            s.write_limit(&adjustment.category_name, adjustment.new_limit, true);
            Ok(())
        })?;
        Ok(())
    }

    /// Carry the new limit into the active baseline so later months inherit it
    ///
    /// Returns false when there is no active baseline or nothing changed.
    fn write_baseline(&self, adjustment: &ScheduledAdjustment) -> BudgetResult<bool> {
        let Some(baseline) = self
            .storage
            .personal_budgets
            .get_active(adjustment.household_id)?
        else {
            return Ok(false);
        };

        let (changed, _) = self.storage.personal_budgets.update_with(baseline.id, |b| {
            match b.categories.get_mut(&adjustment.category_name) {
                Some(config) if config.monthly_limit == adjustment.new_limit => return Ok(false),
                Some(config) => config.monthly_limit = adjustment.new_limit,
                None => {
                    b.categories.insert(
                        adjustment.category_name.clone(),
                        CategoryConfig::new(adjustment.new_limit),
                    );
                    b.sync_active_names();
                }
            }
            b.touch();
            Ok(true)
        })?;
        Ok(changed)
    }
}
