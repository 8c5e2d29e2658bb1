//! Alert view service
//!
//! Alerts themselves are recomputed on every analysis. This service only
//! remembers which of them a user has already seen.

use tracing::info;

use crate::config::HouseholdContext;
use crate::error::BudgetResult;
use crate::models::{AlertId, AlertView, HouseholdId};
use crate::reports::Alert;
use crate::storage::Storage;

pub struct AlertService<'a> {
    storage: &'a Storage,
}

impl<'a> AlertService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record that the context's user viewed an alert
    ///
    /// Returns false if it was already marked; the first view is kept.
    pub fn mark_viewed(&self, ctx: &HouseholdContext, alert_id: AlertId) -> BudgetResult<bool> {
        let view = AlertView::new(ctx.household_id, alert_id, ctx.user_id);
        let first = self.storage.alert_views.mark_viewed(view)?;
        if first {
            self.storage.alert_views.save()?;
            info!(household_id = %ctx.household_id, alert_id = %alert_id, "marked alert viewed");
        }
        Ok(first)
    }

    pub fn is_viewed(&self, household_id: HouseholdId, alert_id: AlertId) -> BudgetResult<bool> {
        self.storage.alert_views.is_viewed(household_id, alert_id)
    }

    /// Set `viewed` on freshly computed alerts
    pub fn annotate(&self, household_id: HouseholdId, alerts: &mut [Alert]) -> BudgetResult<()> {
        for alert in alerts.iter_mut() {
            alert.viewed = self.is_viewed(household_id, alert.id)?;
        }
        Ok(())
    }
}
