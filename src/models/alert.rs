//! Alert view records
//!
//! Alerts are recomputed on every analysis; only the fact that a user has
//! seen one is stored, keyed by its deterministic id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AlertId, HouseholdId, UserId};

/// A "mark as viewed" record for a budget alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertView {
    pub household_id: HouseholdId,
    pub alert_id: AlertId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewed_by: Option<UserId>,

    pub viewed_at: DateTime<Utc>,
}

impl AlertView {
    pub fn new(household_id: HouseholdId, alert_id: AlertId, viewed_by: Option<UserId>) -> Self {
        Self {
            household_id,
            alert_id,
            viewed_by,
            viewed_at: Utc::now(),
        }
    }
}
