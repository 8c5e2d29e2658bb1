//! Household and user context
//!
//! Authentication lives outside the engine; every operation simply runs for
//! a known household and (optionally) a known user.

use crate::error::{BudgetError, BudgetResult};
use crate::models::{HouseholdId, UserId};

use super::settings::Settings;

/// The household and user an operation acts for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HouseholdContext {
    pub household_id: HouseholdId,
    pub user_id: Option<UserId>,
}

impl HouseholdContext {
    pub fn new(household_id: HouseholdId, user_id: Option<UserId>) -> Self {
        Self {
            household_id,
            user_id,
        }
    }

    /// Build the context from settings, optionally overriding the household
    ///
    /// The override accepts a full UUID or the `hh-` display form of one.
    pub fn resolve(settings: &Settings, household_override: Option<&str>) -> BudgetResult<Self> {
        let household_id = match household_override {
            Some(raw) => raw.parse::<HouseholdId>().map_err(|_| {
                BudgetError::Config(format!("Invalid household id: {}", raw))
            })?,
            None => settings.household_id,
        };
        Ok(Self::new(household_id, Some(settings.user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_to_settings() {
        let settings = Settings::default();
        let ctx = HouseholdContext::resolve(&settings, None).unwrap();
        assert_eq!(ctx.household_id, settings.household_id);
        assert_eq!(ctx.user_id, Some(settings.user_id));
    }

    #[test]
    fn test_resolve_override() {
        let settings = Settings::default();
        let other = HouseholdId::new();
        let ctx = HouseholdContext::resolve(&settings, Some(&other.as_uuid().to_string())).unwrap();
        assert_eq!(ctx.household_id, other);

        assert!(HouseholdContext::resolve(&settings, Some("not-an-id")).is_err());
    }
}
