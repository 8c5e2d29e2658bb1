//! Scheduled adjustment model
//!
//! A scheduled adjustment is a category-limit change that takes effect at the
//! start of a future month. It moves from pending to applied when the month
//! rolls over, or from pending to cancelled on request.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AdjustmentId, HouseholdId};
use super::money::Money;
use super::period::YearMonth;

/// Direction of a limit change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    Increase,
    Decrease,
}

impl AdjustmentKind {
    /// Derive the kind from the sign of `new - current`; None if unchanged
    pub fn between(current: Money, new: Money) -> Option<Self> {
        match new.cmp(&current) {
            std::cmp::Ordering::Greater => Some(Self::Increase),
            std::cmp::Ordering::Less => Some(Self::Decrease),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increase => write!(f, "increase"),
            Self::Decrease => write!(f, "decrease"),
        }
    }
}

/// Lifecycle status of an adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentStatus {
    #[default]
    Pending,
    Applied,
    Cancelled,
}

impl AdjustmentStatus {
    /// The only legal transitions are pending -> applied and pending -> cancelled
    pub fn can_transition_to(&self, next: AdjustmentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Applied) | (Self::Pending, Self::Cancelled)
        )
    }
}

impl fmt::Display for AdjustmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Applied => write!(f, "applied"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A category-limit change scheduled for a future month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledAdjustment {
    pub id: AdjustmentId,
    pub household_id: HouseholdId,
    pub category_name: String,
    pub current_limit: Money,
    pub new_limit: Money,
    pub kind: AdjustmentKind,

    #[serde(default)]
    pub reason: String,

    pub effective_year: i32,
    pub effective_month: u32,

    #[serde(default)]
    pub status: AdjustmentStatus,

    /// Category did not exist in the baseline when this was scheduled
    #[serde(default)]
    pub is_new_category: bool,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl ScheduledAdjustment {
    /// Build a pending adjustment; use [`ScheduledAdjustment::validate`] before storing it
    pub fn new(
        household_id: HouseholdId,
        category_name: impl Into<String>,
        current_limit: Money,
        new_limit: Money,
        effective: YearMonth,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: AdjustmentId::new(),
            household_id,
            category_name: category_name.into(),
            current_limit,
            new_limit,
            kind: AdjustmentKind::between(current_limit, new_limit)
                .unwrap_or(AdjustmentKind::Increase),
            reason: reason.into(),
            effective_year: effective.year,
            effective_month: effective.month,
            status: AdjustmentStatus::Pending,
            is_new_category: false,
            created_at: Utc::now(),
            applied_at: None,
            cancelled_at: None,
        }
    }

    pub fn effective_period(&self) -> YearMonth {
        YearMonth {
            year: self.effective_year,
            month: self.effective_month,
        }
    }

    /// Signed change (`new - current`)
    pub fn delta(&self) -> Money {
        self.new_limit - self.current_limit
    }

    pub fn is_pending(&self) -> bool {
        self.status == AdjustmentStatus::Pending
    }

    /// Due once `today` is in or after the effective month
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.is_pending() && self.effective_period() <= YearMonth::from_date(today)
    }

    /// Validate against the date the adjustment is scheduled on
    pub fn validate(&self, scheduled_on: NaiveDate) -> Result<(), AdjustmentValidationError> {
        if self.category_name.trim().is_empty() {
            return Err(AdjustmentValidationError::EmptyCategory);
        }
        if self.new_limit.is_negative() {
            return Err(AdjustmentValidationError::NegativeLimit);
        }
        if AdjustmentKind::between(self.current_limit, self.new_limit).is_none() {
            return Err(AdjustmentValidationError::NoChange);
        }
        let current = YearMonth::from_date(scheduled_on);
        if self.effective_period() <= current {
            return Err(AdjustmentValidationError::NotInFuture {
                effective: self.effective_period(),
                current,
            });
        }
        Ok(())
    }
}

impl fmt::Display for ScheduledAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} ({}) effective {} [{}]",
            self.category_name,
            self.current_limit,
            self.new_limit,
            self.kind,
            self.effective_period(),
            self.status
        )
    }
}

/// Validation errors for scheduled adjustments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjustmentValidationError {
    EmptyCategory,
    NegativeLimit,
    NoChange,
    NotInFuture {
        effective: YearMonth,
        current: YearMonth,
    },
}

impl fmt::Display for AdjustmentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCategory => write!(f, "Category name cannot be empty"),
            Self::NegativeLimit => write!(f, "New limit cannot be negative"),
            Self::NoChange => write!(f, "New limit equals the current limit"),
            Self::NotInFuture { effective, current } => write!(
                f,
                "Effective month {} must be after the current month {}",
                effective, current
            ),
        }
    }
}

impl std::error::Error for AdjustmentValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn may_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 15).unwrap()
    }

    fn june() -> YearMonth {
        YearMonth::new(2025, 6).unwrap()
    }

    #[test]
    fn test_kind_from_sign() {
        let adj = ScheduledAdjustment::new(
            HouseholdId::new(),
            "Groceries",
            Money::from_units(1500),
            Money::from_units(1800),
            june(),
            "inflation",
        );
        assert_eq!(adj.kind, AdjustmentKind::Increase);
        assert_eq!(adj.delta(), Money::from_units(300));

        let adj = ScheduledAdjustment::new(
            HouseholdId::new(),
            "Groceries",
            Money::from_units(1500),
            Money::from_units(1200),
            june(),
            "",
        );
        assert_eq!(adj.kind, AdjustmentKind::Decrease);
    }

    #[test]
    fn test_validate_rejects_current_month() {
        let adj = ScheduledAdjustment::new(
            HouseholdId::new(),
            "Groceries",
            Money::from_units(1500),
            Money::from_units(1800),
            YearMonth::new(2025, 5).unwrap(),
            "",
        );
        assert!(matches!(
            adj.validate(may_15()),
            Err(AdjustmentValidationError::NotInFuture { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_and_unchanged() {
        let negative = ScheduledAdjustment::new(
            HouseholdId::new(),
            "Groceries",
            Money::from_units(1500),
            Money::from_units(-1),
            june(),
            "",
        );
        assert_eq!(
            negative.validate(may_15()),
            Err(AdjustmentValidationError::NegativeLimit)
        );

        let unchanged = ScheduledAdjustment::new(
            HouseholdId::new(),
            "Groceries",
            Money::from_units(1500),
            Money::from_units(1500),
            june(),
            "",
        );
        assert_eq!(
            unchanged.validate(may_15()),
            Err(AdjustmentValidationError::NoChange)
        );
    }

    #[test]
    fn test_is_due() {
        let adj = ScheduledAdjustment::new(
            HouseholdId::new(),
            "Groceries",
            Money::from_units(1500),
            Money::from_units(1800),
            june(),
            "",
        );
        assert!(!adj.is_due(may_15()));
        assert!(adj.is_due(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()));
        assert!(adj.is_due(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()));
    }

    #[test]
    fn test_status_transitions() {
        use AdjustmentStatus::*;
        assert!(Pending.can_transition_to(Applied));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Applied.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Applied));
        assert!(!Applied.can_transition_to(Cancelled));
    }
}
