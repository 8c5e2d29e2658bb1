//! Strongly-typed ID wrappers for all entity types
//!
//! Using newtype wrappers prevents accidentally mixing up IDs from different
//! entity types at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Macro to generate ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse an ID from a string
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                s.parse()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, &self.0.to_string()[..8])
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(HouseholdId, "hh-");
define_id!(UserId, "usr-");
define_id!(PersonalBudgetId, "pb-");
define_id!(MonthlyBudgetId, "mb-");
define_id!(AdjustmentId, "adj-");
define_id!(MergeId, "mrg-");
define_id!(CategoryEventId, "evt-");
define_id!(TransactionId, "txn-");
define_id!(AlertId, "alr-");

impl AlertId {
    /// Derive a stable alert id from the facts that identify a threshold crossing
    ///
    /// The same household, category, month and crossing always produce the
    /// same id, so view records survive recomputation.
    pub fn derive(household_id: HouseholdId, key: &str) -> Self {
        let name = format!("{}|{}", household_id.as_uuid(), key);
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }
}

/// Resolve a full id or a displayed short id (`pb-1a2b3c4d`) against candidates
pub fn match_short_id<'a, T, I>(input: &str, candidates: I) -> Option<T>
where
    T: fmt::Display + FromStr + Copy + 'a,
    I: IntoIterator<Item = &'a T>,
{
    if let Ok(id) = input.parse::<T>() {
        return Some(id);
    }
    let input = input.trim().to_lowercase();
    let mut found = candidates
        .into_iter()
        .filter(|candidate| candidate.to_string() == input);
    match (found.next(), found.next()) {
        (Some(id), None) => Some(*id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = PersonalBudgetId::new();
        assert!(!id.as_uuid().is_nil());
    }

    #[test]
    fn test_id_display() {
        let id = PersonalBudgetId::new();
        let display = format!("{}", id);
        assert!(display.starts_with("pb-"));
        assert_eq!(display.len(), 11); // "pb-" + 8 chars
    }

    #[test]
    fn test_id_serialization() {
        let id = MonthlyBudgetId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: MonthlyBudgetId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_id_parse_with_prefix() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id = AdjustmentId::parse(&format!("adj-{}", uuid_str)).unwrap();
        assert_eq!(id.as_uuid().to_string(), uuid_str);
    }

    #[test]
    fn test_alert_id_is_deterministic() {
        let household = HouseholdId::new();
        let a = AlertId::derive(household, "Groceries|2025-06|warning");
        let b = AlertId::derive(household, "Groceries|2025-06|warning");
        let c = AlertId::derive(household, "Groceries|2025-06|exceeded");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let other = AlertId::derive(HouseholdId::new(), "Groceries|2025-06|warning");
        assert_ne!(a, other);
    }

    #[test]
    fn test_match_short_id() {
        let ids = vec![TransactionId::new(), TransactionId::new()];
        let short = ids[1].to_string();
        assert_eq!(match_short_id(&short, &ids), Some(ids[1]));
        assert_eq!(match_short_id("txn-zzzzzzzz", &ids), None);

        let full = ids[0].as_uuid().to_string();
        assert_eq!(match_short_id(&full, &ids), Some(ids[0]));
    }
}
