//! Category configuration and history models
//!
//! A category is a named spending bucket within a household. Its definition
//! (limit, warning threshold, color) lives in the budget category maps, keyed
//! by name. Lifecycle operations are recorded as [`CategoryEvent`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ids::{CategoryEventId, HouseholdId};
use super::money::Money;

/// Maximum category name length
pub const MAX_CATEGORY_NAME_LEN: usize = 50;

/// Default warning threshold percentage for new categories
pub const DEFAULT_WARNING_THRESHOLD: u8 = 80;

/// Category definitions keyed by name
pub type CategoryMap = BTreeMap<String, CategoryConfig>;

/// Configuration of one category inside a budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Spending limit per month
    pub monthly_limit: Money,

    /// Percentage of the limit at which a warning is raised (0-100)
    #[serde(default = "default_threshold")]
    pub warning_threshold: u8,

    /// Soft-deleted categories stay in the map with this set to false
    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub color: String,

    #[serde(default)]
    pub description: String,
}

fn default_threshold() -> u8 {
    DEFAULT_WARNING_THRESHOLD
}

fn default_true() -> bool {
    true
}

impl CategoryConfig {
    /// Create an active category with the default threshold
    pub fn new(monthly_limit: Money) -> Self {
        Self {
            monthly_limit,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            is_active: true,
            color: String::new(),
            description: String::new(),
        }
    }

    pub fn with_threshold(mut self, warning_threshold: u8) -> Self {
        self.warning_threshold = warning_threshold;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Validate limit and threshold
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        if self.monthly_limit.is_negative() {
            return Err(CategoryValidationError::NegativeLimit);
        }
        if self.warning_threshold > 100 {
            return Err(CategoryValidationError::ThresholdOutOfRange(
                self.warning_threshold,
            ));
        }
        Ok(())
    }
}

/// Validate a category name
pub fn validate_category_name(name: &str) -> Result<(), CategoryValidationError> {
    if name.trim().is_empty() {
        return Err(CategoryValidationError::EmptyName);
    }
    if name.len() > MAX_CATEGORY_NAME_LEN {
        return Err(CategoryValidationError::NameTooLong(name.len()));
    }
    Ok(())
}

/// Validate a whole category map (names and configs)
pub fn validate_category_map(categories: &CategoryMap) -> Result<(), CategoryValidationError> {
    for (name, config) in categories {
        validate_category_name(name)?;
        config.validate()?;
    }
    Ok(())
}

/// Case-insensitive category name comparison
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Validation errors for categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooLong(usize),
    NegativeLimit,
    ThresholdOutOfRange(u8),
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Category name cannot be empty"),
            Self::NameTooLong(len) => write!(
                f,
                "Category name too long ({} chars, max {})",
                len, MAX_CATEGORY_NAME_LEN
            ),
            Self::NegativeLimit => write!(f, "Monthly limit cannot be negative"),
            Self::ThresholdOutOfRange(t) => {
                write!(f, "Warning threshold must be between 0 and 100, got {}", t)
            }
        }
    }
}

impl std::error::Error for CategoryValidationError {}

/// Kind of category lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryEventKind {
    Created,
    Renamed,
    Merged,
    MergeUndone,
    Deleted,
    Restored,
    /// A limit or threshold changed in a baseline or snapshot
    LimitChanged,
}

impl fmt::Display for CategoryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Renamed => "renamed",
            Self::Merged => "merged",
            Self::MergeUndone => "merge undone",
            Self::Deleted => "deleted",
            Self::Restored => "restored",
            Self::LimitChanged => "limit changed",
        };
        write!(f, "{}", label)
    }
}

/// One entry in a household's category history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEvent {
    pub id: CategoryEventId,
    pub household_id: HouseholdId,

    /// Monotonic position within the household's history (starts at 1)
    pub sequence: u64,

    pub kind: CategoryEventKind,

    /// Every category name the operation touched
    pub names: Vec<String>,

    pub created_at: DateTime<Utc>,
}

impl CategoryEvent {
    /// Whether this event touched the named category (case-insensitive)
    pub fn touches(&self, name: &str) -> bool {
        self.names.iter().any(|n| same_name(n, name))
    }
}

impl fmt::Display for CategoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {}",
            self.sequence,
            self.kind,
            self.names.join(" -> ")
        )
    }
}
