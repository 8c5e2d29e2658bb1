//! Custom error types for the household budget engine
//!
//! This module defines the error hierarchy for the engine using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for budget engine operations
#[derive(Error, Debug)]
pub enum BudgetError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for input (empty, negative, out of range)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Operation conflicts with the current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The monthly budget is locked against edits
    #[error("Monthly budget {year}-{month:02} is locked")]
    Locked { year: i32, month: u32 },

    /// A multi-step operation failed part way and was rolled back
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BudgetError {
    /// Create a "not found" error for personal budgets
    pub fn budget_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Personal budget",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for monthly budgets
    pub fn monthly_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Monthly budget",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for scheduled adjustments
    pub fn adjustment_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Scheduled adjustment",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for merge records
    pub fn merge_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category merge",
            identifier: identifier.into(),
        }
    }

    /// Raised when an operation needs an active budget and the household has none
    pub fn no_active_budget(household: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Active budget",
            identifier: household.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error (including duplicate input)
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Duplicate { .. })
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Check if this is a locked-state error
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }

    /// Check if this is a consistency error
    pub fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency(_))
    }
}

impl From<std::io::Error> for BudgetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BudgetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for budget engine operations
pub type BudgetResult<T> = Result<T, BudgetError>;
