//! Core data models for the budget engine
//!
//! This module contains the data structures of the budgeting domain:
//! baseline budgets, monthly snapshots, scheduled adjustments, category
//! history, merges and transactions.

pub mod adjustment;
pub mod alert;
pub mod budget;
pub mod category;
pub mod ids;
pub mod merge;
pub mod money;
pub mod monthly;
pub mod period;
pub mod transaction;

pub use adjustment::{AdjustmentKind, AdjustmentStatus, ScheduledAdjustment};
pub use alert::AlertView;
pub use budget::{ActiveBudget, GlobalSettings, PersonalBudget};
pub use category::{CategoryConfig, CategoryEvent, CategoryEventKind, CategoryMap};
pub use ids::{
    AdjustmentId, AlertId, CategoryEventId, HouseholdId, MergeId, MonthlyBudgetId,
    PersonalBudgetId, TransactionId, UserId,
};
pub use merge::CategoryMergeRecord;
pub use money::Money;
pub use monthly::MonthlyBudget;
pub use period::YearMonth;
pub use transaction::{Transaction, TransactionType};
