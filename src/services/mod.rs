//! Service layer for the budget engine
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, multi-repository operations, audit logging and
//! rollback.

pub mod adjustment;
pub mod alert;
pub mod category;
pub mod monthly_budget;
pub mod personal_budget;
pub mod report;
pub mod transaction;

pub use adjustment::{AdjustmentService, AdjustmentSummary, ApplyReport, SkippedAdjustment};
pub use alert::AlertService;
pub use category::{CategoryService, CategorySummary, NewCategory, RenameReport};
pub use monthly_budget::MonthlyBudgetService;
pub use personal_budget::{
    BudgetPatch, CreateBudgetInput, PersonalBudgetService, ResetOptions, ResetReport,
};
pub use report::ReportService;
pub use transaction::{NewTransaction, TransactionFilter, TransactionService};
