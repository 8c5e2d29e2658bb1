//! Reports module
//!
//! Pure, read-only analyses over snapshots, baselines and transactions:
//! limit comparisons and budget-vs-actual performance with alerts.

pub mod comparison;
pub mod performance;

pub use comparison::{compare, compare_to_original, CategoryComparison, ChangeKind, ComparisonReport};
pub use performance::{
    analyze_performance, status_for, Alert, AlertKind, AlertSeverity, CategoryPerformance,
    PerformanceReport, PerformanceStatus,
};
