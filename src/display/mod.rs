//! Display formatting for terminal output
//!
//! Formatters return `String`s so the CLI decides where they go. Amounts are
//! printed with the configured currency symbol.

pub mod adjustment;
pub mod budget;
pub mod category;
pub mod report;
pub mod transaction;

pub use adjustment::{format_adjustment_list, format_apply_report, format_summary};
pub use budget::{format_budget_details, format_budget_list, format_monthly_details, format_monthly_list};
pub use category::{format_category_history, format_category_list, format_merge_list};
pub use report::{format_comparison, format_performance};
pub use transaction::format_transaction_list;

use crate::models::Money;

/// Format an amount with a currency symbol
pub fn money(amount: Money, symbol: &str) -> String {
    amount.format_with_symbol(symbol)
}

/// Format an amount with an explicit sign, for differences
pub fn signed_money(amount: Money, symbol: &str) -> String {
    if amount.is_positive() {
        format!("+{}", amount.format_with_symbol(symbol))
    } else {
        amount.format_with_symbol(symbol)
    }
}

/// Format a percentage with appropriate precision
pub fn format_percentage(pct: f64) -> String {
    let magnitude = pct.abs();
    if magnitude > 0.0 && magnitude < 0.1 {
        format!("{:.2}%", pct)
    } else if magnitude < 10.0 {
        format!("{:.1}%", pct)
    } else {
        format!("{:.0}%", pct)
    }
}

/// Format a separator line
pub fn separator(width: usize) -> String {
    "─".repeat(width)
}
