//! Scheduled adjustment display formatting

use crate::models::ScheduledAdjustment;
use crate::services::{AdjustmentSummary, ApplyReport};

use super::{money, signed_money};

/// Format scheduled adjustments, one per line
pub fn format_adjustment_list(adjustments: &[ScheduledAdjustment], symbol: &str) -> String {
    if adjustments.is_empty() {
        return "No scheduled adjustments.\n".to_string();
    }

    let name_width = adjustments
        .iter()
        .map(|a| a.category_name.len())
        .max()
        .unwrap_or(8)
        .max(8);
    let mut output = String::new();
    for adjustment in adjustments {
        output.push_str(&format_line(adjustment, name_width, symbol));
    }
    output
}

fn format_line(adjustment: &ScheduledAdjustment, name_width: usize, symbol: &str) -> String {
    let mut line = format!(
        "  {:12}  {}  {:name_width$}  {:>12} -> {:>12}  {:9}",
        adjustment.id.to_string(),
        adjustment.effective_period(),
        adjustment.category_name,
        money(adjustment.current_limit, symbol),
        money(adjustment.new_limit, symbol),
        adjustment.status.to_string(),
        name_width = name_width
    );
    if adjustment.is_new_category {
        line.push_str("  (new category)");
    }
    if !adjustment.reason.is_empty() {
        line.push_str(&format!("  \"{}\"", adjustment.reason));
    }
    line.push('\n');
    line
}

/// Format the pending changes for next month
pub fn format_summary(summary: &AdjustmentSummary, symbol: &str) -> String {
    let mut output = format!("Adjustments for {}\n", summary.period);
    if summary.adjustment_count == 0 {
        output.push_str("  None scheduled.\n");
        return output;
    }
    output.push_str(&format_adjustment_list(&summary.adjustments, symbol));
    output.push('\n');
    output.push_str(&format!("  Count:          {}\n", summary.adjustment_count));
    output.push_str(&format!("  Total increase: {}\n", money(summary.total_increase, symbol)));
    output.push_str(&format!("  Total decrease: {}\n", money(summary.total_decrease, symbol)));
    output.push_str(&format!("  Net change:     {}\n", signed_money(summary.net_change, symbol)));
    output
}

/// Format the outcome of applying due adjustments
pub fn format_apply_report(report: &ApplyReport, symbol: &str) -> String {
    if report.is_empty() {
        return "No adjustments due.\n".to_string();
    }
    let mut output = String::new();
    for applied in &report.applied {
        output.push_str(&format!(
            "Applied: {} -> {} for {}\n",
            applied.category_name,
            money(applied.new_limit, symbol),
            applied.effective_period()
        ));
    }
    for skipped in &report.skipped {
        output.push_str(&format!(
            "Skipped: {} for {} ({})\n",
            skipped.adjustment.category_name,
            skipped.adjustment.effective_period(),
            skipped.reason
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HouseholdId, Money, YearMonth};

    #[test]
    fn test_summary_totals() {
        let june = YearMonth::new(2025, 6).unwrap();
        let adjustment = ScheduledAdjustment::new(
            HouseholdId::new(),
            "Groceries",
            Money::from_units(1500),
            Money::from_units(1800),
            june,
            "inflation",
        );
        let summary = AdjustmentSummary {
            period: june,
            adjustment_count: 1,
            total_increase: Money::from_units(300),
            total_decrease: Money::zero(),
            net_change: Money::from_units(300),
            adjustments: vec![adjustment],
        };

        let output = format_summary(&summary, "$");
        assert!(output.starts_with("Adjustments for 2025-06"));
        assert!(output.contains("Net change:     +$300.00"));
        assert!(output.contains("\"inflation\""));
    }

    #[test]
    fn test_empty_apply_report() {
        assert_eq!(format_apply_report(&ApplyReport::default(), "$"), "No adjustments due.\n");
    }
}
