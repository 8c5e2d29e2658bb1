//! Report formatting for terminal output

use crate::reports::{AlertSeverity, ChangeKind, ComparisonReport, PerformanceReport, PerformanceStatus};

use super::{format_percentage, money, separator, signed_money};

/// Format a limit comparison
pub fn format_comparison(report: &ComparisonReport, title: &str, symbol: &str) -> String {
    let name_width = report
        .categories
        .iter()
        .map(|c| c.category.len())
        .max()
        .unwrap_or(8)
        .max(8);
    let mut output = format!("{} ({})\n", title, report.period);
    output.push_str(&format!(
        "  {:name_width$}  {:>12}  {:>12}  {:>13}  {:>7}  {}\n",
        "Category",
        "Baseline",
        "Month",
        "Difference",
        "%",
        "Change",
        name_width = name_width
    ));
    output.push_str(&format!("  {}\n", separator(name_width + 62)));

    for line in &report.categories {
        let marker = match line.change {
            ChangeKind::Unchanged => " ",
            _ => "*",
        };
        output.push_str(&format!(
            "{} {:name_width$}  {:>12}  {:>12}  {:>13}  {:>7}  {}\n",
            marker,
            line.category,
            money(line.baseline_limit, symbol),
            money(line.monthly_limit, symbol),
            signed_money(line.difference, symbol),
            format_percentage(line.percentage),
            line.change,
            name_width = name_width
        ));
    }

    output.push_str(&format!("  {}\n", separator(name_width + 62)));
    output.push_str(&format!(
        "  {:name_width$}  {:>12}  {:>12}  {:>13}  {:>7}\n",
        "Total",
        money(report.total_baseline, symbol),
        money(report.total_monthly, symbol),
        signed_money(report.total_difference, symbol),
        format_percentage(report.total_percentage),
        name_width = name_width
    ));
    output.push_str(&format!(
        "\n  {} increased, {} decreased, {} unchanged, {} added, {} removed\n",
        report.increased, report.decreased, report.unchanged, report.added, report.removed
    ));
    output
}

/// Format budget-vs-actual with alerts
pub fn format_performance(report: &PerformanceReport, symbol: &str) -> String {
    let name_width = report
        .categories
        .iter()
        .map(|c| c.category.len())
        .max()
        .unwrap_or(8)
        .max(8);
    let mut output = format!("Performance for {}\n", report.period);
    output.push_str(&format!(
        "  {:name_width$}  {:>12}  {:>12}  {:>13}  {:>6}  {}\n",
        "Category",
        "Budgeted",
        "Actual",
        "Variance",
        "Used",
        "Status",
        name_width = name_width
    ));
    output.push_str(&format!("  {}\n", separator(name_width + 61)));

    for line in &report.categories {
        let status = match line.status {
            PerformanceStatus::Over => format!("\x1b[31m{}\x1b[0m", line.status),
            _ => line.status.to_string(),
        };
        output.push_str(&format!(
            "  {:name_width$}  {:>12}  {:>12}  {:>13}  {:>6}  {}\n",
            line.category,
            money(line.budgeted, symbol),
            money(line.actual, symbol),
            signed_money(line.variance, symbol),
            format_percentage(line.percent_used),
            status,
            name_width = name_width
        ));
    }

    output.push_str(&format!("  {}\n", separator(name_width + 61)));
    output.push_str(&format!(
        "  {:name_width$}  {:>12}  {:>12}  {:>13}\n",
        "Total",
        money(report.total_budgeted, symbol),
        money(report.total_actual, symbol),
        signed_money(report.total_variance, symbol),
        name_width = name_width
    ));
    output.push('\n');
    output.push_str(&format!("  Income:        {}\n", money(report.total_income, symbol)));
    output.push_str(&format!("  Expenses:      {}\n", money(report.total_expense, symbol)));
    output.push_str(&format!("  Savings rate:  {}\n", format_percentage(report.savings_rate)));
    output.push_str(&format!("  Income/expense: {:.2}\n", report.income_expense_ratio));

    if !report.alerts.is_empty() {
        output.push_str("\nAlerts:\n");
        for alert in &report.alerts {
            let severity = match alert.severity {
                AlertSeverity::Critical => "!!!",
                AlertSeverity::High => "!! ",
                AlertSeverity::Medium => "!  ",
            };
            output.push_str(&format!(
                "  {} {}  {}{}\n",
                severity,
                alert.id,
                alert.message,
                if alert.viewed { "  (viewed)" } else { "" }
            ));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryConfig, CategoryMap, HouseholdId, Money, Transaction, YearMonth};
    use crate::reports::analyze_performance;
    use chrono::NaiveDate;

    #[test]
    fn test_performance_lists_alerts() {
        let household = HouseholdId::new();
        let june = YearMonth::new(2025, 6).unwrap();
        let mut categories = CategoryMap::new();
        categories.insert("Groceries".into(), CategoryConfig::new(Money::from_units(1000)));
        let txns = vec![Transaction::expense(
            household,
            "Groceries",
            Money::from_units(950),
            NaiveDate::from_ymd_opt(2025, 6, 9).unwrap(),
        )];

        let report = analyze_performance(household, june, &categories, &txns);
        let output = format_performance(&report, "$");
        assert!(output.starts_with("Performance for 2025-06"));
        assert!(output.contains("under"));
        assert!(output.contains("Alerts:"));
        assert!(output.contains("95% of $1000.00 used"));
    }
}
