//! Budget display formatting
//!
//! Personal budgets and monthly snapshots as lists and detail views.

use crate::models::{CategoryMap, MonthlyBudget, PersonalBudget};

use super::{money, separator};

/// Format a household's personal budgets, marking the active one
pub fn format_budget_list(budgets: &[PersonalBudget], symbol: &str) -> String {
    if budgets.is_empty() {
        return "No budgets found.\n\nRun 'hbudget budget create' to create one.\n".to_string();
    }

    let name_width = budgets.iter().map(|b| b.name.len()).max().unwrap_or(4).max(4);
    let mut output = format!(
        "  {:11}  {:name_width$}  {:>7}  {:>10}  {:>14}\n",
        "ID",
        "Name",
        "Version",
        "Categories",
        "Total limit",
        name_width = name_width
    );
    output.push_str(&format!("  {}\n", separator(name_width + 50)));

    for budget in budgets {
        let marker = if budget.is_active { "*" } else { " " };
        output.push_str(&format!(
            "{} {:11}  {:name_width$}  {:>7}  {:>10}  {:>14}\n",
            marker,
            budget.id.to_string(),
            budget.name,
            budget.version,
            budget.categories.len(),
            money(budget.total_active_limit(), symbol),
            name_width = name_width
        ));
    }
    output
}

/// Format one personal budget with its categories
pub fn format_budget_details(budget: &PersonalBudget, symbol: &str) -> String {
    let mut output = format!("Budget: {}\n", budget.name);
    output.push_str(&format!("  ID:       {}\n", budget.id));
    output.push_str(&format!("  Version:  {}\n", budget.version));
    output.push_str(&format!(
        "  Status:   {}\n",
        if budget.is_active { "active" } else { "inactive" }
    ));
    output.push_str(&format!("  Currency: {}\n", budget.global_settings.currency));
    if !budget.notes.is_empty() {
        output.push_str(&format!("  Notes:    {}\n", budget.notes));
    }
    output.push('\n');
    output.push_str(&format_categories(&budget.categories, symbol));
    output.push_str(&format!(
        "\n  Total active limit: {}\n",
        money(budget.total_active_limit(), symbol)
    ));
    output
}

/// Format a monthly snapshot with its categories
pub fn format_monthly_details(snapshot: &MonthlyBudget, symbol: &str) -> String {
    let mut output = format!("Monthly budget {}", snapshot.period());
    if snapshot.is_locked {
        output.push_str(" [locked]");
    }
    output.push('\n');
    output.push_str(&format!("  ID:          {}\n", snapshot.id));
    output.push_str(&format!(
        "  Source:      {} (v{})\n",
        snapshot
            .source_budget_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".into()),
        snapshot.source_budget_version
    ));
    output.push_str(&format!("  Adjustments: {}\n\n", snapshot.adjustment_count));
    output.push_str(&format_categories(&snapshot.categories, symbol));
    output.push_str(&format!(
        "\n  Total active limit: {}\n",
        money(snapshot.total_active_limit(), symbol)
    ));
    output
}

/// Format a household's snapshots, one line per month
pub fn format_monthly_list(snapshots: &[MonthlyBudget], symbol: &str) -> String {
    if snapshots.is_empty() {
        return "No monthly budgets yet.\n".to_string();
    }

    let mut output = String::new();
    for snapshot in snapshots {
        output.push_str(&format!(
            "  {}  {:>14}  {:>3} adjustments{}\n",
            snapshot.period(),
            money(snapshot.total_active_limit(), symbol),
            snapshot.adjustment_count,
            if snapshot.is_locked { "  [locked]" } else { "" }
        ));
    }
    output
}

fn format_categories(categories: &CategoryMap, symbol: &str) -> String {
    let name_width = categories.keys().map(|n| n.len()).max().unwrap_or(8).max(8);
    let mut output = format!(
        "  {:name_width$}  {:>12}  {:>7}\n",
        "Category",
        "Limit",
        "Warn at",
        name_width = name_width
    );
    output.push_str(&format!("  {}\n", separator(name_width + 23)));
    for (name, config) in categories {
        output.push_str(&format!(
            "  {:name_width$}  {:>12}  {:>6}%{}\n",
            name,
            money(config.monthly_limit, symbol),
            config.warning_threshold,
            if config.is_active { "" } else { "  (deleted)" },
            name_width = name_width
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryConfig, GlobalSettings, HouseholdId, Money, YearMonth};

    fn budget() -> PersonalBudget {
        let mut categories = CategoryMap::new();
        categories.insert("Groceries".into(), CategoryConfig::new(Money::from_units(1500)));
        let mut dining = CategoryConfig::new(Money::from_units(300));
        dining.is_active = false;
        categories.insert("Dining".into(), dining);
        PersonalBudget::new(HouseholdId::new(), "Home", categories, GlobalSettings::default())
    }

    #[test]
    fn test_budget_details() {
        let output = format_budget_details(&budget(), "$");
        assert!(output.contains("Budget: Home"));
        assert!(output.contains("$1500.00"));
        assert!(output.contains("(deleted)"));
        assert!(output.contains("Total active limit: $1500.00"));
    }

    #[test]
    fn test_empty_budget_list() {
        assert!(format_budget_list(&[], "$").contains("No budgets found"));
    }

    #[test]
    fn test_monthly_details_shows_lock() {
        let mut snapshot = MonthlyBudget::from_baseline(&budget(), YearMonth::new(2025, 6).unwrap());
        snapshot.set_locked(true);
        let output = format_monthly_details(&snapshot, "$");
        assert!(output.starts_with("Monthly budget 2025-06 [locked]"));
    }
}
