//! Category display formatting
//!
//! Category lists with usage, the lifecycle history and merge records.

use crate::models::{CategoryEvent, CategoryMergeRecord};
use crate::services::CategorySummary;

use super::{money, separator};

/// Format the active budget's categories with transaction counts
pub fn format_category_list(categories: &[CategorySummary], symbol: &str) -> String {
    if categories.is_empty() {
        return "No categories found.\n\nCreate and activate a budget first.\n".to_string();
    }

    let name_width = categories
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(8)
        .max(8);
    let mut output = format!(
        "  {:name_width$}  {:>12}  {:>7}  {:>12}\n",
        "Category",
        "Limit",
        "Warn at",
        "Transactions",
        name_width = name_width
    );
    output.push_str(&format!("  {}\n", separator(name_width + 37)));

    for category in categories {
        output.push_str(&format!(
            "  {:name_width$}  {:>12}  {:>6}%  {:>12}{}\n",
            category.name,
            money(category.config.monthly_limit, symbol),
            category.config.warning_threshold,
            category.transaction_count,
            if category.config.is_active { "" } else { "  (deleted)" },
            name_width = name_width
        ));
    }
    output
}

/// Format the category history, oldest first
pub fn format_category_history(events: &[CategoryEvent]) -> String {
    if events.is_empty() {
        return "No category changes recorded.\n".to_string();
    }

    events
        .iter()
        .map(|event| {
            format!(
                "  {}  {}\n",
                event.created_at.format("%Y-%m-%d %H:%M"),
                event
            )
        })
        .collect()
}

/// Format merge records
pub fn format_merge_list(merges: &[CategoryMergeRecord]) -> String {
    if merges.is_empty() {
        return "No merges recorded.\n".to_string();
    }

    let mut output = String::new();
    for merge in merges {
        output.push_str(&format!(
            "  {}  {} -> {}  ({} transactions){}\n",
            merge.id,
            merge.source_name,
            merge.target_name,
            merge.transaction_count(),
            if merge.is_undone() { "  [undone]" } else { "" }
        ));
        if !merge.reason.is_empty() {
            output.push_str(&format!("      {}\n", merge.reason));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryConfig, HouseholdId, Money};

    #[test]
    fn test_category_list() {
        let categories = vec![CategorySummary {
            name: "Groceries".into(),
            config: CategoryConfig::new(Money::from_units(1500)),
            transaction_count: 12,
        }];
        let output = format_category_list(&categories, "$");
        assert!(output.contains("Groceries"));
        assert!(output.contains("$1500.00"));
        assert!(output.contains("12"));
    }

    #[test]
    fn test_merge_list_marks_undone() {
        let mut merge = CategoryMergeRecord::new(HouseholdId::new(), "Dining", "Groceries", "eating in");
        merge.undone_at = Some(chrono::Utc::now());
        let output = format_merge_list(&[merge]);
        assert!(output.contains("Dining -> Groceries"));
        assert!(output.contains("[undone]"));
        assert!(output.contains("eating in"));
    }
}
