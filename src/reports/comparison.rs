//! Budget comparison report
//!
//! Diffs a monthly snapshot's category limits against a baseline: either the
//! current personal budget or the snapshot's own as-created copy.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::models::{CategoryMap, Money, MonthlyBudget, PersonalBudget, YearMonth};

/// How a category differs between baseline and snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Increased,
    Decreased,
    Unchanged,
    /// Present in the snapshot only
    Added,
    /// Present in the baseline only
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Increased => "increased",
            Self::Decreased => "decreased",
            Self::Unchanged => "unchanged",
            Self::Added => "added",
            Self::Removed => "removed",
        };
        write!(f, "{}", label)
    }
}

/// One category's line in a comparison
#[derive(Debug, Clone, Serialize)]
pub struct CategoryComparison {
    pub category: String,
    pub baseline_limit: Money,
    pub monthly_limit: Money,
    /// `monthly_limit - baseline_limit`
    pub difference: Money,
    /// Difference as a percentage of the baseline; 0 when the baseline is 0
    pub percentage: f64,
    pub change: ChangeKind,
}

/// Comparison of a snapshot against a baseline
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub period: YearMonth,
    pub categories: Vec<CategoryComparison>,
    pub total_baseline: Money,
    pub total_monthly: Money,
    pub total_difference: Money,
    pub total_percentage: f64,
    pub increased: usize,
    pub decreased: usize,
    pub unchanged: usize,
    pub added: usize,
    pub removed: usize,
}

impl ComparisonReport {
    /// Categories whose limit differs in any way
    pub fn changed(&self) -> impl Iterator<Item = &CategoryComparison> {
        self.categories
            .iter()
            .filter(|c| c.change != ChangeKind::Unchanged)
    }

    pub fn has_changes(&self) -> bool {
        self.changed().next().is_some()
    }
}

/// Compare a monthly snapshot with a personal budget
pub fn compare(monthly: &MonthlyBudget, baseline: &PersonalBudget) -> ComparisonReport {
    diff(monthly.period(), &baseline.categories, &monthly.categories)
}

/// Compare a monthly snapshot with its own as-created limits
pub fn compare_to_original(monthly: &MonthlyBudget) -> ComparisonReport {
    diff(
        monthly.period(),
        &monthly.original_categories,
        &monthly.categories,
    )
}

fn diff(period: YearMonth, baseline: &CategoryMap, current: &CategoryMap) -> ComparisonReport {
    let names: BTreeSet<&String> = baseline.keys().chain(current.keys()).collect();

    let mut report = ComparisonReport {
        period,
        categories: Vec::with_capacity(names.len()),
        total_baseline: Money::zero(),
        total_monthly: Money::zero(),
        total_difference: Money::zero(),
        total_percentage: 0.0,
        increased: 0,
        decreased: 0,
        unchanged: 0,
        added: 0,
        removed: 0,
    };

    for name in names {
        let before = baseline.get(name).map(|c| c.monthly_limit);
        let after = current.get(name).map(|c| c.monthly_limit);

        let (baseline_limit, monthly_limit, change) = match (before, after) {
            (Some(b), Some(a)) if a > b => (b, a, ChangeKind::Increased),
            (Some(b), Some(a)) if a < b => (b, a, ChangeKind::Decreased),
            (Some(b), Some(a)) => (b, a, ChangeKind::Unchanged),
            (None, Some(a)) => (Money::zero(), a, ChangeKind::Added),
            (Some(b), None) => (b, Money::zero(), ChangeKind::Removed),
            (None, None) => continue,
        };

        match change {
            ChangeKind::Increased => report.increased += 1,
            ChangeKind::Decreased => report.decreased += 1,
            ChangeKind::Unchanged => report.unchanged += 1,
            ChangeKind::Added => report.added += 1,
            ChangeKind::Removed => report.removed += 1,
        }

        let difference = monthly_limit - baseline_limit;
        report.total_baseline += baseline_limit;
        report.total_monthly += monthly_limit;
        report.categories.push(CategoryComparison {
            category: name.clone(),
            baseline_limit,
            monthly_limit,
            difference,
            percentage: difference.percent_of(baseline_limit),
            change,
        });
    }

    report.total_difference = report.total_monthly - report.total_baseline;
    report.total_percentage = report.total_difference.percent_of(report.total_baseline);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryConfig, GlobalSettings, HouseholdId};

    fn baseline(entries: &[(&str, i64)]) -> PersonalBudget {
        let categories = entries
            .iter()
            .map(|(name, units)| (name.to_string(), CategoryConfig::new(Money::from_units(*units))))
            .collect();
        PersonalBudget::new(HouseholdId::new(), "Home", categories, GlobalSettings::default())
    }

    fn june() -> YearMonth {
        YearMonth::new(2025, 6).unwrap()
    }

    fn find<'r>(report: &'r ComparisonReport, name: &str) -> &'r CategoryComparison {
        report.categories.iter().find(|c| c.category == name).unwrap()
    }

    #[test]
    fn test_classifies_every_change() {
        let budget = baseline(&[("Groceries", 1500), ("Transport", 600), ("Dining", 300), ("Gym", 0)]);
        let mut monthly = MonthlyBudget::from_baseline(&budget, june());
        monthly.write_limit("Groceries", Money::from_units(1800), false);
        monthly.write_limit("Transport", Money::from_units(450), false);
        monthly.categories.remove("Dining");
        monthly.write_limit("Childcare", Money::from_units(400), true);
        monthly.write_limit("Gym", Money::from_units(50), false);

        let report = compare(&monthly, &budget);

        let groceries = find(&report, "Groceries");
        assert_eq!(groceries.change, ChangeKind::Increased);
        assert_eq!(groceries.difference, Money::from_units(300));
        assert!((groceries.percentage - 20.0).abs() < 1e-9);

        let transport = find(&report, "Transport");
        assert_eq!(transport.change, ChangeKind::Decreased);
        assert!((transport.percentage + 25.0).abs() < 1e-9);

        let dining = find(&report, "Dining");
        assert_eq!(dining.change, ChangeKind::Removed);
        assert!((dining.percentage + 100.0).abs() < 1e-9);

        let childcare = find(&report, "Childcare");
        assert_eq!(childcare.change, ChangeKind::Added);
        assert_eq!(childcare.percentage, 0.0);

        let gym = find(&report, "Gym");
        assert_eq!(gym.change, ChangeKind::Increased);
        assert_eq!(gym.percentage, 0.0);

        assert_eq!((report.increased, report.decreased, report.added, report.removed), (2, 1, 1, 1));
        assert_eq!(report.total_baseline, Money::from_units(2400));
        assert_eq!(report.total_monthly, Money::from_units(2700));
        assert_eq!(report.total_difference, Money::from_units(300));
    }

    #[test]
    fn test_fresh_snapshot_is_unchanged() {
        let budget = baseline(&[("Groceries", 1500), ("Transport", 600)]);
        let monthly = MonthlyBudget::from_baseline(&budget, june());

        let report = compare(&monthly, &budget);
        assert_eq!(report.unchanged, 2);
        assert!(!report.has_changes());
        assert_eq!(report.total_percentage, 0.0);
    }

    #[test]
    fn test_compare_to_original_ignores_later_baseline_edits() {
        let mut budget = baseline(&[("Groceries", 1500)]);
        let mut monthly = MonthlyBudget::from_baseline(&budget, june());
        monthly.write_limit("Groceries", Money::from_units(1650), false);
        budget
            .categories
            .insert("Groceries".into(), CategoryConfig::new(Money::from_units(1650)));

        assert!(!compare(&monthly, &budget).has_changes());

        let original = compare_to_original(&monthly);
        let groceries = find(&original, "Groceries");
        assert_eq!(groceries.baseline_limit, Money::from_units(1500));
        assert_eq!(groceries.change, ChangeKind::Increased);
        assert!((groceries.percentage - 10.0).abs() < 1e-9);
    }
}
