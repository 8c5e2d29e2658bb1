//! Budget performance report
//!
//! Budget-vs-actual for one month: per-category variance and status, income
//! and expense totals, and threshold alerts.
//!
//! Status and alerts are independent signals. A category at 95% of its limit
//! with an 80% warning threshold is "under" budget and still raises a
//! warning alert.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::models::{AlertId, CategoryMap, HouseholdId, Money, Transaction, YearMonth};

/// Spending relative to the limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PerformanceStatus {
    Under,
    OnTarget,
    Over,
}

impl fmt::Display for PerformanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Under => write!(f, "under"),
            Self::OnTarget => write!(f, "on target"),
            Self::Over => write!(f, "over"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Spending reached the warning threshold
    Warning,
    /// Spending passed the limit
    Exceeded,
}

impl AlertKind {
    fn key(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Exceeded => "exceeded",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Medium,
    High,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A threshold crossing for one category in one month
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: AlertId,
    pub category: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub percent_used: f64,
    pub message: String,
    /// Set by the caller from stored view records
    pub viewed: bool,
}

/// Spending at or above this share of the limit is critical
const CRITICAL_PERCENT: f64 = 150.0;

/// One active category's performance
#[derive(Debug, Clone, Serialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub budgeted: Money,
    pub actual: Money,
    /// `actual - budgeted`; positive means overspent
    pub variance: Money,
    pub percent_used: f64,
    pub warning_threshold: u8,
    pub status: PerformanceStatus,
}

/// Budget-vs-actual for one month
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub period: YearMonth,
    pub categories: Vec<CategoryPerformance>,
    pub total_budgeted: Money,
    pub total_actual: Money,
    pub total_variance: Money,
    /// All expenses in the month, including uncategorized or inactive ones
    pub total_expense: Money,
    pub total_income: Money,
    pub savings_rate: f64,
    pub income_expense_ratio: f64,
    pub alerts: Vec<Alert>,
}

impl PerformanceReport {
    pub fn unviewed_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| !a.viewed)
    }
}

/// Classify spending against a limit
///
/// The warning threshold sets the width of the on-target band: a threshold
/// of `t` percent tolerates `(100 - t) / 10` percent either side of the
/// limit, so 80% gives 98-102%. A zero limit is over as soon as anything is
/// spent.
pub fn status_for(budgeted: Money, actual: Money, warning_threshold: u8) -> PerformanceStatus {
    if budgeted.is_zero() {
        return if actual.is_positive() {
            PerformanceStatus::Over
        } else {
            PerformanceStatus::OnTarget
        };
    }
    let tolerance = f64::from(100 - warning_threshold.min(100)) / 10.0;
    let percent = actual.percent_of(budgeted);
    if percent < 100.0 - tolerance {
        PerformanceStatus::Under
    } else if percent > 100.0 + tolerance {
        PerformanceStatus::Over
    } else {
        PerformanceStatus::OnTarget
    }
}

/// Analyze one month of transactions against a category configuration
///
/// Transactions outside `period` are ignored. Only active categories get a
/// line, and only their expenses count towards `total_actual`.
pub fn analyze_performance(
    household_id: HouseholdId,
    period: YearMonth,
    categories: &CategoryMap,
    transactions: &[Transaction],
) -> PerformanceReport {
    let mut spent: HashMap<&str, Money> = HashMap::new();
    let mut total_expense = Money::zero();
    let mut total_income = Money::zero();

    for txn in transactions.iter().filter(|t| period.contains(t.date)) {
        if txn.is_income() {
            total_income += txn.amount;
        } else {
            total_expense += txn.amount;
            *spent.entry(txn.category_name.as_str()).or_default() += txn.amount;
        }
    }

    let mut lines = Vec::new();
    let mut alerts = Vec::new();
    for (name, config) in categories.iter().filter(|(_, c)| c.is_active) {
        let budgeted = config.monthly_limit;
        let actual = spent.get(name.as_str()).copied().unwrap_or_default();
        let percent_used = actual.percent_of(budgeted);

        if let Some(alert) = alert_for(household_id, period, name, budgeted, actual, config.warning_threshold) {
            alerts.push(alert);
        }
        lines.push(CategoryPerformance {
            category: name.clone(),
            budgeted,
            actual,
            variance: actual - budgeted,
            percent_used,
            warning_threshold: config.warning_threshold,
            status: status_for(budgeted, actual, config.warning_threshold),
        });
    }

    let total_budgeted: Money = lines.iter().map(|l| l.budgeted).sum();
    let total_actual: Money = lines.iter().map(|l| l.actual).sum();

    let savings_rate = if total_income.is_positive() {
        (total_income - total_expense).percent_of(total_income)
    } else {
        0.0
    };
    let income_expense_ratio = if total_expense.is_positive() {
        total_income.cents() as f64 / total_expense.cents() as f64
    } else {
        0.0
    };

    PerformanceReport {
        period,
        categories: lines,
        total_budgeted,
        total_actual,
        total_variance: total_actual - total_budgeted,
        total_expense,
        total_income,
        savings_rate,
        income_expense_ratio,
        alerts,
    }
}

/// The alert for one category, if any
///
/// Exceeded means strictly over the limit. Spending exactly the limit is a
/// warning, since nothing has been overspent yet.
fn alert_for(
    household_id: HouseholdId,
    period: YearMonth,
    category: &str,
    budgeted: Money,
    actual: Money,
    warning_threshold: u8,
) -> Option<Alert> {
    let percent_used = actual.percent_of(budgeted);

    let (kind, severity, message) = if budgeted.is_zero() {
        if !actual.is_positive() {
            return None;
        }
        (
            AlertKind::Exceeded,
            AlertSeverity::High,
            format!("{}: spent {} with no budget", category, actual),
        )
    } else if actual > budgeted {
        let severity = if percent_used >= CRITICAL_PERCENT {
            AlertSeverity::Critical
        } else {
            AlertSeverity::High
        };
        (
            AlertKind::Exceeded,
            severity,
            format!(
                "{}: over budget by {} ({:.0}% of {})",
                category,
                actual - budgeted,
                percent_used,
                budgeted
            ),
        )
    } else if actual.is_positive() && percent_used >= f64::from(warning_threshold) {
        (
            AlertKind::Warning,
            AlertSeverity::Medium,
            format!(
                "{}: {:.0}% of {} used (warning at {}%)",
                category, percent_used, budgeted, warning_threshold
            ),
        )
    } else {
        return None;
    };

    let key = format!("{}|{}|{}", category, period, kind.key());
    Some(Alert {
        id: AlertId::derive(household_id, &key),
        category: category.to_string(),
        kind,
        severity,
        percent_used,
        message,
        viewed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryConfig;
    use chrono::NaiveDate;

    fn june() -> YearMonth {
        YearMonth::new(2025, 6).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn categories(entries: &[(&str, i64, u8)]) -> CategoryMap {
        entries
            .iter()
            .map(|(name, units, threshold)| {
                (
                    name.to_string(),
                    CategoryConfig::new(Money::from_units(*units)).with_threshold(*threshold),
                )
            })
            .collect()
    }

    #[test]
    fn test_scenario_d_under_with_warning() {
        let household = HouseholdId::new();
        let config = categories(&[("Groceries", 1000, 80)]);
        let txns = vec![
            Transaction::expense(household, "Groceries", Money::from_units(600), day(3)),
            Transaction::expense(household, "Groceries", Money::from_units(350), day(20)),
        ];

        let report = analyze_performance(household, june(), &config, &txns);
        let groceries = &report.categories[0];
        assert_eq!(groceries.actual, Money::from_units(950));
        assert_eq!(groceries.variance, Money::from_units(-50));
        assert_eq!(groceries.status, PerformanceStatus::Under);

        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].kind, AlertKind::Warning);
        assert_eq!(report.alerts[0].severity, AlertSeverity::Medium);
    }

    #[test]
    fn test_status_band() {
        let limit = Money::from_units(1000);
        assert_eq!(status_for(limit, Money::from_units(979), 80), PerformanceStatus::Under);
        assert_eq!(status_for(limit, Money::from_units(980), 80), PerformanceStatus::OnTarget);
        assert_eq!(status_for(limit, Money::from_units(1020), 80), PerformanceStatus::OnTarget);
        assert_eq!(status_for(limit, Money::from_units(1021), 80), PerformanceStatus::Over);
        assert_eq!(status_for(limit, Money::from_units(1000), 100), PerformanceStatus::OnTarget);
        assert_eq!(status_for(limit, Money::from_cents(100_001), 100), PerformanceStatus::Over);
        assert_eq!(status_for(Money::zero(), Money::zero(), 80), PerformanceStatus::OnTarget);
        assert_eq!(status_for(Money::zero(), Money::from_units(1), 80), PerformanceStatus::Over);
    }

    #[test]
    fn test_exceeded_alerts_and_severity() {
        let household = HouseholdId::new();
        let config = categories(&[("Dining", 200, 80), ("Fun", 100, 80), ("Gifts", 0, 80)]);
        let txns = vec![
            Transaction::expense(household, "Dining", Money::from_units(250), day(1)),
            Transaction::expense(household, "Fun", Money::from_units(150), day(1)),
            Transaction::expense(household, "Gifts", Money::from_units(20), day(1)),
        ];

        let report = analyze_performance(household, june(), &config, &txns);
        let severity = |name: &str| {
            report
                .alerts
                .iter()
                .find(|a| a.category == name)
                .map(|a| (a.kind, a.severity))
        };
        assert_eq!(severity("Dining"), Some((AlertKind::Exceeded, AlertSeverity::High)));
        assert_eq!(severity("Fun"), Some((AlertKind::Exceeded, AlertSeverity::Critical)));
        assert_eq!(severity("Gifts"), Some((AlertKind::Exceeded, AlertSeverity::High)));
    }

    #[test]
    fn test_spending_exactly_the_limit_warns() {
        let household = HouseholdId::new();
        let config = categories(&[("Utilities", 300, 80)]);
        let txns = vec![Transaction::expense(household, "Utilities", Money::from_units(300), day(5))];

        let report = analyze_performance(household, june(), &config, &txns);
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].kind, AlertKind::Warning);
        assert_eq!(report.alerts[0].severity, AlertSeverity::Medium);

        let over = vec![Transaction::expense(household, "Utilities", Money::from_cents(30_001), day(5))];
        let report = analyze_performance(household, june(), &config, &over);
        assert_eq!(report.alerts[0].kind, AlertKind::Exceeded);
    }

    #[test]
    fn test_alert_ids_are_stable() {
        let household = HouseholdId::new();
        let config = categories(&[("Groceries", 100, 50)]);
        let txns = vec![Transaction::expense(household, "Groceries", Money::from_units(60), day(2))];

        let first = analyze_performance(household, june(), &config, &txns);
        let second = analyze_performance(household, june(), &config, &txns);
        assert_eq!(first.alerts[0].id, second.alerts[0].id);

        let july_txns = vec![Transaction::expense(
            household,
            "Groceries",
            Money::from_units(60),
            NaiveDate::from_ymd_opt(2025, 7, 2).unwrap(),
        )];
        let july = analyze_performance(household, june().next(), &config, &july_txns);
        assert_ne!(first.alerts[0].id, july.alerts[0].id);
    }

    #[test]
    fn test_totals_and_rates() {
        let household = HouseholdId::new();
        let mut config = categories(&[("Groceries", 1000, 80), ("Dining", 300, 80), ("Salary", 0, 80)]);
        if let Some(dining) = config.get_mut("Dining") {
            dining.is_active = false;
        }
        let txns = vec![
            Transaction::expense(household, "Groceries", Money::from_units(400), day(1)),
            Transaction::expense(household, "Dining", Money::from_units(100), day(2)),
            Transaction::income(household, "Salary", Money::from_units(2000), day(1)),
            Transaction::expense(
                household,
                "Groceries",
                Money::from_units(999),
                NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
            ),
        ];

        let report = analyze_performance(household, june(), &config, &txns);
        assert_eq!(report.categories.len(), 2);
        assert_eq!(report.total_budgeted, Money::from_units(1000));
        assert_eq!(report.total_actual, Money::from_units(400));
        assert_eq!(report.total_expense, Money::from_units(500));
        assert_eq!(report.total_income, Money::from_units(2000));
        assert!((report.savings_rate - 75.0).abs() < 1e-9);
        assert!((report.income_expense_ratio - 4.0).abs() < 1e-9);
        assert!(report.alerts.is_empty());
    }

    #[test]
    fn test_no_income_means_zero_rates() {
        let household = HouseholdId::new();
        let config = categories(&[("Groceries", 1000, 80)]);
        let report = analyze_performance(household, june(), &config, &[]);
        assert_eq!(report.savings_rate, 0.0);
        assert_eq!(report.income_expense_ratio, 0.0);
        assert_eq!(report.categories[0].status, PerformanceStatus::Under);
    }
}
