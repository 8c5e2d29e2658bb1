//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod adjust;
pub mod audit;
pub mod budget;
pub mod category;
pub mod month;
pub mod report;
pub mod transaction;

pub use adjust::{handle_adjust_command, AdjustCommands};
pub use audit::handle_audit_command;
pub use budget::{handle_budget_command, BudgetCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use month::{handle_month_command, MonthCommands};
pub use report::{handle_report_command, ReportCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};

use chrono::NaiveDate;

use crate::config::{HouseholdContext, Settings};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{CategoryConfig, Money, YearMonth};
use crate::storage::Storage;

/// Everything a command handler needs
pub struct CommandContext<'a> {
    pub storage: &'a Storage,
    pub settings: &'a Settings,
    pub household: HouseholdContext,
    /// The date treated as "now" for scheduling and rollover
    pub today: NaiveDate,
}

impl CommandContext<'_> {
    pub fn symbol(&self) -> &str {
        &self.settings.currency_symbol
    }

    /// The month given on the command line, or the current one
    pub fn period_or_current(&self, period: Option<&str>) -> BudgetResult<YearMonth> {
        match period {
            Some(raw) => parse_period(raw),
            None => Ok(YearMonth::from_date(self.today)),
        }
    }
}

pub fn parse_money(raw: &str) -> BudgetResult<Money> {
    Money::parse(raw).map_err(|e| BudgetError::Validation(format!("Invalid amount: {}", e)))
}

pub fn parse_period(raw: &str) -> BudgetResult<YearMonth> {
    YearMonth::parse(raw).map_err(|e| BudgetError::Validation(format!("Invalid month: {}", e)))
}

pub fn parse_date(raw: &str) -> BudgetResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| BudgetError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

/// Parse a `Name=limit` or `Name=limit@threshold` category spec
pub fn parse_category_spec(raw: &str, default_threshold: u8) -> BudgetResult<(String, CategoryConfig)> {
    let (name, rest) = raw.split_once('=').ok_or_else(|| {
        BudgetError::Validation(format!(
            "Invalid category '{}', expected NAME=LIMIT or NAME=LIMIT@THRESHOLD",
            raw
        ))
    })?;
    let (limit, threshold) = match rest.split_once('@') {
        Some((limit, threshold)) => {
            let threshold = threshold.trim().trim_end_matches('%').parse::<u8>().map_err(|_| {
                BudgetError::Validation(format!("Invalid warning threshold '{}'", threshold))
            })?;
            (limit, threshold)
        }
        None => (rest, default_threshold),
    };
    let config = CategoryConfig::new(parse_money(limit)?).with_threshold(threshold);
    Ok((name.trim().to_string(), config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_spec() {
        let (name, config) = parse_category_spec("Groceries=1500", 80).unwrap();
        assert_eq!(name, "Groceries");
        assert_eq!(config.monthly_limit, Money::from_units(1500));
        assert_eq!(config.warning_threshold, 80);

        let (_, config) = parse_category_spec(" Dining = 300.50@70% ", 80).unwrap();
        assert_eq!(config.monthly_limit, Money::from_cents(30050));
        assert_eq!(config.warning_threshold, 70);

        assert!(parse_category_spec("Groceries", 80).is_err());
        assert!(parse_category_spec("Groceries=abc", 80).is_err());
        assert!(parse_category_spec("Groceries=10@x", 80).is_err());
    }

    #[test]
    fn test_parse_date_and_period() {
        assert_eq!(
            parse_date("2025-06-01").unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        assert!(parse_date("06/01/2025").is_err());
        assert_eq!(parse_period("2025-06").unwrap(), YearMonth::new(2025, 6).unwrap());
        assert!(parse_period("2025-13").unwrap_err().is_validation());
    }
}
