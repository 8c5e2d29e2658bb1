//! Report CLI commands

use clap::Subcommand;
use serde::Serialize;

use crate::display::{format_comparison, format_performance};
use crate::error::BudgetResult;
use crate::services::ReportService;

use super::CommandContext;

/// Report subcommands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// Compare a month's limits with the active budget
    Compare {
        /// Month (YYYY-MM), defaults to the current month
        month: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compare a month's limits with the limits it started with
    #[command(name = "compare-original")]
    CompareOriginal {
        /// Month (YYYY-MM), defaults to the current month
        month: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Budget vs actual spending, with alerts
    Performance {
        /// Month (YYYY-MM), defaults to the current month
        month: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Mark an alert as viewed
    #[command(name = "mark-viewed")]
    MarkViewed {
        /// Alert ID
        alert: String,
        /// Month the alert belongs to (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
    },
}

/// Handle a report command
pub fn handle_report_command(cx: &CommandContext, cmd: ReportCommands) -> BudgetResult<()> {
    let service = ReportService::new(cx.storage);
    let household_id = cx.household.household_id;

    match cmd {
        ReportCommands::Compare { month, json } => {
            let period = cx.period_or_current(month.as_deref())?;
            let report = service.compare(household_id, period)?;
            if json {
                print_json(&report)?;
            } else {
                print!("{}", format_comparison(&report, "Month vs active budget", cx.symbol()));
            }
        }

        ReportCommands::CompareOriginal { month, json } => {
            let period = cx.period_or_current(month.as_deref())?;
            let report = service.compare_to_original(household_id, period)?;
            if json {
                print_json(&report)?;
            } else {
                print!("{}", format_comparison(&report, "Month vs start of month", cx.symbol()));
            }
        }

        ReportCommands::Performance { month, json } => {
            let period = cx.period_or_current(month.as_deref())?;
            let report = service.performance(household_id, period)?;
            if json {
                print_json(&report)?;
            } else {
                print!("{}", format_performance(&report, cx.symbol()));
            }
        }

        ReportCommands::MarkViewed { alert, month } => {
            let period = cx.period_or_current(month.as_deref())?;
            let (alert, first) = service.mark_alert_viewed(&cx.household, period, &alert)?;
            if first {
                println!("Marked viewed: {}", alert.message);
            } else {
                println!("Already viewed: {}", alert.message);
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> BudgetResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
