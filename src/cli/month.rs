//! Monthly budget CLI commands

use clap::Subcommand;

use crate::display::{format_monthly_details, format_monthly_list};
use crate::error::BudgetResult;
use crate::services::MonthlyBudgetService;

use super::{parse_money, CommandContext};

/// Monthly budget subcommands
#[derive(Subcommand)]
pub enum MonthCommands {
    /// Show a month's budget, creating it from the active budget if needed
    Show {
        /// Month (YYYY-MM), defaults to the current month
        month: Option<String>,
    },

    /// Change one category limit for a single month
    #[command(name = "set-limit")]
    SetLimit {
        /// Category name
        category: String,
        /// New limit (e.g., "1800" or "1800.00")
        amount: String,
        /// Month (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Lock a month against edits
    Lock {
        /// Month (YYYY-MM), defaults to the current month
        month: Option<String>,
    },

    /// Unlock a month
    Unlock {
        /// Month (YYYY-MM), defaults to the current month
        month: Option<String>,
    },

    /// List all monthly budgets
    List,
}

/// Handle a month command
pub fn handle_month_command(cx: &CommandContext, cmd: MonthCommands) -> BudgetResult<()> {
    let service = MonthlyBudgetService::new(cx.storage);
    let household_id = cx.household.household_id;

    match cmd {
        MonthCommands::Show { month } => {
            let period = cx.period_or_current(month.as_deref())?;
            let snapshot = service.get_or_create(household_id, period)?;
            print!("{}", format_monthly_details(&snapshot, cx.symbol()));
        }

        MonthCommands::SetLimit {
            category,
            amount,
            month,
        } => {
            let period = cx.period_or_current(month.as_deref())?;
            let limit = parse_money(&amount)?;
            let snapshot = service.set_limit_for_month(household_id, period, &category, limit)?;
            println!(
                "Set {} to {} for {} ({} adjustments this month)",
                category,
                limit.format_with_symbol(cx.symbol()),
                period,
                snapshot.adjustment_count
            );
        }

        MonthCommands::Lock { month } => {
            let period = cx.period_or_current(month.as_deref())?;
            service.lock(household_id, period)?;
            println!("Locked {}", period);
        }

        MonthCommands::Unlock { month } => {
            let period = cx.period_or_current(month.as_deref())?;
            service.unlock(household_id, period)?;
            println!("Unlocked {}", period);
        }

        MonthCommands::List => {
            let snapshots = service.list(household_id)?;
            print!("{}", format_monthly_list(&snapshots, cx.symbol()));
        }
    }

    Ok(())
}
