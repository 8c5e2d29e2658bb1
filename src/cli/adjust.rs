//! Scheduled adjustment CLI commands

use clap::Subcommand;

use crate::display::{format_adjustment_list, format_apply_report, format_summary};
use crate::error::{BudgetError, BudgetResult};
use crate::models::category::same_name;
use crate::services::{AdjustmentService, PersonalBudgetService};

use super::{parse_money, parse_period, CommandContext};

/// Adjustment subcommands
#[derive(Subcommand)]
pub enum AdjustCommands {
    /// Schedule a limit change for next month (or a later month)
    Schedule {
        /// Category name
        category: String,
        /// New monthly limit
        amount: String,
        /// Why the limit changes
        #[arg(short, long, default_value = "")]
        reason: String,
        /// Effective month (YYYY-MM), defaults to next month
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Schedule a new category starting next month
    #[command(name = "schedule-new")]
    ScheduleNew {
        /// Category name
        category: String,
        /// Monthly limit
        amount: String,
        /// Why the category is added
        #[arg(short, long, default_value = "")]
        reason: String,
    },

    /// Cancel a pending adjustment
    Cancel {
        /// Adjustment ID
        id: String,
    },

    /// List scheduled adjustments
    List {
        /// Show only pending adjustments
        #[arg(long)]
        pending: bool,
    },

    /// Summarize the changes scheduled for next month
    Summary,

    /// Apply every adjustment that is due
    Apply,
}

/// Handle an adjustment command
pub fn handle_adjust_command(cx: &CommandContext, cmd: AdjustCommands) -> BudgetResult<()> {
    let service = AdjustmentService::new(cx.storage)
        .propagate_to_baseline(cx.settings.propagate_adjustments_to_baseline);
    let household_id = cx.household.household_id;

    match cmd {
        AdjustCommands::Schedule {
            category,
            amount,
            reason,
            month,
        } => {
            let new_limit = parse_money(&amount)?;
            let baseline = PersonalBudgetService::new(cx.storage).require_active(household_id)?;
            let (name, config) = baseline
                .categories
                .iter()
                .find(|(name, _)| same_name(name, &category))
                .ok_or_else(|| {
                    BudgetError::Validation(format!(
                        "Category '{}' is not in the active budget; use 'adjust schedule-new' for new categories",
                        category
                    ))
                })?;

            let adjustment = match month {
                Some(month) => service.schedule_for(
                    household_id,
                    name,
                    config.monthly_limit,
                    new_limit,
                    &reason,
                    parse_period(&month)?,
                    cx.today,
                )?,
                None => service.schedule(
                    household_id,
                    name,
                    config.monthly_limit,
                    new_limit,
                    &reason,
                    cx.today,
                )?,
            };
            println!("Scheduled: {}", adjustment);
            println!("  ID: {}", adjustment.id);
        }

        AdjustCommands::ScheduleNew {
            category,
            amount,
            reason,
        } => {
            let limit = parse_money(&amount)?;
            let adjustment =
                service.schedule_new_category(household_id, &category, limit, &reason, cx.today)?;
            println!("Scheduled new category: {}", adjustment);
            println!("  ID: {}", adjustment.id);
        }

        AdjustCommands::Cancel { id } => {
            let adjustment = service
                .find(household_id, &id)?
                .ok_or_else(|| BudgetError::adjustment_not_found(&id))?;
            let cancelled = service.cancel(adjustment.id)?;
            println!("Cancelled: {}", cancelled);
        }

        AdjustCommands::List { pending } => {
            let adjustments = if pending {
                service.list_pending(household_id)?
            } else {
                service.list(household_id)?
            };
            print!("{}", format_adjustment_list(&adjustments, cx.symbol()));
        }

        AdjustCommands::Summary => {
            let summary = service.next_month_summary(household_id, cx.today)?;
            print!("{}", format_summary(&summary, cx.symbol()));
        }

        AdjustCommands::Apply => {
            let report = service.auto_apply_due(household_id, cx.today)?;
            print!("{}", format_apply_report(&report, cx.symbol()));
        }
    }

    Ok(())
}
