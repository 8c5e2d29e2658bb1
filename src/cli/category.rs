//! Category CLI commands
//!
//! Implements CLI commands for the category lifecycle: create, rename,
//! merge and undo, delete and restore.

use clap::Subcommand;

use crate::display::{format_category_history, format_category_list, format_merge_list};
use crate::error::{BudgetError, BudgetResult};
use crate::models::ids::match_short_id;
use crate::services::{CategoryService, NewCategory};

use super::{parse_money, CommandContext};

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List the active budget's categories
    List,

    /// Add a category to the active budget
    Create {
        /// Category name
        name: String,
        /// Monthly limit
        limit: String,
        /// Warning threshold percentage (0-100)
        #[arg(short, long)]
        threshold: Option<u8>,
        /// Display color
        #[arg(long, default_value = "")]
        color: String,
    },

    /// Rename a category in budgets, months, adjustments and transactions
    Rename {
        /// Current name
        old: String,
        /// New name
        new: String,
    },

    /// Move all of a category's transactions into another and retire it
    Merge {
        /// Category to merge away
        source: String,
        /// Category that receives the transactions
        target: String,
        /// Why the categories are merged
        #[arg(short, long, default_value = "")]
        reason: String,
    },

    /// Undo a merge
    #[command(name = "undo-merge")]
    UndoMerge {
        /// Merge ID
        id: String,
    },

    /// Delete a category (soft by default)
    Delete {
        /// Category name
        name: String,
        /// Remove it entirely; only allowed without transactions
        #[arg(long)]
        hard: bool,
    },

    /// Restore a soft-deleted category
    Restore {
        /// Category name
        name: String,
    },

    /// Show the category change history
    History,

    /// List merges
    Merges,
}

/// Handle a category command
pub fn handle_category_command(cx: &CommandContext, cmd: CategoryCommands) -> BudgetResult<()> {
    let service = CategoryService::new(cx.storage);
    let household_id = cx.household.household_id;

    match cmd {
        CategoryCommands::List => {
            let categories = service.list(household_id)?;
            print!("{}", format_category_list(&categories, cx.symbol()));
        }

        CategoryCommands::Create {
            name,
            limit,
            threshold,
            color,
        } => {
            let mut input = NewCategory::new(name, parse_money(&limit)?);
            input.warning_threshold = threshold.unwrap_or(cx.settings.default_warning_threshold);
            input.color = color;
            let budget = service.create(household_id, input.clone())?;
            println!("Created category: {}", input.name.trim());
            println!("  Budget: {}", budget);
        }

        CategoryCommands::Rename { old, new } => {
            let report = service.rename(household_id, &old, &new)?;
            println!("Renamed {} -> {}", report.old_name, report.new_name);
            println!("  Transactions: {}", report.transactions);
            println!("  Budgets:      {}", report.budgets);
            println!("  Months:       {}", report.snapshots);
            println!("  Adjustments:  {}", report.adjustments);
        }

        CategoryCommands::Merge {
            source,
            target,
            reason,
        } => {
            let record = service.merge(household_id, &source, &target, &reason)?;
            println!(
                "Merged {} into {} ({} transactions moved)",
                record.source_name,
                record.target_name,
                record.transaction_count()
            );
            println!("  Undo with: hbudget category undo-merge {}", record.id);
        }

        CategoryCommands::UndoMerge { id } => {
            let merges = service.list_merges(household_id)?;
            let merge_ids: Vec<_> = merges.iter().map(|m| m.id).collect();
            let merge_id = match_short_id(&id, &merge_ids).ok_or_else(|| BudgetError::merge_not_found(&id))?;
            let record = service.undo_merge(household_id, merge_id)?;
            println!(
                "Undid merge: {} transactions back in {}",
                record.transaction_count(),
                record.source_name
            );
        }

        CategoryCommands::Delete { name, hard } => {
            service.delete(household_id, &name, hard)?;
            if hard {
                println!("Deleted category: {}", name);
            } else {
                println!("Deleted category: {} (restore with 'hbudget category restore')", name);
            }
        }

        CategoryCommands::Restore { name } => {
            service.restore(household_id, &name)?;
            println!("Restored category: {}", name);
        }

        CategoryCommands::History => {
            let events = service.history(household_id)?;
            print!("{}", format_category_history(&events));
        }

        CategoryCommands::Merges => {
            let merges = service.list_merges(household_id)?;
            print!("{}", format_merge_list(&merges));
        }
    }

    Ok(())
}
