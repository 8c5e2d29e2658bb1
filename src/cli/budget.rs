//! Budget CLI commands
//!
//! Implements CLI commands for personal (baseline) budget management.

use clap::Subcommand;

use crate::display::{format_budget_details, format_budget_list};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{ActiveBudget, CategoryMap, GlobalSettings, PersonalBudget};
use crate::services::{BudgetPatch, CreateBudgetInput, PersonalBudgetService, ResetOptions};

use super::{parse_category_spec, CommandContext};

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Create a budget (the household's first budget becomes active)
    Create {
        /// Budget name
        name: String,
        /// Category as NAME=LIMIT or NAME=LIMIT@THRESHOLD (repeatable)
        #[arg(short, long = "category", required = true)]
        categories: Vec<String>,
        /// Currency code
        #[arg(long, default_value = "USD")]
        currency: String,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List budgets (* marks the active one)
    List,

    /// Show a budget (the active one by default)
    Show {
        /// Budget name or ID
        budget: Option<String>,
    },

    /// Update a budget; existing monthly budgets are not affected
    Update {
        /// Budget name or ID
        budget: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New notes
        #[arg(long)]
        notes: Option<String>,
        /// Add or replace a category as NAME=LIMIT[@THRESHOLD] (repeatable)
        #[arg(short = 's', long = "set")]
        set: Vec<String>,
    },

    /// Make a budget the active one
    Activate {
        /// Budget name or ID
        budget: String,
    },

    /// Delete a budget
    Delete {
        /// Budget name or ID
        budget: String,
        /// Confirm deleting the active budget
        #[arg(long)]
        yes: bool,
    },

    /// Delete all budgets and scheduled adjustments of the household
    Reset {
        /// Also delete monthly budgets
        #[arg(long)]
        include_monthly: bool,
        /// Also delete transactions and merge records
        #[arg(long)]
        include_transactions: bool,
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

/// Handle a budget command
pub fn handle_budget_command(cx: &CommandContext, cmd: BudgetCommands) -> BudgetResult<()> {
    let service = PersonalBudgetService::new(cx.storage);
    let household_id = cx.household.household_id;

    match cmd {
        BudgetCommands::Create {
            name,
            categories,
            currency,
            notes,
        } => {
            let categories = parse_categories(&categories, cx.settings.default_warning_threshold)?;
            let budget = service.create(
                household_id,
                CreateBudgetInput {
                    name,
                    categories,
                    global_settings: GlobalSettings {
                        currency,
                        ..GlobalSettings::default()
                    },
                    notes: notes.unwrap_or_default(),
                },
            )?;
            println!("Created budget: {}", budget);
            println!("  ID: {}", budget.id);
            if !budget.is_active {
                println!("  Run 'hbudget budget activate {}' to make it active.", budget.id);
            }
        }

        BudgetCommands::List => {
            let budgets = service.list(household_id)?;
            print!("{}", format_budget_list(&budgets, cx.symbol()));
        }

        BudgetCommands::Show { budget } => {
            let budget = match budget {
                Some(identifier) => find(&service, cx, &identifier)?,
                None => match service.get_active(household_id)? {
                    ActiveBudget::Active(budget) => budget,
                    ActiveBudget::NoActiveBudget => {
                        println!("No active budget.");
                        return Ok(());
                    }
                },
            };
            print!("{}", format_budget_details(&budget, cx.symbol()));
        }

        BudgetCommands::Update {
            budget,
            name,
            notes,
            set,
        } => {
            let budget = find(&service, cx, &budget)?;
            let categories = if set.is_empty() {
                None
            } else {
                let mut categories = budget.categories.clone();
                categories.extend(parse_categories(&set, cx.settings.default_warning_threshold)?);
                Some(categories)
            };
            let updated = service.update(
                budget.id,
                BudgetPatch {
                    name,
                    notes,
                    categories,
                    global_settings: None,
                },
            )?;
            println!("Updated budget: {}", updated);
        }

        BudgetCommands::Activate { budget } => {
            let budget = find(&service, cx, &budget)?;
            let activated = service.set_active(budget.id)?;
            println!("Active budget: {}", activated);
        }

        BudgetCommands::Delete { budget, yes } => {
            let budget = find(&service, cx, &budget)?;
            let deleted = service.delete(budget.id, yes)?;
            println!("Deleted budget: {}", deleted.name);
            if deleted.is_active {
                println!("The household now has no active budget.");
            }
        }

        BudgetCommands::Reset {
            include_monthly,
            include_transactions,
            yes,
        } => {
            let report = service.reset_all(
                household_id,
                ResetOptions {
                    include_monthly,
                    include_transactions,
                    confirmed: yes,
                },
            )?;
            println!("Reset complete ({} records deleted):", report.total());
            println!("  Personal budgets:      {}", report.personal_budgets);
            println!("  Scheduled adjustments: {}", report.scheduled_adjustments);
            println!("  Monthly budgets:       {}", report.monthly_budgets);
            println!("  Transactions:          {}", report.transactions);
            println!("  Merge records:         {}", report.merge_records);
        }
    }

    Ok(())
}

fn find(service: &PersonalBudgetService, cx: &CommandContext, identifier: &str) -> BudgetResult<PersonalBudget> {
    service
        .find(cx.household.household_id, identifier)?
        .ok_or_else(|| BudgetError::budget_not_found(identifier))
}

fn parse_categories(specs: &[String], default_threshold: u8) -> BudgetResult<CategoryMap> {
    specs
        .iter()
        .map(|spec| parse_category_spec(spec, default_threshold))
        .collect()
}
