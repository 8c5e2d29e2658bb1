//! Transaction CLI commands

use clap::Subcommand;

use crate::display::format_transaction_list;
use crate::error::{BudgetError, BudgetResult};
use crate::models::TransactionType;
use crate::services::{NewTransaction, TransactionFilter, TransactionService};

use super::{parse_date, parse_money, CommandContext};

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record a transaction
    Add {
        /// Category name
        category: String,
        /// Amount (always positive)
        amount: String,
        /// Record as income instead of an expense
        #[arg(long)]
        income: bool,
        /// Transaction date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Description
        #[arg(short = 'm', long)]
        description: Option<String>,
    },

    /// List transactions
    List {
        /// Only this month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },
}

/// Handle a transaction command
pub fn handle_transaction_command(cx: &CommandContext, cmd: TransactionCommands) -> BudgetResult<()> {
    let service = TransactionService::new(cx.storage);
    let household_id = cx.household.household_id;

    match cmd {
        TransactionCommands::Add {
            category,
            amount,
            income,
            date,
            description,
        } => {
            let date = match date {
                Some(raw) => parse_date(&raw)?,
                None => cx.today,
            };
            let txn = service.add(
                household_id,
                NewTransaction {
                    category,
                    amount: parse_money(&amount)?,
                    transaction_type: if income {
                        TransactionType::Income
                    } else {
                        TransactionType::Expense
                    },
                    date,
                    description: description.unwrap_or_default(),
                },
            )?;
            println!("Recorded: {}", txn);
            println!("  ID: {}", txn.id);
        }

        TransactionCommands::List {
            month,
            category,
            limit,
        } => {
            let mut filter = TransactionFilter::new().limit(limit);
            if let Some(month) = month {
                filter = filter.period(super::parse_period(&month)?);
            }
            if let Some(category) = category {
                filter = filter.category(category);
            }
            let transactions = service.list(household_id, &filter)?;
            print!("{}", format_transaction_list(&transactions, cx.symbol()));
        }

        TransactionCommands::Delete { id } => {
            let txn = service
                .find(household_id, &id)?
                .ok_or_else(|| BudgetError::transaction_not_found(&id))?;
            service.delete(household_id, txn.id)?;
            println!("Deleted transaction {}", txn.id);
        }
    }

    Ok(())
}
