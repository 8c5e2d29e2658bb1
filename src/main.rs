use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use household_budget::cli::{
    handle_adjust_command, handle_audit_command, handle_budget_command, handle_category_command,
    handle_month_command, handle_report_command, handle_transaction_command, parse_date, CommandContext,
};
use household_budget::config::{context::HouseholdContext, paths::BudgetPaths, settings::Settings};
use household_budget::services::AdjustmentService;
use household_budget::storage::Storage;

#[derive(Parser)]
#[command(
    name = "hbudget",
    version,
    about = "Household budget lifecycle engine",
    long_about = "hbudget keeps a versioned household budget, snapshots it into \
                  monthly budgets, applies scheduled limit changes when a new \
                  month starts and reports how spending tracks the plan."
)]
struct Cli {
    /// Act for this household instead of the configured one
    #[arg(long, global = true, env = "HBUDGET_HOUSEHOLD")]
    household: Option<String>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true, hide = true, env = "HBUDGET_TODAY")]
    today: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Personal budget (baseline) commands
    #[command(subcommand)]
    Budget(household_budget::cli::BudgetCommands),

    /// Monthly budget commands
    #[command(subcommand)]
    Month(household_budget::cli::MonthCommands),

    /// Scheduled adjustment commands
    #[command(subcommand)]
    Adjust(household_budget::cli::AdjustCommands),

    /// Category lifecycle commands
    #[command(subcommand)]
    Category(household_budget::cli::CategoryCommands),

    /// Transaction commands
    #[command(subcommand, alias = "transaction")]
    Txn(household_budget::cli::TransactionCommands),

    /// Comparison and performance reports
    #[command(subcommand)]
    Report(household_budget::cli::ReportCommands),

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = BudgetPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let mut storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    let household = HouseholdContext::resolve(&settings, cli.household.as_deref())?;
    let today = match cli.today.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => chrono::Local::now().date_naive(),
    };

    if settings.auto_apply_on_load {
        let report = AdjustmentService::new(&storage)
            .propagate_to_baseline(settings.propagate_adjustments_to_baseline)
            .auto_apply_due(household.household_id, today)?;
        for adjustment in &report.applied {
            eprintln!("Applied scheduled adjustment: {}", adjustment);
        }
        for skipped in &report.skipped {
            eprintln!("Skipped scheduled adjustment: {} ({})", skipped.adjustment, skipped.reason);
        }
    }

    let cx = CommandContext {
        storage: &storage,
        settings: &settings,
        household,
        today,
    };

    match cli.command {
        Some(Commands::Budget(cmd)) => handle_budget_command(&cx, cmd)?,
        Some(Commands::Month(cmd)) => handle_month_command(&cx, cmd)?,
        Some(Commands::Adjust(cmd)) => handle_adjust_command(&cx, cmd)?,
        Some(Commands::Category(cmd)) => handle_category_command(&cx, cmd)?,
        Some(Commands::Txn(cmd)) => handle_transaction_command(&cx, cmd)?,
        Some(Commands::Report(cmd)) => handle_report_command(&cx, cmd)?,
        Some(Commands::Audit { limit }) => handle_audit_command(&storage, limit)?,
        Some(Commands::Config) => {
            println!("hbudget Configuration");
            println!("=====================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Household:           {}", cx.household.household_id.as_uuid());
            println!("  Currency symbol:     {}", settings.currency_symbol);
            println!("  Warning threshold:   {}%", settings.default_warning_threshold);
            println!("  Propagate to budget: {}", settings.propagate_adjustments_to_baseline);
            println!("  Auto-apply on load:  {}", settings.auto_apply_on_load);
        }
        None => {
            println!("hbudget - household budget lifecycle engine");
            println!();
            println!("Run 'hbudget --help' for usage information.");
            println!("Run 'hbudget budget create <NAME> -c Groceries=400' to get started.");
        }
    }

    Ok(())
}
