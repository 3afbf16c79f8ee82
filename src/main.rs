use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use risklens::core::growth::InvestmentPlan;
use risklens::core::log::init_logging;
use risklens::core::planning::SavingsPlan;
use risklens::core::{RiskToleranceTier, VolatilityTier};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert between currencies at the latest rate
    Rate {
        /// Currency to convert from
        base: String,
        /// One or more currencies to convert to
        #[arg(required = true)]
        targets: Vec<String>,
        /// Amount of the base currency
        #[arg(short, long, default_value_t = 1.0)]
        amount: f64,
    },
    /// Display the latest rate table for a base currency
    Rates {
        /// Base currency (defaults to the configured currency)
        #[arg(short, long)]
        base: Option<String>,
        /// Number of currencies to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Poll a currency pair at a fixed interval
    Watch {
        base: String,
        target: String,
        /// Seconds between refreshes (defaults to the configured interval)
        #[arg(short, long)]
        interval: Option<u64>,
        /// Stop after this many updates
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Score the currency risk of an investment
    Risk {
        amount: f64,
        #[arg(long, default_value = "medium")]
        volatility: VolatilityTier,
        #[arg(long, default_value = "medium")]
        tolerance: RiskToleranceTier,
    },
    /// Project the future value of a recurring investment
    Project {
        #[arg(long)]
        initial: f64,
        #[arg(long, default_value_t = 0.0)]
        monthly: f64,
        /// Expected annual return in percent
        #[arg(long, allow_negative_numbers = true)]
        annual_return: f64,
        #[arg(long)]
        months: u32,
        #[arg(long, default_value = "USD")]
        base: String,
        #[arg(long, default_value = "USD")]
        target: String,
        /// Width of the optimistic/pessimistic band in percentage points
        #[arg(long, default_value_t = 2.0)]
        spread: f64,
        /// Use this exchange rate instead of fetching one
        #[arg(long)]
        rate: Option<f64>,
    },
    /// Show how an exchange-rate move changes a conversion
    Scenario {
        amount: f64,
        base: String,
        target: String,
        /// Rate shift in percent, usually between -25 and 25
        #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
        shift: f64,
        /// Use this exchange rate instead of fetching one
        #[arg(long)]
        rate: Option<f64>,
    },
    /// Display a simulated daily rate history
    History {
        base: String,
        target: String,
        #[arg(short, long, default_value_t = 30)]
        days: u32,
        /// Seed for a repeatable series
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Summarize a savings goal
    Plan {
        #[arg(long)]
        income: f64,
        #[arg(long)]
        expenses: f64,
        /// Amount already invested
        #[arg(long, default_value_t = 0.0)]
        investment: f64,
        #[arg(long)]
        goal: f64,
        #[arg(long, default_value = "medium")]
        tolerance: RiskToleranceTier,
    },
}

impl From<Commands> for risklens::AppCommand {
    fn from(cmd: Commands) -> risklens::AppCommand {
        use risklens::AppCommand;

        match cmd {
            Commands::Rate {
                base,
                targets,
                amount,
            } => AppCommand::Rate {
                base,
                targets,
                amount,
            },
            Commands::Rates { base, limit } => AppCommand::Rates { base, limit },
            Commands::Watch {
                base,
                target,
                interval,
                count,
            } => AppCommand::Watch {
                base,
                target,
                interval_secs: interval,
                count,
            },
            Commands::Risk {
                amount,
                volatility,
                tolerance,
            } => AppCommand::Risk {
                amount,
                volatility,
                tolerance,
            },
            Commands::Project {
                initial,
                monthly,
                annual_return,
                months,
                base,
                target,
                spread,
                rate,
            } => AppCommand::Project {
                plan: InvestmentPlan::new(initial, monthly, annual_return, months, &base, &target),
                spread_pct: spread,
                rate,
            },
            Commands::Scenario {
                amount,
                base,
                target,
                shift,
                rate,
            } => AppCommand::Scenario {
                amount,
                base,
                target,
                shift_pct: shift,
                rate,
            },
            Commands::History {
                base,
                target,
                days,
                seed,
            } => AppCommand::History {
                base,
                target,
                days,
                seed,
            },
            Commands::Plan {
                income,
                expenses,
                investment,
                goal,
                tolerance,
            } => AppCommand::Plan(SavingsPlan {
                monthly_income: income,
                monthly_expenses: expenses,
                investment,
                goal_amount: goal,
                tolerance,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => risklens::cli::setup::setup_at_path(path),
            None => risklens::cli::setup::setup(),
        },
        Some(cmd) => risklens::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
