mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::debt::{CompareArgs, DebtPayoffArgs};
use commands::loan::{EmiArgs, ScheduleArgs};
use commands::sip::SipArgs;

/// Loan, SIP and credit-card payoff calculators
#[derive(Parser)]
#[command(
    name = "finotes",
    version,
    about = "fiNotes loan, SIP and debt-payoff calculators",
    long_about = "A CLI for the fiNotes personal-finance calculators with decimal \
                  precision. Supports EMI, amortization schedules with early \
                  payments, SIP projections and goal planning, and credit-card \
                  payoff under avalanche or snowball strategies."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the equal monthly installment of a loan
    Emi(EmiArgs),
    /// Build an amortization schedule, optionally with early payments
    LoanSchedule(ScheduleArgs),
    /// Project a SIP, or solve for the contribution a goal needs
    Sip(SipArgs),
    /// Simulate paying off several credit cards with a fixed budget
    DebtPayoff(DebtPayoffArgs),
    /// Compare avalanche and snowball on the same cards
    CompareStrategies(CompareArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Emi(args) => commands::loan::run_emi(args),
        Commands::LoanSchedule(args) => commands::loan::run_schedule(args),
        Commands::Sip(args) => commands::sip::run_sip(args),
        Commands::DebtPayoff(args) => commands::debt::run_debt_payoff(args),
        Commands::CompareStrategies(args) => commands::debt::run_compare(args),
        Commands::Version => {
            println!("finotes {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
