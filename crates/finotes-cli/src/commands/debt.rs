use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use finotes_core::debt_payoff::simulator::{self, DebtPayoffInput};
use finotes_core::debt_payoff::strategy::PayoffStrategy;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    Avalanche,
    Snowball,
}

impl From<StrategyArg> for PayoffStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Avalanche => PayoffStrategy::Avalanche,
            StrategyArg::Snowball => PayoffStrategy::Snowball,
        }
    }
}

/// Arguments for the credit-card payoff optimizer
#[derive(Args)]
pub struct DebtPayoffArgs {
    /// Path to JSON input file with cards and budget
    #[arg(long)]
    pub input: Option<String>,

    /// Override the strategy in the input
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Override the monthly budget in the input
    #[arg(long)]
    pub budget: Option<Decimal>,
}

/// Arguments for comparing avalanche and snowball
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON input file with cards and budget
    #[arg(long)]
    pub input: Option<String>,

    /// Override the monthly budget in the input
    #[arg(long)]
    pub budget: Option<Decimal>,
}

fn load_cards(path: Option<&str>, budget: Option<Decimal>) -> Result<DebtPayoffInput, Box<dyn std::error::Error>> {
    let mut payoff_input: DebtPayoffInput = input::load(path)?
        .ok_or("--input <file.json> or stdin required for debt payoff (cards list)")?;
    if let Some(budget) = budget {
        payoff_input.monthly_budget = budget;
    }
    Ok(payoff_input)
}

pub fn run_debt_payoff(args: DebtPayoffArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut payoff_input = load_cards(args.input.as_deref(), args.budget)?;
    if let Some(strategy) = args.strategy {
        payoff_input.strategy = strategy.into();
    }
    let result = simulator::simulate_debt_payoff(&payoff_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payoff_input = load_cards(args.input.as_deref(), args.budget)?;
    let result = simulator::compare_strategies(&payoff_input)?;
    Ok(serde_json::to_value(result)?)
}
