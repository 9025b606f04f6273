use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use finotes_core::amortization::early_payment::EarlyPayment;
use finotes_core::amortization::emi::{self, LoanParameters, LoanType};
use finotes_core::amortization::schedule;

use crate::commands::TermUnitArg;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LoanTypeArg {
    Personal,
    Auto,
    Education,
    Home,
}

impl From<LoanTypeArg> for LoanType {
    fn from(arg: LoanTypeArg) -> Self {
        match arg {
            LoanTypeArg::Personal => LoanType::Personal,
            LoanTypeArg::Auto => LoanType::Auto,
            LoanTypeArg::Education => LoanType::Education,
            LoanTypeArg::Home => LoanType::Home,
        }
    }
}

/// Loan flags shared by `emi` and `loan-schedule`
#[derive(Args)]
pub struct LoanFlags {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 10 for 10%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term, in --term-unit
    #[arg(long)]
    pub term: Option<u32>,

    /// Unit of --term
    #[arg(long, value_enum, default_value = "months")]
    pub term_unit: TermUnitArg,

    /// Loan category (informational)
    #[arg(long, value_enum)]
    pub loan_type: Option<LoanTypeArg>,
}

impl LoanFlags {
    fn to_loan(&self) -> Result<LoanParameters, Box<dyn std::error::Error>> {
        let principal = self
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let rate = self.rate.ok_or("--rate is required (or provide --input)")?;
        let term = self.term.ok_or("--term is required (or provide --input)")?;
        let mut loan = LoanParameters::new(principal, rate, self.term_unit.to_months(term)?);
        loan.loan_type = self.loan_type.map(Into::into);
        Ok(loan)
    }
}

/// Arguments for the EMI calculator
#[derive(Args)]
pub struct EmiArgs {
    #[command(flatten)]
    pub loan: LoanFlags,
}

pub fn run_emi(args: EmiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan: LoanParameters = match input::load(args.loan.input.as_deref())? {
        Some(loan) => loan,
        None => args.loan.to_loan()?,
    };
    let result = emi::calculate_emi(&loan)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the amortization schedule with early payments
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: LoanFlags,

    /// Lump-sum prepayments as AMOUNT@MONTH, comma-separated (e.g. "20000@6,5000@9")
    #[arg(long, value_delimiter = ',', value_parser = parse_early_payment)]
    pub early_payment: Vec<EarlyPayment>,
}

/// JSON shape accepted by `loan-schedule --input`
#[derive(Deserialize)]
struct ScheduleInput {
    loan: LoanParameters,
    #[serde(default)]
    early_payments: Vec<EarlyPayment>,
}

fn parse_early_payment(s: &str) -> Result<EarlyPayment, String> {
    let (amount, month) = s
        .split_once('@')
        .ok_or_else(|| format!("expected AMOUNT@MONTH, got '{s}'"))?;
    let amount: Decimal = amount
        .trim()
        .parse()
        .map_err(|e| format!("invalid amount '{amount}': {e}"))?;
    let at_month: u32 = month
        .trim()
        .parse()
        .map_err(|e| format!("invalid month '{month}': {e}"))?;
    Ok(EarlyPayment { amount, at_month })
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = match input::load::<ScheduleInput>(args.loan.input.as_deref())? {
        Some(input) => input,
        None => ScheduleInput {
            loan: args.loan.to_loan()?,
            early_payments: args.early_payment,
        },
    };
    let result = schedule::build_schedule(&input.loan, &input.early_payments)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_early_payment() {
        let p = parse_early_payment("20000@6").unwrap();
        assert_eq!(p.amount, dec!(20000));
        assert_eq!(p.at_month, 6);
        assert!(parse_early_payment("20000").is_err());
        assert!(parse_early_payment("abc@6").is_err());
    }
}
