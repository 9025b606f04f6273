use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finotes_core::investment::sip::{self, SipMode, SipParameters};

use crate::commands::TermUnitArg;
use crate::input;

/// Arguments for the SIP planner
#[derive(Args)]
pub struct SipArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly contribution, or the target amount with --goal
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Expected annual return in percent (e.g. 12 for 12%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Investment horizon, in --term-unit
    #[arg(long)]
    pub term: Option<u32>,

    /// Unit of --term
    #[arg(long, value_enum, default_value = "years")]
    pub term_unit: TermUnitArg,

    /// Treat --amount as a goal and solve for the monthly contribution
    #[arg(long)]
    pub goal: bool,
}

pub fn run_sip(args: SipArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: SipParameters = match input::load(args.input.as_deref())? {
        Some(params) => params,
        None => {
            let amount = args.amount.ok_or("--amount is required (or provide --input)")?;
            let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
            let term = args.term.ok_or("--term is required (or provide --input)")?;
            SipParameters {
                amount,
                annual_return_percent: rate,
                term_months: args.term_unit.to_months(term)?,
                mode: if args.goal {
                    SipMode::Goal
                } else {
                    SipMode::Contribution
                },
            }
        }
    };
    let result = sip::project_sip(&params)?;
    Ok(serde_json::to_value(result)?)
}
