pub mod debt;
pub mod loan;
pub mod sip;

use clap::ValueEnum;
use finotes_core::{FinotesResult, TermUnit};

/// Unit for `--term` flags
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TermUnitArg {
    Months,
    Years,
}

impl TermUnitArg {
    pub fn to_months(self, term: u32) -> FinotesResult<u32> {
        let unit = match self {
            TermUnitArg::Months => TermUnit::Months,
            TermUnitArg::Years => TermUnit::Years,
        };
        unit.to_months(term)
    }
}
