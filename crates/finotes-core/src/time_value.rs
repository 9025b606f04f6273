use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::FinotesError;
use crate::types::{Money, Percent, Rate};
use crate::FinotesResult;

/// Decimal places money is posted at (currency minor unit).
pub const MONEY_DP: u32 = 2;

/// Periods per year for every calculator in this crate.
pub const MONTHS_PER_YEAR: u32 = 12;

/// Longest term any calculator accepts (100 years).
pub const MAX_TERM_MONTHS: u32 = 1200;

/// Convert an annual percentage (10 = 10% p.a.) to the monthly periodic
/// rate used by all engines: `annual / 100 / 12`.
pub fn monthly_rate(annual_rate_percent: Percent) -> Rate {
    annual_rate_percent / dec!(100) / Decimal::from(MONTHS_PER_YEAR)
}

/// Round half-up to the currency minor unit.
pub fn round_money(amount: Money) -> Money {
    amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
/// `n` is capped at [`MAX_TERM_MONTHS`].
pub fn compound(rate: Rate, n: u32) -> FinotesResult<Decimal> {
    if n > MAX_TERM_MONTHS {
        return Err(FinotesError::invalid(
            "term_months",
            format!("Term cannot exceed {MAX_TERM_MONTHS} months"),
        ));
    }
    let factor = Decimal::ONE + rate;
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result
            .checked_mul(factor)
            .ok_or_else(|| FinotesError::invalid("term_months", "(1 + r)^n exceeds decimal range"))?;
    }
    Ok(result)
}

/// Interest accrued on `balance` over one period, posted to the minor unit.
/// Returns `None` on decimal overflow.
pub fn accrue_interest(balance: Money, rate: Rate) -> Option<Money> {
    balance.checked_mul(rate).map(round_money)
}
