use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::schedule::run_schedule;
use crate::error::FinotesError;
use crate::time_value::{compound, monthly_rate, round_money, MAX_TERM_MONTHS, MONEY_DP};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::FinotesResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Loan category as picked on the repayment page. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    Personal,
    Auto,
    Education,
    Home,
}

/// A fixed-rate, fully amortising loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanParameters {
    pub principal: Money,
    /// Annual rate in percent (10 = 10% p.a.)
    pub annual_rate_percent: Percent,
    pub term_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_type: Option<LoanType>,
}

impl LoanParameters {
    pub fn new(principal: Money, annual_rate_percent: Percent, term_months: u32) -> Self {
        Self {
            principal,
            annual_rate_percent,
            term_months,
            loan_type: None,
        }
    }

    pub fn monthly_rate(&self) -> Rate {
        monthly_rate(self.annual_rate_percent)
    }

    pub(crate) fn validate(&self) -> FinotesResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(FinotesError::invalid("principal", "Principal must be positive"));
        }
        if self.annual_rate_percent < Decimal::ZERO {
            return Err(FinotesError::invalid(
                "annual_rate_percent",
                "Interest rate cannot be negative",
            ));
        }
        if self.term_months == 0 {
            return Err(FinotesError::invalid("term_months", "Term must be at least 1 month"));
        }
        if self.term_months > MAX_TERM_MONTHS {
            return Err(FinotesError::invalid(
                "term_months",
                format!("Term cannot exceed {MAX_TERM_MONTHS} months"),
            ));
        }
        Ok(())
    }

    /// The installment actually charged each month, posted to the minor unit.
    ///
    /// Normally the exact installment rounded to the nearest cent. When that
    /// rounding (or interest rounding to zero on tiny balances) would clear
    /// the plain schedule before its final month, the largest cent amount
    /// that still runs the full term is used instead.
    pub(crate) fn posted_installment(&self) -> FinotesResult<Money> {
        let exact = compute_installment(self.principal, self.monthly_rate(), self.term_months)?;
        let nearest = round_money(exact);
        if self.runs_full_term(nearest)? {
            return Ok(nearest);
        }

        let cent = Decimal::new(1, MONEY_DP);
        let mut installment = exact.round_dp_with_strategy(MONEY_DP, RoundingStrategy::ToZero);
        while installment > Decimal::ZERO && !self.runs_full_term(installment)? {
            installment -= cent;
        }
        log::debug!("installment {nearest} would repay early; posting {installment}");
        Ok(installment)
    }

    fn runs_full_term(&self, installment: Money) -> FinotesResult<bool> {
        Ok(run_schedule(self, installment, &[])?.payoff_month == self.term_months)
    }
}

/// Headline figures shown by the EMI calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiSummary {
    pub installment: Money,
    pub total_interest: Money,
    pub total_payment: Money,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Equal monthly installment: `P·r·(1+r)^n / ((1+r)^n − 1)`, or `P / n`
/// when the rate is zero. The result is not rounded.
pub fn compute_installment(principal: Money, monthly_rate: Rate, term_months: u32) -> FinotesResult<Money> {
    if principal <= Decimal::ZERO {
        return Err(FinotesError::invalid("principal", "Principal must be positive"));
    }
    if term_months == 0 {
        return Err(FinotesError::invalid("term_months", "Term must be at least 1 month"));
    }
    if monthly_rate < Decimal::ZERO {
        return Err(FinotesError::invalid("monthly_rate", "Rate cannot be negative"));
    }

    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(term_months));
    }

    let growth = compound(monthly_rate, term_months)?;
    let denominator = growth - Decimal::ONE;
    if denominator.is_zero() {
        // Rate too small to register over the term at 28 digits.
        return Ok(principal / Decimal::from(term_months));
    }
    principal
        .checked_mul(monthly_rate)
        .and_then(|v| v.checked_mul(growth))
        .map(|v| v / denominator)
        .ok_or_else(|| FinotesError::invalid("principal", "Installment exceeds decimal range"))
}

/// EMI calculator: installment plus total interest and payment over the
/// plain schedule (final month absorbs rounding).
pub fn calculate_emi(loan: &LoanParameters) -> FinotesResult<ComputationOutput<EmiSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    loan.validate()?;

    if loan.annual_rate_percent.is_zero() {
        warnings.push("Zero interest rate: installment is principal / term".into());
    }

    let installment = loan.posted_installment()?;
    let run = run_schedule(loan, installment, &[])?;

    let output = EmiSummary {
        installment,
        total_interest: run.total_interest,
        total_payment: run.total_interest + loan.principal,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Equal Monthly Installment",
        loan,
        warnings,
        elapsed,
        output,
    ))
}
