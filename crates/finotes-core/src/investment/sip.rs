use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinotesError;
use crate::time_value::{compound, monthly_rate, round_money, MAX_TERM_MONTHS, MONTHS_PER_YEAR};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::FinotesResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What `SipParameters::amount` means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SipMode {
    /// `amount` is the monthly contribution; project its future value.
    #[default]
    Contribution,
    /// `amount` is the target corpus; solve for the monthly contribution.
    Goal,
}

/// Input for a systematic investment plan projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipParameters {
    /// Monthly contribution or goal amount, depending on `mode`.
    pub amount: Money,
    pub annual_return_percent: Percent,
    pub term_months: u32,
    #[serde(default)]
    pub mode: SipMode,
}

/// Cumulative position at the end of a plan year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SipYearPoint {
    pub year: u32,
    pub total_invested: Money,
    pub projected_value: Money,
}

/// Output of `project_sip`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipOutput {
    pub mode: SipMode,
    pub monthly_contribution: Money,
    pub maturity_value: Money,
    pub total_invested: Money,
    pub wealth_gained: Money,
    pub yearly: Vec<SipYearPoint>,
}

// ---------------------------------------------------------------------------
// Closed-form functions
// ---------------------------------------------------------------------------

fn validate_rate_and_term(monthly_rate: Rate, term_months: u32) -> FinotesResult<()> {
    if monthly_rate < Decimal::ZERO {
        return Err(FinotesError::invalid("monthly_rate", "Expected return cannot be negative"));
    }
    if term_months == 0 {
        return Err(FinotesError::invalid("term_months", "Term must be at least 1 month"));
    }
    Ok(())
}

/// Future value of contributions made at the start of each month:
/// `P·((1+r)^n − 1)·(1+r)/r`, or `P·n` at a zero rate. Not rounded.
pub fn future_value(monthly_contribution: Money, monthly_rate: Rate, term_months: u32) -> FinotesResult<Money> {
    validate_rate_and_term(monthly_rate, term_months)?;
    if monthly_contribution < Decimal::ZERO {
        return Err(FinotesError::invalid(
            "monthly_contribution",
            "Contribution cannot be negative",
        ));
    }

    if monthly_rate.is_zero() {
        return Ok(monthly_contribution * Decimal::from(term_months));
    }

    let growth = compound(monthly_rate, term_months)?;
    monthly_contribution
        .checked_mul(growth - Decimal::ONE)
        .and_then(|v| v.checked_mul(Decimal::ONE + monthly_rate))
        .map(|v| v / monthly_rate)
        .ok_or_else(|| FinotesError::invalid("monthly_contribution", "Future value exceeds decimal range"))
}

/// Monthly contribution that grows to `goal_amount`: the inverse of
/// [`future_value`], `goal·r / (((1+r)^n − 1)·(1+r))`, or `goal / n` at a
/// zero rate. Not rounded.
pub fn required_contribution(goal_amount: Money, monthly_rate: Rate, term_months: u32) -> FinotesResult<Money> {
    validate_rate_and_term(monthly_rate, term_months)?;
    if goal_amount <= Decimal::ZERO {
        return Err(FinotesError::invalid("goal_amount", "Goal amount must be positive"));
    }

    if monthly_rate.is_zero() {
        return Ok(goal_amount / Decimal::from(term_months));
    }

    let growth = compound(monthly_rate, term_months)?;
    let denominator = (growth - Decimal::ONE)
        .checked_mul(Decimal::ONE + monthly_rate)
        .ok_or_else(|| FinotesError::invalid("term_months", "Growth factor exceeds decimal range"))?;
    if denominator.is_zero() {
        return Ok(goal_amount / Decimal::from(term_months));
    }
    goal_amount
        .checked_mul(monthly_rate)
        .map(|v| v / denominator)
        .ok_or_else(|| FinotesError::invalid("goal_amount", "Goal amount exceeds decimal range"))
}

// ---------------------------------------------------------------------------
// Yearly breakdown
// ---------------------------------------------------------------------------

/// Year-end points of a plan, computed lazily. Iterate as often as needed;
/// each pass starts again at year 1.
#[derive(Debug, Clone, Copy)]
pub struct SipYearlyBreakdown {
    contribution: Money,
    monthly_rate: Rate,
    term_months: u32,
}

impl SipYearlyBreakdown {
    pub fn years(&self) -> u32 {
        self.term_months.div_ceil(MONTHS_PER_YEAR)
    }

    pub fn iter(&self) -> SipYearIter {
        SipYearIter {
            breakdown: *self,
            next_year: 1,
        }
    }
}

impl<'a> IntoIterator for &'a SipYearlyBreakdown {
    type Item = SipYearPoint;
    type IntoIter = SipYearIter;

    fn into_iter(self) -> SipYearIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct SipYearIter {
    breakdown: SipYearlyBreakdown,
    next_year: u32,
}

impl Iterator for SipYearIter {
    type Item = SipYearPoint;

    fn next(&mut self) -> Option<SipYearPoint> {
        let b = &self.breakdown;
        if self.next_year > b.years() {
            return None;
        }
        let year = self.next_year;
        self.next_year += 1;

        let months = (year * MONTHS_PER_YEAR).min(b.term_months);
        // `yearly_breakdown` already priced the full term, so no year can fail.
        let projected_value = future_value(b.contribution, b.monthly_rate, months);
        debug_assert!(projected_value.is_ok(), "year {year} failed after validation");
        let projected_value = projected_value.ok()?;
        Some(SipYearPoint {
            year,
            total_invested: b.contribution * Decimal::from(months),
            projected_value,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.breakdown.years() + 1).saturating_sub(self.next_year) as usize;
        (left, Some(left))
    }
}

/// Lazy year-by-year projection for `ceil(term_months / 12)` years; the
/// final year is partial when the term is not a whole number of years.
pub fn yearly_breakdown(
    monthly_contribution: Money,
    monthly_rate: Rate,
    term_months: u32,
) -> FinotesResult<SipYearlyBreakdown> {
    // Validates inputs and proves no year can overflow.
    future_value(monthly_contribution, monthly_rate, term_months)?;
    Ok(SipYearlyBreakdown {
        contribution: monthly_contribution,
        monthly_rate,
        term_months,
    })
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// SIP planner: project a contribution forward, or solve for the
/// contribution a goal needs, with a yearly breakdown.
pub fn project_sip(input: &SipParameters) -> FinotesResult<ComputationOutput<SipOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.annual_return_percent < Decimal::ZERO {
        return Err(FinotesError::invalid(
            "annual_return_percent",
            "Expected return cannot be negative",
        ));
    }
    if input.term_months == 0 {
        return Err(FinotesError::invalid("term_months", "Term must be at least 1 month"));
    }
    if input.term_months > MAX_TERM_MONTHS {
        return Err(FinotesError::invalid(
            "term_months",
            format!("Term cannot exceed {MAX_TERM_MONTHS} months"),
        ));
    }
    match input.mode {
        SipMode::Goal if input.amount <= Decimal::ZERO => {
            return Err(FinotesError::invalid("amount", "Goal amount must be positive"));
        }
        SipMode::Contribution if input.amount < Decimal::ZERO => {
            return Err(FinotesError::invalid("amount", "Contribution cannot be negative"));
        }
        _ => {}
    }
    if input.annual_return_percent.is_zero() {
        warnings.push("Zero expected return: value equals contributions".into());
    }

    let rate = monthly_rate(input.annual_return_percent);
    let n = input.term_months;

    let (contribution, maturity_value) = match input.mode {
        SipMode::Contribution => (input.amount, future_value(input.amount, rate, n)?),
        SipMode::Goal => (required_contribution(input.amount, rate, n)?, input.amount),
    };
    let total_invested = contribution * Decimal::from(n);

    let yearly = yearly_breakdown(contribution, rate, n)?
        .iter()
        .map(|p| SipYearPoint {
            year: p.year,
            total_invested: round_money(p.total_invested),
            projected_value: round_money(p.projected_value),
        })
        .collect();

    let maturity_value = round_money(maturity_value);
    let total_invested = round_money(total_invested);
    let output = SipOutput {
        mode: input.mode,
        monthly_contribution: round_money(contribution),
        maturity_value,
        total_invested,
        wealth_gained: maturity_value - total_invested,
        yearly,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Systematic Investment Plan (annuity due, monthly compounding)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_future_value_known_answer() {
        // 5000/month at 12% p.a. for 10 years ≈ 1,161,695.38
        let fv = future_value(dec!(5000), dec!(0.01), 120).unwrap();
        assert!((fv - dec!(1161695.38)).abs() < dec!(0.01), "got {fv}");
    }

    #[test]
    fn test_zero_rate_is_exact() {
        assert_eq!(future_value(dec!(2500), Decimal::ZERO, 24).unwrap(), dec!(60000));
        assert_eq!(required_contribution(dec!(60000), Decimal::ZERO, 24).unwrap(), dec!(2500));
    }

    #[test]
    fn test_round_trip() {
        for (p, r, n) in [
            (dec!(5000), dec!(0.01), 120),
            (dec!(123.45), dec!(0.005), 37),
            (dec!(1), dec!(0.02), 1),
        ] {
            let fv = future_value(p, r, n).unwrap();
            let back = required_contribution(fv, r, n).unwrap();
            assert!((back - p).abs() < dec!(0.0000001), "{p} -> {back}");
        }
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(future_value(dec!(100), dec!(-0.01), 12).is_err());
        assert!(future_value(dec!(100), dec!(0.01), 0).is_err());
        assert!(required_contribution(Decimal::ZERO, dec!(0.01), 12).is_err());
        assert!(future_value(dec!(100), dec!(0.0000001), u32::MAX).is_err());
        assert!(required_contribution(dec!(100), dec!(0.0000001), u32::MAX).is_err());
    }

    #[test]
    fn test_breakdown_partial_final_year() {
        let b = yearly_breakdown(dec!(100), Decimal::ZERO, 30).unwrap();
        let points: Vec<SipYearPoint> = b.iter().collect();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].total_invested, dec!(1200));
        assert_eq!(points[2].total_invested, dec!(3000));
        assert_eq!(points[2].projected_value, dec!(3000));
    }

    #[test]
    fn test_breakdown_is_restartable() {
        let b = yearly_breakdown(dec!(5000), dec!(0.01), 60).unwrap();
        let first: Vec<_> = b.iter().collect();
        let second: Vec<_> = (&b).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(b.iter().size_hint(), (5, Some(5)));
        for pair in first.windows(2) {
            assert!(pair[1].projected_value > pair[0].projected_value);
        }
    }

    #[test]
    fn test_breakdown_yields_every_year_of_longest_term() {
        let b = yearly_breakdown(dec!(100000), monthly_rate(dec!(30)), MAX_TERM_MONTHS).unwrap();
        assert_eq!(b.years(), 100);
        let points: Vec<SipYearPoint> = b.iter().collect();
        assert_eq!(points.len(), 100);
        assert_eq!(
            points[99].projected_value,
            future_value(dec!(100000), monthly_rate(dec!(30)), MAX_TERM_MONTHS).unwrap()
        );
    }

    #[test]
    fn test_project_goal_mode() {
        let input = SipParameters {
            amount: dec!(1000000),
            annual_return_percent: dec!(12),
            term_months: 120,
            mode: SipMode::Goal,
        };
        let out = project_sip(&input).unwrap().result;
        assert_eq!(out.maturity_value, dec!(1000000));
        assert_eq!(out.monthly_contribution, dec!(4304.05));
        assert_eq!(out.yearly.len(), 10);
        let last = out.yearly.last().unwrap();
        assert!((last.projected_value - dec!(1000000)).abs() < dec!(0.01));
    }

    #[test]
    fn test_project_rejects_bad_goal() {
        let input = SipParameters {
            amount: Decimal::ZERO,
            annual_return_percent: dec!(12),
            term_months: 120,
            mode: SipMode::Goal,
        };
        assert!(project_sip(&input).is_err());
    }

    #[test]
    fn test_project_contribution_mode() {
        let input = SipParameters {
            amount: dec!(5000),
            annual_return_percent: dec!(12),
            term_months: 120,
            mode: SipMode::Contribution,
        };
        let out = project_sip(&input).unwrap();
        let r = &out.result;
        assert_eq!(r.total_invested, dec!(600000));
        assert_eq!(r.wealth_gained, r.maturity_value - r.total_invested);
        assert!(out.warnings.is_empty());
    }
}
