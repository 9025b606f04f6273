use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::early_payment::{validate_early_payments, EarlyPayment};
use crate::amortization::emi::{LoanParameters, LoanType};
use crate::error::FinotesError;
use crate::time_value::accrue_interest;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinotesResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One month of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub month: u32,
    /// Regular payment made this month (interest + principal portion).
    pub installment: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_payment: Option<Money>,
    pub remaining_balance: Money,
}

/// Effect of the early payments compared with the plain schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarlyPayoffSummary {
    pub months_saved: u32,
    pub interest_saved: Money,
    pub baseline_total_interest: Money,
    pub baseline_total_payment: Money,
}

/// Output of `build_schedule`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_type: Option<LoanType>,
    pub installment: Money,
    pub monthly_rate: Rate,
    pub term_months: u32,
    pub payoff_month: u32,
    pub total_interest: Money,
    pub total_payment: Money,
    pub total_extra_payments: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub early_payoff: Option<EarlyPayoffSummary>,
    pub schedule: Vec<AmortizationRow>,
}

pub(crate) struct ScheduleRun {
    pub rows: Vec<AmortizationRow>,
    pub total_interest: Money,
    pub total_extra: Money,
    pub payoff_month: u32,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Interest and scheduled principal for one month. The nominal final month
/// takes the whole remaining balance so rounding residue never survives
/// the term; earlier months never pay past zero.
pub(crate) fn amortize_month(
    balance: Money,
    rate: Rate,
    installment: Money,
    month: u32,
    term_months: u32,
) -> FinotesResult<(Money, Money)> {
    let interest = accrue_interest(balance, rate)
        .ok_or_else(|| FinotesError::invalid("principal", "Interest exceeds decimal range"))?;
    let principal = if month >= term_months {
        balance
    } else {
        (installment - interest).max(Decimal::ZERO).min(balance)
    };
    Ok((interest, principal))
}

/// Replay the loan with already-validated early payments (ascending month).
pub(crate) fn run_schedule(
    loan: &LoanParameters,
    installment: Money,
    early_payments: &[EarlyPayment],
) -> FinotesResult<ScheduleRun> {
    let rate = loan.monthly_rate();
    let mut rows = Vec::with_capacity(loan.term_months as usize);
    let mut balance = loan.principal;
    let mut total_interest = Decimal::ZERO;
    let mut total_extra = Decimal::ZERO;
    let mut extras = early_payments.iter().peekable();

    for month in 1..=loan.term_months {
        let (interest, principal) = amortize_month(balance, rate, installment, month, loan.term_months)?;
        balance -= principal;
        total_interest += interest;

        let mut extra = Decimal::ZERO;
        while let Some(p) = extras.next_if(|p| p.at_month == month) {
            extra += p.amount;
        }
        balance -= extra;
        total_extra += extra;

        rows.push(AmortizationRow {
            month,
            installment: interest + principal,
            principal_portion: principal,
            interest_portion: interest,
            extra_payment: (!extra.is_zero()).then_some(extra),
            remaining_balance: balance,
        });

        if balance <= Decimal::ZERO {
            break;
        }
    }

    let payoff_month = rows.last().map(|r| r.month).unwrap_or(0);
    Ok(ScheduleRun {
        rows,
        total_interest,
        total_extra,
        payoff_month,
    })
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Build a month-by-month amortization schedule, optionally with lump-sum
/// prepayments. All early payments are validated up front; the first
/// rejected entry (in month order) fails the whole call.
///
/// The installment is fixed from the nominal term; prepayments shorten the
/// schedule instead of lowering the installment.
pub fn build_schedule(
    loan: &LoanParameters,
    early_payments: &[EarlyPayment],
) -> FinotesResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let validation = validate_early_payments(loan, early_payments)?;
    if let Some(rejected) = validation.rejected.first() {
        return Err(rejected.to_error());
    }
    if loan.annual_rate_percent.is_zero() {
        warnings.push("Zero interest rate: installment is principal / term".into());
    }

    let installment = loan.posted_installment()?;
    log::debug!(
        "building schedule: principal={} rate={}% term={} early_payments={}",
        loan.principal,
        loan.annual_rate_percent,
        loan.term_months,
        validation.accepted.len()
    );

    let run = run_schedule(loan, installment, &validation.accepted)?;

    let early_payoff = if validation.accepted.is_empty() {
        None
    } else {
        let baseline = run_schedule(loan, installment, &[])?;
        Some(EarlyPayoffSummary {
            months_saved: loan.term_months - run.payoff_month,
            interest_saved: baseline.total_interest - run.total_interest,
            baseline_total_interest: baseline.total_interest,
            baseline_total_payment: baseline.total_interest + loan.principal,
        })
    };

    let output = AmortizationOutput {
        loan_type: loan.loan_type,
        installment,
        monthly_rate: loan.monthly_rate(),
        term_months: loan.term_months,
        payoff_month: run.payoff_month,
        total_interest: run.total_interest,
        total_payment: run.total_interest + loan.principal,
        total_extra_payments: run.total_extra,
        early_payoff,
        schedule: run.rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-Installment Amortization with Prepayments",
        &serde_json::json!({
            "loan": loan,
            "early_payments": validation.accepted,
            "rounding": "half-up to 2dp per posting",
        }),
        warnings,
        elapsed,
        output,
    ))
}
