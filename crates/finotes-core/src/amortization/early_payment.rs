use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amortization::emi::LoanParameters;
use crate::amortization::schedule::amortize_month;
use crate::error::FinotesError;
use crate::types::Money;
use crate::FinotesResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A lump-sum principal prepayment made together with the installment of
/// `at_month`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyPayment {
    pub amount: Money,
    pub at_month: u32,
}

/// Why an early payment was turned down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    NonPositiveAmount,
    MonthOutOfRange { term_months: u32 },
    /// The loan is already repaid at or before the payment's month.
    AfterPayoff { payoff_month: u32 },
    /// More than the balance left once the month's installment is paid.
    ExceedsBalance { available: Money },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedEarlyPayment {
    pub payment: EarlyPayment,
    pub reason: RejectionReason,
}

impl RejectedEarlyPayment {
    pub fn to_error(&self) -> FinotesError {
        let month = self.payment.at_month;
        match &self.reason {
            RejectionReason::NonPositiveAmount => FinotesError::invalid(
                format!("early_payments[month {month}].amount"),
                "Early payment amount must be positive",
            ),
            RejectionReason::MonthOutOfRange { term_months } => FinotesError::invalid(
                format!("early_payments[month {month}].at_month"),
                format!("Month must be between 1 and {term_months}"),
            ),
            RejectionReason::AfterPayoff { payoff_month } => FinotesError::ConflictingEarlyPayment {
                month,
                payoff_month: *payoff_month,
            },
            RejectionReason::ExceedsBalance { available } => FinotesError::invalid(
                format!("early_payments[month {month}].amount"),
                format!(
                    "Early payment {} exceeds the remaining balance {available}",
                    self.payment.amount
                ),
            ),
        }
    }
}

/// Outcome of the pre-validation pass. Both lists are in ascending month
/// order; entries sharing a month keep their input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EarlyPaymentValidation {
    pub accepted: Vec<EarlyPayment>,
    pub rejected: Vec<RejectedEarlyPayment>,
}

impl EarlyPaymentValidation {
    pub fn is_valid(&self) -> bool {
        self.rejected.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check every early payment against the loan before any schedule is built.
///
/// The plain schedule is replayed month by month with the already-accepted
/// prepayments applied, so each entry is judged against the balance it
/// would actually meet. Rejected entries are skipped and do not affect
/// later ones.
pub fn validate_early_payments(
    loan: &LoanParameters,
    payments: &[EarlyPayment],
) -> FinotesResult<EarlyPaymentValidation> {
    loan.validate()?;
    let rate = loan.monthly_rate();
    let installment = loan.posted_installment()?;

    let mut ordered: Vec<&EarlyPayment> = payments.iter().collect();
    ordered.sort_by_key(|p| p.at_month);

    let mut result = EarlyPaymentValidation::default();
    let mut balance = loan.principal;
    let mut month = 0u32;
    let mut payoff_month: Option<u32> = None;

    for payment in ordered {
        let reject = |reason| RejectedEarlyPayment {
            payment: payment.clone(),
            reason,
        };

        if payment.amount <= Decimal::ZERO {
            result.rejected.push(reject(RejectionReason::NonPositiveAmount));
            continue;
        }
        if payment.at_month == 0 || payment.at_month > loan.term_months {
            result.rejected.push(reject(RejectionReason::MonthOutOfRange {
                term_months: loan.term_months,
            }));
            continue;
        }

        while month < payment.at_month && payoff_month.is_none() {
            month += 1;
            let (_, principal) = amortize_month(balance, rate, installment, month, loan.term_months)?;
            balance -= principal;
            if balance.is_zero() {
                payoff_month = Some(month);
            }
        }

        if let Some(payoff_month) = payoff_month {
            result.rejected.push(reject(RejectionReason::AfterPayoff { payoff_month }));
            continue;
        }
        if payment.amount > balance {
            result.rejected.push(reject(RejectionReason::ExceedsBalance { available: balance }));
            continue;
        }

        balance -= payment.amount;
        result.accepted.push(payment.clone());
        if balance.is_zero() {
            payoff_month = Some(payment.at_month);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn loan() -> LoanParameters {
        LoanParameters::new(dec!(100000), dec!(10), 12)
    }

    fn pay(amount: Decimal, at_month: u32) -> EarlyPayment {
        EarlyPayment { amount, at_month }
    }

    #[test]
    fn test_all_valid_sorted_by_month() {
        let input = vec![pay(dec!(5000), 8), pay(dec!(10000), 3)];
        let v = validate_early_payments(&loan(), &input).unwrap();
        assert!(v.is_valid());
        assert_eq!(v.accepted, vec![pay(dec!(10000), 3), pay(dec!(5000), 8)]);
        // input untouched
        assert_eq!(input[0], pay(dec!(5000), 8));
    }

    #[test]
    fn test_structural_rejections() {
        let input = vec![pay(Decimal::ZERO, 2), pay(dec!(100), 13), pay(dec!(100), 0)];
        let v = validate_early_payments(&loan(), &input).unwrap();
        assert!(v.accepted.is_empty());
        assert_eq!(v.rejected.len(), 3);
        assert_eq!(v.rejected[0].reason, RejectionReason::MonthOutOfRange { term_months: 12 });
        assert_eq!(v.rejected[1].reason, RejectionReason::NonPositiveAmount);
        assert_eq!(v.rejected[2].reason, RejectionReason::MonthOutOfRange { term_months: 12 });
    }

    #[test]
    fn test_exceeds_balance_is_rejected() {
        let v = validate_early_payments(&loan(), &[pay(dec!(150000), 1)]).unwrap();
        assert_eq!(v.rejected.len(), 1);
        match &v.rejected[0].reason {
            RejectionReason::ExceedsBalance { available } => {
                assert!(*available < dec!(100000));
                assert!(*available > dec!(90000));
            }
            other => panic!("unexpected reason {other:?}"),
        }
    }

    #[test]
    fn test_cumulative_amount_checked_within_same_month() {
        // Two payments in month 1: the second only has what the first left.
        let v = validate_early_payments(&loan(), &[pay(dec!(60000), 1), pay(dec!(60000), 1)]).unwrap();
        assert_eq!(v.accepted, vec![pay(dec!(60000), 1)]);
        assert!(matches!(
            v.rejected[0].reason,
            RejectionReason::ExceedsBalance { .. }
        ));
    }

    #[test]
    fn test_payment_after_payoff_conflicts() {
        // Month 2 lump sum clears the loan; month 5 has nothing left to pay.
        let available = {
            let v = validate_early_payments(&loan(), &[pay(dec!(1000000), 2)]).unwrap();
            match &v.rejected[0].reason {
                RejectionReason::ExceedsBalance { available } => *available,
                other => panic!("unexpected reason {other:?}"),
            }
        };

        let v = validate_early_payments(&loan(), &[pay(dec!(500), 5), pay(available, 2)]).unwrap();
        assert_eq!(v.accepted, vec![pay(available, 2)]);
        assert_eq!(v.rejected[0].reason, RejectionReason::AfterPayoff { payoff_month: 2 });
        assert!(matches!(
            v.rejected[0].to_error(),
            FinotesError::ConflictingEarlyPayment { month: 5, payoff_month: 2 }
        ));
    }

    #[test]
    fn test_final_month_payment_conflicts() {
        // The last installment clears the balance, so nothing is left for a prepayment.
        let v = validate_early_payments(&loan(), &[pay(dec!(100), 12)]).unwrap();
        assert_eq!(v.rejected[0].reason, RejectionReason::AfterPayoff { payoff_month: 12 });
    }

    #[test]
    fn test_invalid_loan_propagates() {
        let bad = LoanParameters::new(dec!(-1), dec!(10), 12);
        assert!(validate_early_payments(&bad, &[]).is_err());
    }
}
