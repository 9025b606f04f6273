use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinotesError {
    #[error("Invalid parameter: {field} — {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Early payment at month {month} conflicts with payoff: the loan is fully repaid by month {payoff_month}")]
    ConflictingEarlyPayment { month: u32, payoff_month: u32 },

    #[error("Insufficient budget: monthly budget {budget} is below the sum of minimum payments {required}")]
    InsufficientBudget { budget: Decimal, required: Decimal },

    #[error("Non-convergence: {function} did not pay off after {iterations} months (remaining balance: {remaining_balance})")]
    NonConvergence {
        function: String,
        iterations: u32,
        remaining_balance: Decimal,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl FinotesError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FinotesError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for FinotesError {
    fn from(e: serde_json::Error) -> Self {
        FinotesError::SerializationError(e.to_string())
    }
}
