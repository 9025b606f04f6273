use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use finotes_core::amortization::early_payment::{self, EarlyPayment};
use finotes_core::amortization::emi::{self, LoanParameters};
use finotes_core::amortization::schedule;
use finotes_core::debt_payoff::simulator::{self, DebtPayoffInput};
use finotes_core::investment::sip::{self, SipParameters};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// `{ "loan": {...}, "early_payments": [...] }`
#[derive(Deserialize)]
struct LoanWithPrepayments {
    loan: LoanParameters,
    #[serde(default)]
    early_payments: Vec<EarlyPayment>,
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_emi(input_json: String) -> NapiResult<String> {
    let input: LoanParameters = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = emi::calculate_emi(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_loan_schedule(input_json: String) -> NapiResult<String> {
    let input: LoanWithPrepayments = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        schedule::build_schedule(&input.loan, &input.early_payments).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn validate_early_payments(input_json: String) -> NapiResult<String> {
    let input: LoanWithPrepayments = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = early_payment::validate_early_payments(&input.loan, &input.early_payments)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Investments
// ---------------------------------------------------------------------------

#[napi]
pub fn project_sip(input_json: String) -> NapiResult<String> {
    let input: SipParameters = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sip::project_sip(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Debt payoff
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_debt_payoff(input_json: String) -> NapiResult<String> {
    let input: DebtPayoffInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = simulator::simulate_debt_payoff(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_payoff_strategies(input_json: String) -> NapiResult<String> {
    let input: DebtPayoffInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = simulator::compare_strategies(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
