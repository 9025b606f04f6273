use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FinotesError;
use crate::FinotesResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Periodic rates expressed as decimals (0.0083 = 0.83% per month).
/// User-facing inputs carry annual percentages instead; see
/// [`crate::time_value::monthly_rate`].
pub type Rate = Decimal;

/// Annual rate as entered by the user (10 = 10% p.a.)
pub type Percent = Decimal;

/// Unit a user-entered loan or investment term is expressed in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermUnit {
    #[default]
    Months,
    Years,
}

impl TermUnit {
    /// Convert a term in this unit to a whole number of months.
    pub fn to_months(self, value: u32) -> FinotesResult<u32> {
        match self {
            TermUnit::Months => Ok(value),
            TermUnit::Years => value
                .checked_mul(12)
                .ok_or_else(|| FinotesError::invalid("term", "Term in years is too large")),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    for w in &warnings {
        log::warn!("{methodology}: {w}");
    }
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit_round_half_up_2dp".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_unit_years_to_months() {
        assert_eq!(TermUnit::Years.to_months(5).unwrap(), 60);
        assert_eq!(TermUnit::Months.to_months(7).unwrap(), 7);
    }

    #[test]
    fn test_term_unit_overflow() {
        assert!(TermUnit::Years.to_months(u32::MAX).is_err());
    }
}
