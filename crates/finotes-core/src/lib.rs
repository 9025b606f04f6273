pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "investment")]
pub mod investment;

#[cfg(feature = "debt_payoff")]
pub mod debt_payoff;

pub use error::FinotesError;
pub use types::*;

/// Standard result type for all fiNotes calculations
pub type FinotesResult<T> = Result<T, FinotesError>;
