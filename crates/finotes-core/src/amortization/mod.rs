pub mod early_payment;
pub mod emi;
pub mod schedule;
