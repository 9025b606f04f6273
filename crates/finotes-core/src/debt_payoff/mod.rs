pub mod simulator;
pub mod strategy;
