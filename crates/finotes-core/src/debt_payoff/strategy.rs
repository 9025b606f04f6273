use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::time_value::monthly_rate;
use crate::types::{Money, Percent, Rate};

/// A revolving balance to be paid down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: String,
    pub name: String,
    pub balance: Money,
    pub annual_rate_percent: Percent,
    pub minimum_payment: Money,
}

impl CreditCard {
    pub fn monthly_rate(&self) -> Rate {
        monthly_rate(self.annual_rate_percent)
    }
}

/// Which card receives the budget left over after minimum payments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoffStrategy {
    /// Highest interest rate first.
    #[default]
    Avalanche,
    /// Smallest balance first.
    Snowball,
}

impl PayoffStrategy {
    fn compare(self, a: &CreditCard, b: &CreditCard) -> Ordering {
        match self {
            PayoffStrategy::Avalanche => b
                .annual_rate_percent
                .cmp(&a.annual_rate_percent)
                .then_with(|| b.balance.cmp(&a.balance)),
            PayoffStrategy::Snowball => a
                .balance
                .cmp(&b.balance)
                .then_with(|| b.annual_rate_percent.cmp(&a.annual_rate_percent)),
        }
    }
}

/// Indices into `cards` in the order the strategy targets them.
/// Remaining ties keep input order.
pub fn payoff_order(cards: &[CreditCard], strategy: PayoffStrategy) -> Vec<usize> {
    let mut order: Vec<usize> = (0..cards.len()).collect();
    order.sort_by(|&a, &b| strategy.compare(&cards[a], &cards[b]));
    order
}
