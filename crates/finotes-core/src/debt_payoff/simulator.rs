use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

use crate::debt_payoff::strategy::{payoff_order, CreditCard, PayoffStrategy};
use crate::error::FinotesError;
use crate::time_value::accrue_interest;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinotesResult;

/// Months a payoff may take before the plan is declared hopeless.
pub const MAX_PAYOFF_MONTHS: u32 = 1000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a multi-card payoff simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtPayoffInput {
    pub cards: Vec<CreditCard>,
    /// Total paid across all cards every month.
    pub monthly_budget: Money,
    #[serde(default)]
    pub strategy: PayoffStrategy,
}

/// One month on one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffPeriod {
    pub month: u32,
    pub remaining_balance: Money,
    pub payment: Money,
    pub interest_paid: Money,
    /// Negative when the payment did not cover the month's interest.
    pub principal_paid: Money,
}

/// Payoff result for a single card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoffPlan {
    pub card_id: String,
    pub name: String,
    pub months_to_payoff: u32,
    pub total_interest_paid: Money,
    pub total_paid: Money,
    pub schedule: Vec<PayoffPeriod>,
}

/// Minimum-payments-only run used as the comparison point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineSummary {
    pub converged: bool,
    /// `None` when minimums never clear every card within the cap.
    pub months_to_payoff: Option<u32>,
    /// Interest over the run (over the capped window if not converged).
    pub total_interest: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardBalance {
    pub card_id: String,
    pub balance: Money,
}

/// Every card's balance at the end of a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub month: u32,
    pub balances: Vec<CardBalance>,
    pub total_balance: Money,
}

/// Output of `simulate_debt_payoff`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtPayoffOutput {
    pub strategy: PayoffStrategy,
    pub monthly_budget: Money,
    /// Card ids in the order the strategy targets them.
    pub payoff_order: Vec<String>,
    /// One plan per input card, in input order.
    pub plans: Vec<PayoffPlan>,
    pub total_interest: Money,
    pub total_paid: Money,
    pub baseline: BaselineSummary,
    pub interest_saved: Money,
    pub time_to_payoff_all_cards: u32,
    pub balance_timeline: Vec<BalanceSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySummary {
    pub strategy: PayoffStrategy,
    pub payoff_order: Vec<String>,
    pub total_interest: Money,
    pub time_to_payoff_all_cards: u32,
}

/// Output of `compare_strategies`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub avalanche: StrategySummary,
    pub snowball: StrategySummary,
    pub recommended: PayoffStrategy,
    /// Snowball interest minus avalanche interest.
    pub interest_difference: Money,
    pub baseline: BaselineSummary,
}

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

struct CardState {
    rate: Rate,
    balance: Money,
    total_interest: Money,
    total_paid: Money,
    months_to_payoff: u32,
    schedule: Vec<PayoffPeriod>,
}

struct Simulation {
    cards: Vec<CardState>,
    months: u32,
    converged: bool,
}

impl Simulation {
    fn total_interest(&self) -> Money {
        self.cards.iter().map(|c| c.total_interest).sum()
    }

    fn outstanding(&self) -> Money {
        self.cards.iter().map(|c| c.balance).sum()
    }
}

/// Run the month loop. With a budget, whatever is left after minimums goes
/// to cards in `order`, first remaining card first; without one only
/// minimums are paid. Stops unconverged at the month cap or on overflow.
fn simulate(cards: &[CreditCard], order: &[usize], budget: Option<Money>) -> Simulation {
    let mut states: Vec<CardState> = cards
        .iter()
        .map(|c| CardState {
            rate: c.monthly_rate(),
            balance: c.balance,
            total_interest: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            months_to_payoff: 0,
            schedule: Vec::new(),
        })
        .collect();

    let mut active: Vec<usize> = order
        .iter()
        .copied()
        .filter(|&i| states[i].balance > Decimal::ZERO)
        .collect();
    let mut month = 0u32;

    while !active.is_empty() {
        if month == MAX_PAYOFF_MONTHS {
            return Simulation {
                cards: states,
                months: month,
                converged: false,
            };
        }
        month += 1;

        let mut interest = Vec::with_capacity(active.len());
        let mut owed = Vec::with_capacity(active.len());
        for &i in &active {
            let s = &states[i];
            let accrued = accrue_interest(s.balance, s.rate);
            match accrued.and_then(|a| s.balance.checked_add(a).map(|o| (a, o))) {
                Some((a, o)) => {
                    interest.push(a);
                    owed.push(o);
                }
                None => {
                    log::debug!("balance overflow at month {month}; treating as non-convergent");
                    return Simulation {
                        cards: states,
                        months: month,
                        converged: false,
                    };
                }
            }
        }

        let mut payments: Vec<Money> = active
            .iter()
            .zip(&owed)
            .map(|(&i, &o)| cards[i].minimum_payment.min(o))
            .collect();

        if let Some(budget) = budget {
            let mut pool = budget - payments.iter().copied().sum::<Decimal>();
            for (k, payment) in payments.iter_mut().enumerate() {
                if pool <= Decimal::ZERO {
                    break;
                }
                let extra = pool.min(owed[k] - *payment);
                *payment += extra;
                pool -= extra;
            }
        }

        for (k, &i) in active.iter().enumerate() {
            let s = &mut states[i];
            s.balance = owed[k] - payments[k];
            s.total_interest += interest[k];
            s.total_paid += payments[k];
            s.schedule.push(PayoffPeriod {
                month,
                remaining_balance: s.balance,
                payment: payments[k],
                interest_paid: interest[k],
                principal_paid: payments[k] - interest[k],
            });
            if s.balance <= Decimal::ZERO {
                s.months_to_payoff = month;
            }
        }

        log::trace!(
            "month {month}: paid {} across {} cards",
            payments.iter().copied().sum::<Decimal>(),
            active.len()
        );
        active.retain(|&i| states[i].balance > Decimal::ZERO);
    }

    Simulation {
        cards: states,
        months: month,
        converged: true,
    }
}

fn balance_timeline(cards: &[CreditCard], sim: &Simulation) -> Vec<BalanceSnapshot> {
    (1..=sim.months)
        .map(|month| {
            let balances: Vec<CardBalance> = cards
                .iter()
                .zip(&sim.cards)
                .map(|(card, state)| CardBalance {
                    card_id: card.id.clone(),
                    balance: state
                        .schedule
                        .get(month as usize - 1)
                        .map(|p| p.remaining_balance)
                        .unwrap_or(Decimal::ZERO),
                })
                .collect();
            let total_balance = balances.iter().map(|b| b.balance).sum();
            BalanceSnapshot {
                month,
                balances,
                total_balance,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(input: &DebtPayoffInput) -> FinotesResult<()> {
    if input.cards.is_empty() {
        return Err(FinotesError::invalid("cards", "At least one card is required"));
    }
    let mut ids = HashSet::new();
    for (i, card) in input.cards.iter().enumerate() {
        if !ids.insert(card.id.as_str()) {
            return Err(FinotesError::invalid(
                format!("cards[{i}].id"),
                format!("Duplicate card id '{}'", card.id),
            ));
        }
        if card.balance < Decimal::ZERO {
            return Err(FinotesError::invalid(
                format!("cards[{i}].balance"),
                "Balance cannot be negative",
            ));
        }
        if card.annual_rate_percent < Decimal::ZERO {
            return Err(FinotesError::invalid(
                format!("cards[{i}].annual_rate_percent"),
                "Interest rate cannot be negative",
            ));
        }
        if card.minimum_payment < Decimal::ZERO {
            return Err(FinotesError::invalid(
                format!("cards[{i}].minimum_payment"),
                "Minimum payment cannot be negative",
            ));
        }
    }

    let required: Money = input
        .cards
        .iter()
        .filter(|c| c.balance > Decimal::ZERO)
        .map(|c| c.minimum_payment)
        .sum();
    if input.monthly_budget < required {
        return Err(FinotesError::InsufficientBudget {
            budget: input.monthly_budget,
            required,
        });
    }
    // Only reachable when no card needs a minimum.
    if input.monthly_budget <= Decimal::ZERO {
        return Err(FinotesError::invalid("monthly_budget", "Monthly budget must be positive"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

fn run_baseline(input: &DebtPayoffInput, warnings: &mut Vec<String>) -> BaselineSummary {
    let order: Vec<usize> = (0..input.cards.len()).collect();
    let sim = simulate(&input.cards, &order, None);
    if !sim.converged {
        warnings.push(format!(
            "Minimum payments alone do not clear the cards within {MAX_PAYOFF_MONTHS} months; \
             baseline interest covers the capped window only"
        ));
    }
    BaselineSummary {
        converged: sim.converged,
        months_to_payoff: sim.converged.then_some(sim.months),
        total_interest: sim.total_interest(),
    }
}

fn run_strategy(
    input: &DebtPayoffInput,
    strategy: PayoffStrategy,
    baseline: BaselineSummary,
) -> FinotesResult<DebtPayoffOutput> {
    let order = payoff_order(&input.cards, strategy);
    log::debug!(
        "simulating {strategy:?} payoff: {} cards, budget {}",
        input.cards.len(),
        input.monthly_budget
    );

    let sim = simulate(&input.cards, &order, Some(input.monthly_budget));
    if !sim.converged {
        return Err(FinotesError::NonConvergence {
            function: format!("{strategy:?} payoff"),
            iterations: sim.months,
            remaining_balance: sim.outstanding(),
        });
    }

    let total_interest = sim.total_interest();
    let total_paid = sim.cards.iter().map(|c| c.total_paid).sum();
    let time_to_payoff_all_cards = sim.cards.iter().map(|c| c.months_to_payoff).max().unwrap_or(0);
    let timeline = balance_timeline(&input.cards, &sim);

    let plans = input
        .cards
        .iter()
        .zip(sim.cards)
        .map(|(card, state)| PayoffPlan {
            card_id: card.id.clone(),
            name: card.name.clone(),
            months_to_payoff: state.months_to_payoff,
            total_interest_paid: state.total_interest,
            total_paid: state.total_paid,
            schedule: state.schedule,
        })
        .collect();

    log::debug!("{strategy:?} payoff finished in {time_to_payoff_all_cards} months");

    Ok(DebtPayoffOutput {
        strategy,
        monthly_budget: input.monthly_budget,
        payoff_order: order.iter().map(|&i| input.cards[i].id.clone()).collect(),
        plans,
        total_interest,
        total_paid,
        interest_saved: baseline.total_interest - total_interest,
        baseline,
        time_to_payoff_all_cards,
        balance_timeline: timeline,
    })
}

/// Simulate paying down every card with a fixed monthly budget under the
/// chosen strategy, alongside a minimum-payments-only baseline.
///
/// Each month interest accrues on every open card, each card gets its
/// minimum (never more than it owes), and the rest of the budget goes to
/// cards in strategy order. Paid-off cards free their minimum for the
/// remaining ones, so the budget is spent in full while any card still
/// owes enough to absorb it.
pub fn simulate_debt_payoff(input: &DebtPayoffInput) -> FinotesResult<ComputationOutput<DebtPayoffOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate(input)?;

    for card in input.cards.iter().filter(|c| c.balance.is_zero()) {
        warnings.push(format!("Card '{}' has no balance and is already paid off", card.id));
    }

    let baseline = run_baseline(input, &mut warnings);
    let output = run_strategy(input, input.strategy, baseline)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Credit Card Payoff Simulation (fixed budget, targeted surplus)",
        &serde_json::json!({
            "strategy": input.strategy,
            "monthly_budget": input.monthly_budget.to_string(),
            "cards": input.cards.len(),
            "max_months": MAX_PAYOFF_MONTHS,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Run avalanche and snowball on the same cards and budget and report the
/// cheaper one (avalanche when they cost the same).
pub fn compare_strategies(input: &DebtPayoffInput) -> FinotesResult<ComputationOutput<StrategyComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate(input)?;

    let baseline = run_baseline(input, &mut warnings);
    let summarise = |out: DebtPayoffOutput| StrategySummary {
        strategy: out.strategy,
        payoff_order: out.payoff_order,
        total_interest: out.total_interest,
        time_to_payoff_all_cards: out.time_to_payoff_all_cards,
    };
    let avalanche = summarise(run_strategy(input, PayoffStrategy::Avalanche, baseline.clone())?);
    let snowball = summarise(run_strategy(input, PayoffStrategy::Snowball, baseline.clone())?);

    let recommended = if snowball.total_interest < avalanche.total_interest {
        PayoffStrategy::Snowball
    } else {
        PayoffStrategy::Avalanche
    };
    let output = StrategyComparison {
        interest_difference: snowball.total_interest - avalanche.total_interest,
        avalanche,
        snowball,
        recommended,
        baseline,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Avalanche vs Snowball Comparison",
        &serde_json::json!({
            "monthly_budget": input.monthly_budget.to_string(),
            "cards": input.cards.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn card(id: &str, balance: Decimal, rate: Decimal, min: Decimal) -> CreditCard {
        CreditCard {
            id: id.into(),
            name: format!("Card {id}"),
            balance,
            annual_rate_percent: rate,
            minimum_payment: min,
        }
    }

    fn two_cards(strategy: PayoffStrategy) -> DebtPayoffInput {
        DebtPayoffInput {
            cards: vec![
                card("a", dec!(20000), dec!(30), dec!(600)),
                card("b", dec!(8000), dec!(22), dec!(400)),
            ],
            monthly_budget: dec!(2000),
            strategy,
        }
    }

    #[test]
    fn test_single_card_first_month() {
        let input = DebtPayoffInput {
            cards: vec![card("a", dec!(1200), dec!(12), dec!(50))],
            monthly_budget: dec!(500),
            strategy: PayoffStrategy::Avalanche,
        };
        let out = simulate_debt_payoff(&input).unwrap().result;
        let first = &out.plans[0].schedule[0];
        // 1200 * 1% = 12 interest, 500 paid
        assert_eq!(first.interest_paid, dec!(12));
        assert_eq!(first.payment, dec!(500));
        assert_eq!(first.principal_paid, dec!(488));
        assert_eq!(first.remaining_balance, dec!(712));
        // month 2: 712 + 7.12 -> 500 paid -> 219.12; month 3: 219.12 + 2.19 = 221.31 paid off
        assert_eq!(out.plans[0].months_to_payoff, 3);
        assert_eq!(out.plans[0].schedule[2].payment, dec!(221.31));
        assert_eq!(out.total_interest, dec!(21.31));
        assert_eq!(out.time_to_payoff_all_cards, 3);
    }

    #[test]
    fn test_extra_goes_to_target_card() {
        let out = simulate_debt_payoff(&two_cards(PayoffStrategy::Avalanche)).unwrap().result;
        assert_eq!(out.payoff_order, vec!["a".to_string(), "b".to_string()]);
        // Month 1: b gets only its minimum, a gets the rest of the budget.
        assert_eq!(out.plans[1].schedule[0].payment, dec!(400));
        assert_eq!(out.plans[0].schedule[0].payment, dec!(1600));

        let out = simulate_debt_payoff(&two_cards(PayoffStrategy::Snowball)).unwrap().result;
        assert_eq!(out.payoff_order, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(out.plans[0].schedule[0].payment, dec!(600));
        assert_eq!(out.plans[1].schedule[0].payment, dec!(1400));
    }

    #[test]
    fn test_budget_fully_spent_until_last_month() {
        let out = simulate_debt_payoff(&two_cards(PayoffStrategy::Snowball)).unwrap().result;
        let last = out.time_to_payoff_all_cards;
        for month in 1..last {
            let paid: Decimal = out
                .plans
                .iter()
                .filter_map(|p| p.schedule.get(month as usize - 1))
                .map(|p| p.payment)
                .sum();
            assert_eq!(paid, dec!(2000), "month {month}");
        }
    }

    #[test]
    fn test_balances_reach_zero_and_timeline_adds_up() {
        let out = simulate_debt_payoff(&two_cards(PayoffStrategy::Avalanche)).unwrap().result;
        for plan in &out.plans {
            assert_eq!(plan.schedule.last().unwrap().remaining_balance, Decimal::ZERO);
            assert_eq!(plan.schedule.len() as u32, plan.months_to_payoff);
        }
        assert_eq!(out.balance_timeline.len() as u32, out.time_to_payoff_all_cards);
        for snap in &out.balance_timeline {
            let sum: Decimal = snap.balances.iter().map(|b| b.balance).sum();
            assert_eq!(sum, snap.total_balance);
        }
        assert_eq!(out.balance_timeline.last().unwrap().total_balance, Decimal::ZERO);
    }

    #[test]
    fn test_interest_saved_against_minimums() {
        let out = simulate_debt_payoff(&two_cards(PayoffStrategy::Avalanche)).unwrap().result;
        assert!(out.baseline.converged);
        assert!(out.interest_saved > Decimal::ZERO);
        assert_eq!(out.interest_saved, out.baseline.total_interest - out.total_interest);
        assert!(out.baseline.months_to_payoff.unwrap() > out.time_to_payoff_all_cards);
    }

    #[test]
    fn test_insufficient_budget() {
        let input = DebtPayoffInput {
            cards: vec![
                card("a", dec!(5000), dec!(20), dec!(600)),
                card("b", dec!(3000), dec!(18), dec!(400)),
            ],
            monthly_budget: dec!(900),
            strategy: PayoffStrategy::Avalanche,
        };
        match simulate_debt_payoff(&input) {
            Err(FinotesError::InsufficientBudget { budget, required }) => {
                assert_eq!(budget, dec!(900));
                assert_eq!(required, dec!(1000));
            }
            other => panic!("expected InsufficientBudget, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_budget_is_insufficient_when_minimums_due() {
        let input = DebtPayoffInput {
            cards: vec![card("a", dec!(5000), dec!(20), dec!(1000))],
            monthly_budget: Decimal::ZERO,
            strategy: PayoffStrategy::Avalanche,
        };
        match simulate_debt_payoff(&input) {
            Err(FinotesError::InsufficientBudget { budget, required }) => {
                assert_eq!(budget, Decimal::ZERO);
                assert_eq!(required, dec!(1000));
            }
            other => panic!("expected InsufficientBudget, got {other:?}"),
        }
        assert!(matches!(
            compare_strategies(&input),
            Err(FinotesError::InsufficientBudget { .. })
        ));
    }

    #[test]
    fn test_zero_budget_without_minimums_is_invalid() {
        let input = DebtPayoffInput {
            cards: vec![card("a", dec!(5000), dec!(20), Decimal::ZERO)],
            monthly_budget: Decimal::ZERO,
            strategy: PayoffStrategy::Avalanche,
        };
        assert!(matches!(
            simulate_debt_payoff(&input),
            Err(FinotesError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_non_convergence() {
        let input = DebtPayoffInput {
            cards: vec![card("a", dec!(100000), dec!(50), dec!(10))],
            monthly_budget: dec!(10),
            strategy: PayoffStrategy::Avalanche,
        };
        match simulate_debt_payoff(&input) {
            Err(FinotesError::NonConvergence { iterations, .. }) => {
                assert_eq!(iterations, MAX_PAYOFF_MONTHS)
            }
            other => panic!("expected NonConvergence, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_balance_card_is_already_paid() {
        let input = DebtPayoffInput {
            cards: vec![
                card("a", dec!(1000), dec!(20), dec!(100)),
                card("z", Decimal::ZERO, dec!(25), dec!(5000)),
            ],
            monthly_budget: dec!(300),
            strategy: PayoffStrategy::Snowball,
        };
        let out = simulate_debt_payoff(&input).unwrap();
        let z = &out.result.plans[1];
        assert_eq!(z.months_to_payoff, 0);
        assert!(z.schedule.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_validation_errors() {
        let mut input = two_cards(PayoffStrategy::Avalanche);
        input.cards.clear();
        assert!(matches!(
            simulate_debt_payoff(&input),
            Err(FinotesError::InvalidParameter { .. })
        ));

        let mut input = two_cards(PayoffStrategy::Avalanche);
        input.cards[1].annual_rate_percent = dec!(-1);
        assert!(simulate_debt_payoff(&input).is_err());

        let mut input = two_cards(PayoffStrategy::Avalanche);
        input.cards[1].id = "a".into();
        assert!(simulate_debt_payoff(&input).is_err());

        let mut input = two_cards(PayoffStrategy::Avalanche);
        input.monthly_budget = Decimal::ZERO;
        assert!(simulate_debt_payoff(&input).is_err());
    }

    #[test]
    fn test_baseline_non_convergence_is_a_warning() {
        // Zero minimum never clears on its own, but the budget does.
        let input = DebtPayoffInput {
            cards: vec![card("a", dec!(1000), dec!(20), Decimal::ZERO)],
            monthly_budget: dec!(200),
            strategy: PayoffStrategy::Avalanche,
        };
        let out = simulate_debt_payoff(&input).unwrap();
        assert!(!out.result.baseline.converged);
        assert!(out.result.baseline.months_to_payoff.is_none());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_compare_prefers_avalanche() {
        let cmp = compare_strategies(&two_cards(PayoffStrategy::Snowball)).unwrap().result;
        assert_eq!(cmp.recommended, PayoffStrategy::Avalanche);
        assert!(cmp.avalanche.total_interest <= cmp.snowball.total_interest);
        assert_eq!(
            cmp.interest_difference,
            cmp.snowball.total_interest - cmp.avalanche.total_interest
        );
    }
}
