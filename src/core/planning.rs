//! Savings-goal planning summary.
use crate::core::error::{EngineError, Result};
use crate::core::growth::estimated_annual_return;
use crate::core::risk::RiskToleranceTier;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsPlan {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub investment: f64,
    pub goal_amount: f64,
    pub tolerance: RiskToleranceTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    Conservative,
    Balanced,
    Aggressive,
}

impl Strategy {
    pub fn for_tolerance(tolerance: RiskToleranceTier) -> Self {
        match tolerance {
            RiskToleranceTier::Low => Strategy::Conservative,
            RiskToleranceTier::Medium => Strategy::Balanced,
            RiskToleranceTier::High => Strategy::Aggressive,
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Strategy::Conservative => {
                "Consider diversifying your investments further to minimize currency risk."
            }
            Strategy::Balanced => {
                "Your balanced approach is suitable for current market conditions. Monitor exchange rates quarterly."
            }
            Strategy::Aggressive => {
                "Your aggressive strategy may benefit from more frequent portfolio rebalancing as currency markets fluctuate."
            }
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Strategy::Conservative => "conservative",
                Strategy::Balanced => "balanced",
                Strategy::Aggressive => "aggressive",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsSummary {
    pub monthly_savings: f64,
    /// `None` when nothing is saved each month.
    pub months_to_goal: Option<u32>,
    pub estimated_return_pct: f64,
    pub yearly_return: f64,
    pub goal_progress_pct: f64,
    pub strategy: Strategy,
}

pub fn summarize(plan: &SavingsPlan) -> Result<SavingsSummary> {
    for (name, value) in [
        ("Monthly income", plan.monthly_income),
        ("Monthly expenses", plan.monthly_expenses),
        ("Investment", plan.investment),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(EngineError::invalid_input(format!(
                "{name} must be a non-negative number, got {value}"
            )));
        }
    }
    if !plan.goal_amount.is_finite() || plan.goal_amount <= 0.0 {
        return Err(EngineError::invalid_input(format!(
            "Goal amount must be positive, got {}",
            plan.goal_amount
        )));
    }

    let monthly_savings = plan.monthly_income - plan.monthly_expenses;
    let months_to_goal = if monthly_savings > 0.0 {
        Some((plan.goal_amount / monthly_savings).ceil() as u32)
    } else {
        None
    };
    let estimated_return_pct = estimated_annual_return(plan.tolerance);

    Ok(SavingsSummary {
        monthly_savings,
        months_to_goal,
        estimated_return_pct,
        yearly_return: plan.investment * estimated_return_pct / 100.0,
        goal_progress_pct: (plan.investment / plan.goal_amount * 100.0).min(100.0),
        strategy: Strategy::for_tolerance(plan.tolerance),
    })
}
