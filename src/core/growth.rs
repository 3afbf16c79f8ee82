//! Compound growth projection for a recurring investment.
//!
//! Contributions are added at the end of every month after that month's growth has
//! been applied. All reported values are denominated in the target currency using a
//! single rate fetched once at the start of the calculation: the rate is frozen for
//! the whole horizon and never re-fetched per month.
use crate::core::currency::{CurrencyRateProvider, is_usable_rate};
use crate::core::error::{EngineError, Result};
use crate::core::risk::RiskToleranceTier;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentPlan {
    pub initial_amount: f64,
    pub monthly_contribution: f64,
    /// Annual return in percent; may be negative.
    pub annual_return_pct: f64,
    pub duration_months: u32,
    pub base_currency: String,
    pub target_currency: String,
}

impl InvestmentPlan {
    pub fn new(
        initial_amount: f64,
        monthly_contribution: f64,
        annual_return_pct: f64,
        duration_months: u32,
        base_currency: &str,
        target_currency: &str,
    ) -> Self {
        Self {
            initial_amount,
            monthly_contribution,
            annual_return_pct,
            duration_months,
            base_currency: base_currency.to_string(),
            target_currency: target_currency.to_string(),
        }
    }

    /// Same plan with a different annual return.
    pub fn with_annual_return(&self, annual_return_pct: f64) -> Self {
        Self {
            annual_return_pct,
            ..self.clone()
        }
    }

    pub fn monthly_rate(&self) -> f64 {
        monthly_rate(self.annual_return_pct)
    }

    pub fn total_contributed(&self) -> f64 {
        self.initial_amount + self.monthly_contribution * f64::from(self.duration_months)
    }

    pub fn validate(&self) -> Result<()> {
        if self.duration_months == 0 {
            return Err(EngineError::invalid_input(
                "Duration must be at least one month",
            ));
        }
        check_amount("Initial amount", self.initial_amount)?;
        check_amount("Monthly contribution", self.monthly_contribution)?;
        if !self.annual_return_pct.is_finite() {
            return Err(EngineError::invalid_input(format!(
                "Annual return must be finite, got {}",
                self.annual_return_pct
            )));
        }
        // Below -100% per month the balance would turn negative.
        if self.monthly_rate() < -1.0 {
            return Err(EngineError::invalid_input(format!(
                "Annual return of {}% implies a monthly loss above 100%",
                self.annual_return_pct
            )));
        }
        if self.base_currency.trim().is_empty() || self.target_currency.trim().is_empty() {
            return Err(EngineError::invalid_input("Currency code must not be empty"));
        }
        Ok(())
    }
}

fn check_amount(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::invalid_input(format!(
            "{name} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub month: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Closed-form future value in the target currency.
    pub future_value: f64,
    pub exchange_rate: f64,
    pub monthly_rate: f64,
    pub trajectory: Vec<TrajectoryPoint>,
}

impl Projection {
    pub fn final_value(&self) -> Option<f64> {
        self.trajectory.last().map(|p| p.value)
    }
}

pub fn monthly_rate(annual_return_pct: f64) -> f64 {
    annual_return_pct / 100.0 / 12.0
}

/// Closed-form future value in the base currency.
pub fn future_value(plan: &InvestmentPlan) -> Result<f64> {
    plan.validate()?;
    Ok(closed_form(plan))
}

fn closed_form(plan: &InvestmentPlan) -> f64 {
    let r = plan.monthly_rate();
    let n = f64::from(plan.duration_months);
    let growth = (1.0 + r).powf(n);

    let contributions = if r == 0.0 {
        plan.monthly_contribution * n
    } else {
        plan.monthly_contribution * ((growth - 1.0) / r)
    };
    plan.initial_amount * growth + contributions
}

/// Month-by-month compounding, each value converted at `exchange_rate`.
pub fn trajectory(plan: &InvestmentPlan, exchange_rate: f64) -> Result<Vec<TrajectoryPoint>> {
    plan.validate()?;
    check_rate(exchange_rate)?;
    Ok(iterate(plan, exchange_rate))
}

fn iterate(plan: &InvestmentPlan, exchange_rate: f64) -> Vec<TrajectoryPoint> {
    let r = plan.monthly_rate();
    let mut cumulative = plan.initial_amount;
    (1..=plan.duration_months)
        .map(|month| {
            cumulative = cumulative * (1.0 + r) + plan.monthly_contribution;
            TrajectoryPoint {
                month,
                value: cumulative * exchange_rate,
            }
        })
        .collect()
}

fn check_rate(exchange_rate: f64) -> Result<()> {
    if !is_usable_rate(exchange_rate) {
        return Err(EngineError::invalid_input(format!(
            "Exchange rate must be positive and finite, got {exchange_rate}"
        )));
    }
    Ok(())
}

/// Projects a plan at an already known exchange rate.
pub fn project(plan: &InvestmentPlan, exchange_rate: f64) -> Result<Projection> {
    plan.validate()?;
    check_rate(exchange_rate)?;

    let future_value = closed_form(plan) * exchange_rate;
    let trajectory = iterate(plan, exchange_rate);
    debug!(
        months = plan.duration_months,
        exchange_rate, future_value, "Projected investment growth"
    );

    Ok(Projection {
        future_value,
        exchange_rate,
        monthly_rate: plan.monthly_rate(),
        trajectory,
    })
}

/// Fetches the base→target rate once and projects the plan with it.
///
/// Input validation runs before the lookup; a failed lookup propagates as
/// `RateUnavailable`.
pub async fn project_future_value(
    plan: &InvestmentPlan,
    provider: &(dyn CurrencyRateProvider + Send + Sync),
) -> Result<Projection> {
    plan.validate()?;
    let rate = provider
        .get_rate(&plan.base_currency, &plan.target_currency)
        .await?;
    project(plan, rate)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionBands {
    pub optimistic: Projection,
    pub expected: Projection,
    pub pessimistic: Projection,
}

/// Expected, optimistic and pessimistic projections at `annual return ± spread_pct`.
/// Checks that `spread_pct` is usable for [`project_bands`] on `plan`, including the
/// pessimistic band's implied return.
pub fn validate_spread(plan: &InvestmentPlan, spread_pct: f64) -> Result<()> {
    if !spread_pct.is_finite() || spread_pct < 0.0 {
        return Err(EngineError::invalid_input(format!(
            "Spread must be a non-negative number, got {spread_pct}"
        )));
    }
    plan.with_annual_return(plan.annual_return_pct - spread_pct).validate()
}

pub fn project_bands(
    plan: &InvestmentPlan,
    exchange_rate: f64,
    spread_pct: f64,
) -> Result<ProjectionBands> {
    validate_spread(plan, spread_pct)?;
    let expected = project(plan, exchange_rate)?;
    let optimistic = project(
        &plan.with_annual_return(plan.annual_return_pct + spread_pct),
        exchange_rate,
    )?;
    let pessimistic = project(
        &plan.with_annual_return(plan.annual_return_pct - spread_pct),
        exchange_rate,
    )?;
    Ok(ProjectionBands {
        optimistic,
        expected,
        pessimistic,
    })
}

/// Annual return in percent assumed for a risk tolerance when planning.
pub fn estimated_annual_return(tolerance: RiskToleranceTier) -> f64 {
    match tolerance {
        RiskToleranceTier::Low => 4.0,
        RiskToleranceTier::Medium => 7.0,
        RiskToleranceTier::High => 10.0,
    }
}
