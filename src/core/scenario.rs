//! What-if exploration of exchange-rate moves.
use crate::core::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Shift range offered to users. The functions below accept any finite shift.
pub const PERTURBATION_RANGE: RangeInclusive<f64> = -25.0..=25.0;

/// Upper bound on the number of outcomes a single sweep may produce.
pub const MAX_SWEEP_STEPS: usize = 10_000;

pub fn adjusted_rate(base_rate: f64, perturbation_pct: f64) -> f64 {
    base_rate * (1.0 + perturbation_pct / 100.0)
}

/// `amount × base_rate × (1 + perturbation_pct / 100)`.
pub fn apply_perturbation(amount: f64, base_rate: f64, perturbation_pct: f64) -> f64 {
    amount * adjusted_rate(base_rate, perturbation_pct)
}

pub fn convert(amount: f64, rate: f64) -> f64 {
    amount * rate
}

/// Rate for the opposite direction. Only consistent with a provider's own reverse
/// quote when that provider guarantees reciprocal rates.
pub fn reciprocal(rate: f64) -> Result<f64> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(EngineError::invalid_input(format!(
            "Rate must be positive and finite, got {rate}"
        )));
    }
    Ok(1.0 / rate)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub perturbation_pct: f64,
    pub adjusted_rate: f64,
    pub adjusted_amount: f64,
    /// Difference from the unshifted conversion.
    pub impact: f64,
}

pub fn scenario(amount: f64, base_rate: f64, perturbation_pct: f64) -> ScenarioOutcome {
    let adjusted_amount = apply_perturbation(amount, base_rate, perturbation_pct);
    ScenarioOutcome {
        perturbation_pct,
        adjusted_rate: adjusted_rate(base_rate, perturbation_pct),
        adjusted_amount,
        impact: adjusted_amount - convert(amount, base_rate),
    }
}

/// Outcomes for every `step` across `range`, both ends included.
pub fn scenario_sweep(
    amount: f64,
    base_rate: f64,
    range: RangeInclusive<f64>,
    step: f64,
) -> Result<Vec<ScenarioOutcome>> {
    let (start, end) = (*range.start(), *range.end());
    if !step.is_finite() || step <= 0.0 {
        return Err(EngineError::invalid_input(format!(
            "Step must be positive, got {step}"
        )));
    }
    if !start.is_finite() || !end.is_finite() || start > end {
        return Err(EngineError::invalid_input(format!(
            "Invalid perturbation range {start}..={end}"
        )));
    }

    // Index-based to avoid accumulating float error across steps.
    let steps = ((end - start) / step).floor();
    if !steps.is_finite() || steps >= MAX_SWEEP_STEPS as f64 {
        return Err(EngineError::invalid_input(format!(
            "Sweep over {start}..={end} by {step} exceeds {MAX_SWEEP_STEPS} steps"
        )));
    }
    let count = steps as usize;
    let mut outcomes: Vec<ScenarioOutcome> = (0..=count)
        .map(|i| scenario(amount, base_rate, start + step * i as f64))
        .collect();
    if outcomes.last().is_some_and(|o| o.perturbation_pct < end) {
        outcomes.push(scenario(amount, base_rate, end));
    }
    Ok(outcomes)
}
