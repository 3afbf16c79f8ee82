//! Risk scoring for an amount exposed to exchange-rate volatility.
//!
//! `raw = amount × volatility factor / tolerance weight`, clamped to `[0, 100]`. The
//! factor and weight tables are fixed; they are illustrative rather than calibrated and
//! must stay as they are so scores remain comparable.

use crate::core::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

pub const MAX_SCORE: f64 = 100.0;
pub const MEDIUM_RISK_THRESHOLD: f64 = 33.0;
pub const HIGH_RISK_THRESHOLD: f64 = 66.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityTier {
    Low,
    Medium,
    High,
}

impl VolatilityTier {
    pub fn factor(&self) -> f64 {
        match self {
            VolatilityTier::Low => 0.02,
            VolatilityTier::Medium => 0.05,
            VolatilityTier::High => 0.10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskToleranceTier {
    Low,
    Medium,
    High,
}

impl RiskToleranceTier {
    /// Divisor applied to the raw exposure. Low tolerance divides by the largest weight.
    pub fn weight(&self) -> f64 {
        match self {
            RiskToleranceTier::Low => 2.0,
            RiskToleranceTier::Medium => 1.5,
            RiskToleranceTier::High => 1.0,
        }
    }
}

fn parse_tier(s: &str) -> Option<u8> {
    match s.trim().to_lowercase().as_str() {
        "low" => Some(0),
        "medium" => Some(1),
        "high" => Some(2),
        _ => None,
    }
}

impl FromStr for VolatilityTier {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_tier(s) {
            Some(0) => Ok(VolatilityTier::Low),
            Some(1) => Ok(VolatilityTier::Medium),
            Some(2) => Ok(VolatilityTier::High),
            _ => Err(EngineError::invalid_input(format!(
                "Invalid volatility tier: {s}"
            ))),
        }
    }
}

impl FromStr for RiskToleranceTier {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_tier(s) {
            Some(0) => Ok(RiskToleranceTier::Low),
            Some(1) => Ok(RiskToleranceTier::Medium),
            Some(2) => Ok(RiskToleranceTier::High),
            _ => Err(EngineError::invalid_input(format!(
                "Invalid risk tolerance tier: {s}"
            ))),
        }
    }
}

impl Display for VolatilityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                VolatilityTier::Low => "low",
                VolatilityTier::Medium => "medium",
                VolatilityTier::High => "high",
            }
        )
    }
}

impl Display for RiskToleranceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RiskToleranceTier::Low => "low",
                RiskToleranceTier::Medium => "medium",
                RiskToleranceTier::High => "high",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    /// Each band includes its lower bound, so 33 and 66 fall into the higher band.
    pub fn from_score(score: f64) -> Self {
        if score < MEDIUM_RISK_THRESHOLD {
            RiskCategory::Low
        } else if score < HIGH_RISK_THRESHOLD {
            RiskCategory::Medium
        } else {
            RiskCategory::High
        }
    }
}

impl Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RiskCategory::Low => "Low Risk",
                RiskCategory::Medium => "Medium Risk",
                RiskCategory::High => "High Risk",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub category: RiskCategory,
}

/// Scores an amount. Negative or non-finite amounts are rejected, never clamped.
pub fn score(amount: f64, volatility: VolatilityTier, tolerance: RiskToleranceTier) -> Result<f64> {
    if !amount.is_finite() {
        return Err(EngineError::invalid_input(format!(
            "Amount must be finite, got {amount}"
        )));
    }
    if amount < 0.0 {
        return Err(EngineError::invalid_input(format!(
            "Amount must not be negative, got {amount}"
        )));
    }

    let raw = (amount * volatility.factor()) / tolerance.weight();
    Ok(raw.clamp(0.0, MAX_SCORE))
}

pub fn assess(
    amount: f64,
    volatility: VolatilityTier,
    tolerance: RiskToleranceTier,
) -> Result<RiskAssessment> {
    let score = score(amount, volatility, tolerance)?;
    Ok(RiskAssessment {
        score,
        category: RiskCategory::from_score(score),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_amount_is_low_risk() {
        for vol in [VolatilityTier::Low, VolatilityTier::Medium, VolatilityTier::High] {
            for tol in [
                RiskToleranceTier::Low,
                RiskToleranceTier::Medium,
                RiskToleranceTier::High,
            ] {
                let assessment = assess(0.0, vol, tol).unwrap();
                assert_eq!(assessment.score, 0.0);
                assert_eq!(assessment.category, RiskCategory::Low);
            }
        }
    }

    #[test]
    fn test_large_amount_is_clamped() {
        let assessment = assess(10_000.0, VolatilityTier::Medium, RiskToleranceTier::Medium).unwrap();
        assert_eq!(assessment.score, 100.0);
        assert_eq!(assessment.category, RiskCategory::High);
        assert_eq!(assessment.category.to_string(), "High Risk");
    }

    #[test]
    fn test_small_amount_low_volatility_high_tolerance() {
        let assessment = assess(100.0, VolatilityTier::Low, RiskToleranceTier::High).unwrap();
        assert_relative_eq!(assessment.score, 2.0);
        assert_eq!(assessment.category.to_string(), "Low Risk");
    }

    #[test]
    fn test_medium_band() {
        // 1000 × 0.05 / 1.5 = 33.33
        let assessment = assess(1000.0, VolatilityTier::Medium, RiskToleranceTier::Medium).unwrap();
        assert_relative_eq!(assessment.score, 100.0 / 3.0, epsilon = 1e-9);
        assert_eq!(assessment.category, RiskCategory::Medium);
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(RiskCategory::from_score(32.999), RiskCategory::Low);
        assert_eq!(RiskCategory::from_score(33.0), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_score(65.999), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_score(66.0), RiskCategory::High);
        assert_eq!(RiskCategory::from_score(100.0), RiskCategory::High);
    }

    #[test]
    fn test_rejects_negative_and_non_finite_amounts() {
        for amount in [-0.01, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = score(amount, VolatilityTier::Low, RiskToleranceTier::Low);
            assert!(
                matches!(result, Err(EngineError::InvalidInput(_))),
                "amount {amount} should be rejected"
            );
        }
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("LOW".parse::<VolatilityTier>().unwrap(), VolatilityTier::Low);
        assert_eq!(
            " medium ".parse::<RiskToleranceTier>().unwrap(),
            RiskToleranceTier::Medium
        );
        assert!("extreme".parse::<VolatilityTier>().is_err());
        assert_eq!(VolatilityTier::High.to_string(), "high");
    }

    #[test]
    fn test_volatility_ordering_for_fixed_amount() {
        let tol = RiskToleranceTier::Low;
        let low = score(500.0, VolatilityTier::Low, tol).unwrap();
        let medium = score(500.0, VolatilityTier::Medium, tol).unwrap();
        let high = score(500.0, VolatilityTier::High, tol).unwrap();
        assert!(high >= medium && medium >= low);
    }
}
