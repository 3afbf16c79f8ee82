//! Currency conversion abstractions

use crate::core::error::{EngineError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Latest rates for a base currency, keyed by target code.
pub type RateTable = BTreeMap<String, f64>;

/// Resolves conversion rates between currency codes.
///
/// A rate means "1 unit of base = rate units of target" and is always positive and
/// finite. Implementations must return `1.0` for identical codes without doing I/O.
#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;

    async fn get_all_rates(&self, base: &str) -> Result<RateTable>;
}

#[async_trait]
impl<T: CurrencyRateProvider + ?Sized> CurrencyRateProvider for Arc<T> {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        (**self).get_rate(from, to).await
    }

    async fn get_all_rates(&self, base: &str) -> Result<RateTable> {
        (**self).get_all_rates(base).await
    }
}

pub fn pair_label(base: &str, target: &str) -> String {
    format!("{base}/{target}")
}

/// Upper-cases a code and checks it before any lookup.
///
/// Empty codes cannot be looked up at all and fail with `RateUnavailable`; codes that
/// are not three ASCII letters fail with `InvalidCurrencyPair`.
pub fn normalize_pair(base: &str, target: &str) -> Result<(String, String)> {
    let base = base.trim().to_ascii_uppercase();
    let target = target.trim().to_ascii_uppercase();

    if base.is_empty() || target.is_empty() {
        return Err(EngineError::rate_unavailable(
            pair_label(&base, &target),
            "Currency code must not be empty",
        ));
    }
    if !is_valid_code(&base) || !is_valid_code(&target) {
        return Err(EngineError::InvalidCurrencyPair { base, target });
    }
    Ok((base, target))
}

pub fn normalize_base(base: &str) -> Result<String> {
    let base = base.trim().to_ascii_uppercase();
    if base.is_empty() {
        return Err(EngineError::rate_unavailable(
            pair_label(&base, "*"),
            "Currency code must not be empty",
        ));
    }
    if !is_valid_code(&base) {
        return Err(EngineError::InvalidCurrencyPair {
            target: "*".to_string(),
            base,
        });
    }
    Ok(base)
}

pub fn is_valid_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// A usable rate is positive and finite.
pub fn is_usable_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}
