//! Error taxonomy for the computation engine.
//!
//! Every engine operation returns [`Result`]. Callers match on the variant to tell
//! "bad argument" apart from "no rate data", which must never be confused with a
//! zero-valued result.

use thiserror::Error;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed or out-of-domain argument.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The upstream lookup failed or returned unusable data.
    #[error("Rate unavailable for {pair}: {reason}")]
    RateUnavailable { pair: String, reason: String },

    /// A currency code is not three alphabetic characters.
    #[error("Invalid currency pair: {base}/{target}")]
    InvalidCurrencyPair { base: String, target: String },
}

impl EngineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }

    pub fn rate_unavailable(pair: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::RateUnavailable {
            pair: pair.into(),
            reason: reason.into(),
        }
    }

    pub fn is_rate_unavailable(&self) -> bool {
        matches!(self, EngineError::RateUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            EngineError::invalid_input("amount must be finite").to_string(),
            "Invalid input: amount must be finite"
        );
        assert_eq!(
            EngineError::rate_unavailable("USD/EUR", "HTTP error: 500").to_string(),
            "Rate unavailable for USD/EUR: HTTP error: 500"
        );
        assert_eq!(
            EngineError::InvalidCurrencyPair {
                base: "US".to_string(),
                target: "EUR".to_string()
            }
            .to_string(),
            "Invalid currency pair: US/EUR"
        );
    }

    #[test]
    fn test_is_rate_unavailable() {
        assert!(EngineError::rate_unavailable("USD/*", "timeout").is_rate_unavailable());
        assert!(!EngineError::invalid_input("x").is_rate_unavailable());
    }
}
