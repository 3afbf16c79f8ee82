//! Financial computation engine

pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod growth;
pub mod history;
pub mod log;
pub mod planning;
pub mod risk;
pub mod scenario;
pub mod series;

// Re-export main types for cleaner imports
pub use currency::{CurrencyRateProvider, RateTable};
pub use error::{EngineError, Result};
pub use growth::{InvestmentPlan, Projection, TrajectoryPoint};
pub use history::{HistoricalRatePoint, RateSeriesGenerator, SyntheticHistory};
pub use risk::{RiskAssessment, RiskCategory, RiskToleranceTier, VolatilityTier};
