pub mod caching;
pub mod exchangerate_api;
pub mod refresh;
pub mod util;

use crate::core::config::AppConfig;
use crate::core::currency::CurrencyRateProvider;
use caching::CachingRateProvider;
use exchangerate_api::ExchangeRateApiProvider;
use std::sync::Arc;
use tracing::debug;

/// Builds the configured rate provider, wrapped in a cache when a TTL is set.
pub fn rate_provider_from_config(
    config: &AppConfig,
) -> anyhow::Result<Arc<dyn CurrencyRateProvider + Send + Sync>> {
    let provider = ExchangeRateApiProvider::from_config(config.exchangerate()?)?;
    Ok(match config.cache_ttl() {
        Some(ttl) => {
            debug!("Caching rates for {:?}", ttl);
            Arc::new(CachingRateProvider::new(provider, ttl))
        }
        None => Arc::new(provider),
    })
}
