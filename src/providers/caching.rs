use crate::core::cache::Cache;
use crate::core::currency::{CurrencyRateProvider, RateTable, normalize_base, normalize_pair};
use crate::core::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Caches successful lookups of an inner provider for a fixed TTL.
///
/// Pairs are keyed by `(base, target)` and tables by base. Failures are never cached.
/// The lock is not held across the inner lookup, so concurrent misses for the same key
/// both go upstream and the later result wins.
pub struct CachingRateProvider<P: CurrencyRateProvider> {
    inner: P,
    pairs: Cache<(String, String), f64>,
    tables: Cache<String, RateTable>,
}

impl<P: CurrencyRateProvider> CachingRateProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            pairs: Cache::new(ttl),
            tables: Cache::new(ttl),
        }
    }

    pub async fn invalidate(&self) {
        self.pairs.clear().await;
        self.tables.clear().await;
    }
}

#[async_trait]
impl<P: CurrencyRateProvider> CurrencyRateProvider for CachingRateProvider<P> {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let (base, target) = normalize_pair(from, to)?;
        if base == target {
            return Ok(1.0);
        }

        let key = (base, target);
        if let Some(rate) = self.pairs.get(&key).await {
            debug!("Cache hit for currency rate: {}/{}", key.0, key.1);
            return Ok(rate);
        }
        debug!("Cache miss for currency rate: {}/{}", key.0, key.1);
        let rate = self.inner.get_rate(&key.0, &key.1).await?;
        self.pairs.put(key, rate).await;
        Ok(rate)
    }

    async fn get_all_rates(&self, base: &str) -> Result<RateTable> {
        let base = normalize_base(base)?;
        if let Some(table) = self.tables.get(&base).await {
            debug!("Cache hit for rate table: {}", base);
            return Ok(table);
        }
        debug!("Cache miss for rate table: {}", base);
        let table = self.inner.get_all_rates(&base).await?;
        self.tables.put(base, table.clone()).await;
        Ok(table)
    }
}
