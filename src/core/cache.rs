use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct CacheValue<V> {
    value: V,
    expires_at: Instant,
}

/// Short-lived in-memory cache; every entry expires `ttl` after it was put.
#[derive(Clone)]
pub struct Cache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<HashMap<K, CacheValue<V>>>>,
    ttl: Duration,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.inner.lock().await;
        match cache.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                debug!("Cache HIT for key: {:?}", key);
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!("Cache entry expired for key: {:?}", key);
                cache.remove(key);
                None
            }
            None => {
                debug!("Cache MISS for key: {:?}", key);
                None
            }
        }
    }

    pub async fn put(&self, key: K, value: V) {
        let expires_at = Instant::now() + self.ttl;
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {:?}", key);
        cache.insert(key, CacheValue { value, expires_at });
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
        debug!("Cache CLEAR");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_cache_get_put() {
        let cache = Cache::<String, f64>::new(Duration::from_secs(60));

        assert!(cache.get(&"USD/EUR".to_string()).await.is_none());

        cache.put("USD/EUR".to_string(), 0.92).await;
        assert_eq!(cache.get(&"USD/EUR".to_string()).await, Some(0.92));

        assert!(cache.get(&"USD/GBP".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_ttl_expiration() {
        let cache = Cache::<String, f64>::new(Duration::from_millis(10));

        cache.put("USD/EUR".to_string(), 0.92).await;
        assert_eq!(cache.get(&"USD/EUR".to_string()).await, Some(0.92));

        sleep(Duration::from_millis(20)).await;
        assert!(cache.get(&"USD/EUR".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_clear() {
        let cache = Cache::<(String, String), f64>::new(Duration::from_secs(60));

        cache.put(("USD".to_string(), "EUR".to_string()), 0.92).await;
        cache.put(("USD".to_string(), "JPY".to_string()), 151.3).await;
        cache.clear().await;

        assert!(
            cache
                .get(&("USD".to_string(), "EUR".to_string()))
                .await
                .is_none()
        );
    }
}
