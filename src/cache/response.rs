//! Provider response cache implementation using Moka

use super::keys::CacheKey;
use crate::blockchain::chains::ChainId;
use crate::blockchain::client::ProviderError;
use crate::models::{Address, TransactionRecord};
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub type CachedRecords = Arc<Vec<TransactionRecord>>;

/// Normalized provider responses keyed by (address, chain).
///
/// Entries past their TTL are never served. Values are swapped whole, so a
/// reader sees either the previous list or the new one. Expiry runs on
/// moka's monotonic clock, independent of the injected `Clock`.
#[derive(Clone)]
pub struct ResponseCache {
    cache: Cache<CacheKey, CachedRecords>,
}

impl ResponseCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, address: &Address, chain: ChainId) -> Option<CachedRecords> {
        let key = CacheKey::new(address, chain);
        let result = self.cache.get(&key).await;
        if result.is_some() {
            debug!("Cache hit for key: {}", key);
        } else {
            debug!("Cache miss for key: {}", key);
        }
        result
    }

    pub async fn put(&self, address: &Address, chain: ChainId, records: Vec<TransactionRecord>) {
        let key = CacheKey::new(address, chain);
        debug!("Caching {} records for key: {}", records.len(), key);
        self.cache.insert(key, Arc::new(records)).await;
    }

    /// Serve a fresh entry or run `fetch` to fill it.
    ///
    /// Concurrent misses on the same key share one `fetch`; failures are
    /// handed to every waiter and nothing is cached.
    pub async fn get_or_fetch<F>(
        &self,
        address: &Address,
        chain: ChainId,
        fetch: F,
    ) -> Result<CachedRecords, Arc<ProviderError>>
    where
        F: Future<Output = Result<Vec<TransactionRecord>, ProviderError>>,
    {
        let key = CacheKey::new(address, chain);
        let entry = self
            .cache
            .entry(key.clone())
            .or_try_insert_with(async move { fetch.await.map(Arc::new) })
            .await?;

        if entry.is_fresh() {
            debug!("Cache miss for key: {}, stored {} records", key, entry.value().len());
        } else {
            debug!("Cache hit for key: {}", key);
        }
        Ok(entry.into_value())
    }
}
