//! Native token price cache with lazy hourly refresh

use crate::blockchain::chains::{ChainConfig, ChainId};
use crate::clock::Clock;
use crate::price::{PriceError, PriceQuoteSource};
use chrono::{DateTime, TimeDelta, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

type Refresh = Shared<BoxFuture<'static, Result<f64, String>>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceCacheEntry {
    pub chain: ChainId,
    pub price_usd: f64,
    pub fetched_at: DateTime<Utc>,
}

impl PriceCacheEntry {
    pub fn is_stale(&self, now: DateTime<Utc>, refresh_interval: TimeDelta) -> bool {
        now - self.fetched_at > refresh_interval
    }
}

/// USD prices per chain.
///
/// A stale entry triggers one refetch shared by every concurrent caller for
/// that chain. When the refetch fails the stale price is still served.
pub struct PriceCache {
    source: Arc<dyn PriceQuoteSource>,
    clock: Arc<dyn Clock>,
    refresh_interval: TimeDelta,
    entries: Arc<RwLock<HashMap<ChainId, PriceCacheEntry>>>,
    inflight: Arc<Mutex<HashMap<ChainId, Refresh>>>,
}

impl PriceCache {
    pub fn new(
        source: Arc<dyn PriceQuoteSource>,
        clock: Arc<dyn Clock>,
        refresh_interval: Duration,
    ) -> Self {
        let refresh_interval = TimeDelta::from_std(refresh_interval).unwrap_or(TimeDelta::hours(1));
        Self {
            source,
            clock,
            refresh_interval,
            entries: Arc::new(RwLock::new(HashMap::new())),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get_price(&self, chain: &ChainConfig) -> Result<f64, PriceError> {
        if let Some(price) = self.fresh_price(chain.id).await {
            debug!("Price cache hit for {}: ${}", chain.id, price);
            return Ok(price);
        }

        let refresh = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(&chain.id) {
                Some(refresh) => refresh.clone(),
                None => {
                    // A refresh may have landed while we waited for the lock
                    if let Some(price) = self.fresh_price(chain.id).await {
                        return Ok(price);
                    }
                    let refresh = self.start_refresh(chain);
                    inflight.insert(chain.id, refresh.clone());
                    refresh
                }
            }
        };

        match refresh.await {
            Ok(price) => Ok(price),
            Err(reason) => match self.entry(chain.id).await {
                Some(entry) => {
                    warn!(
                        "Serving stale {} price from {} after refresh failure: {}",
                        chain.id, entry.fetched_at, reason
                    );
                    Ok(entry.price_usd)
                }
                None => Err(PriceError::Unavailable {
                    chain: chain.id,
                    reason,
                }),
            },
        }
    }

    /// Last stored entry for a chain, fresh or not.
    pub async fn entry(&self, chain: ChainId) -> Option<PriceCacheEntry> {
        self.entries.read().await.get(&chain).copied()
    }

    async fn fresh_price(&self, chain: ChainId) -> Option<f64> {
        let now = self.clock.now();
        self.entry(chain)
            .await
            .filter(|entry| !entry.is_stale(now, self.refresh_interval))
            .map(|entry| entry.price_usd)
    }

    fn start_refresh(&self, chain: &ChainConfig) -> Refresh {
        let source = Arc::clone(&self.source);
        let clock = Arc::clone(&self.clock);
        let entries = Arc::clone(&self.entries);
        let inflight = Arc::clone(&self.inflight);
        let chain_id = chain.id;
        let symbol = chain.native_symbol;

        async move {
            info!("Refreshing {} price for {}", symbol, chain_id);
            let result = match source.quote_usd(symbol).await {
                Ok(price) if price.is_finite() && price > 0.0 => {
                    let entry = PriceCacheEntry {
                        chain: chain_id,
                        price_usd: price,
                        fetched_at: clock.now(),
                    };
                    entries.write().await.insert(chain_id, entry);
                    Ok(price)
                }
                Ok(price) => Err(format!("unusable quote {}", price)),
                Err(e) => {
                    warn!("Failed to fetch {} price for {}: {}", symbol, chain_id, e);
                    Err(e.to_string())
                }
            };
            // Entry is written before the slot is released
            inflight.lock().await.remove(&chain_id);
            result
        }
        .boxed()
        .shared()
    }
}
