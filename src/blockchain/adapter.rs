use crate::blockchain::chains::ChainConfig;
use crate::blockchain::source::TransactionSource;
use crate::cache::ResponseCache;
use crate::clock::Clock;
use crate::models::{Address, ChainWarning, TransactionRecord, WarningKind};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What one chain contributed to an aggregation.
#[derive(Debug, Clone)]
pub struct ChainFetch {
    pub chain: &'static ChainConfig,
    pub records: Vec<TransactionRecord>,
    /// Set when the upstream could not be used; `records` is then empty.
    pub failure: Option<ChainWarning>,
}

impl ChainFetch {
    pub fn failed(chain: &'static ChainConfig, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            chain,
            records: Vec::new(),
            failure: Some(ChainWarning {
                chain: chain.id,
                kind,
                message: message.into(),
            }),
        }
    }
}

/// Binds one chain to the provider family serving it, behind the response cache.
pub struct ProviderAdapter {
    chain: &'static ChainConfig,
    source: Arc<dyn TransactionSource>,
    cache: ResponseCache,
    clock: Arc<dyn Clock>,
    history_days: u32,
    future_tolerance: Option<Duration>,
}

impl ProviderAdapter {
    pub fn new(
        chain: &'static ChainConfig,
        source: Arc<dyn TransactionSource>,
        cache: ResponseCache,
        clock: Arc<dyn Clock>,
        history_days: u32,
        future_tolerance: Option<Duration>,
    ) -> Self {
        Self {
            chain,
            source,
            cache,
            clock,
            history_days,
            future_tolerance,
        }
    }

    pub fn chain(&self) -> &'static ChainConfig {
        self.chain
    }

    /// Transactions of `address` stamped at or after `since`.
    ///
    /// The upstream is always asked for the full history horizon so the
    /// cached response serves any window; the window is applied afterwards.
    /// Upstream failures come back as an empty, annotated result.
    pub async fn fetch_transactions(&self, address: &Address, since: DateTime<Utc>) -> ChainFetch {
        let now = self.clock.now();
        let horizon = now - TimeDelta::days(i64::from(self.history_days));

        let fetched = self
            .cache
            .get_or_fetch(
                address,
                self.chain.id,
                self.source.fetch_history(address, self.chain, horizon),
            )
            .await;

        let cached = match fetched {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "{:?} fetch failed for {} on {}: {}",
                    self.source.provider(),
                    address,
                    self.chain.id,
                    e
                );
                return ChainFetch::failed(self.chain, WarningKind::ProviderUnavailable, e.to_string());
            }
        };

        let since = since.timestamp();
        let latest = self
            .future_tolerance
            .and_then(|tolerance| TimeDelta::from_std(tolerance).ok())
            .map(|tolerance| (now + tolerance).timestamp());

        let mut too_old = 0usize;
        let mut too_new = 0usize;
        let records: Vec<TransactionRecord> = cached
            .iter()
            .filter(|record| {
                if record.timestamp < since {
                    too_old += 1;
                    return false;
                }
                if latest.is_some_and(|latest| record.timestamp > latest) {
                    too_new += 1;
                    debug!("Dropping far-future transaction {} on {}", record.hash, self.chain.id);
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        info!(
            "Processed {} transactions for {} on {}, skipped {} outside window, {} beyond future tolerance",
            records.len(),
            address,
            self.chain.id,
            too_old,
            too_new
        );

        ChainFetch {
            chain: self.chain,
            records,
            failure: None,
        }
    }
}
