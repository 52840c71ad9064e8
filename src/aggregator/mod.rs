pub mod summary;

pub use summary::{merge, ChainOutcome};

use crate::blockchain::adapter::{ChainFetch, ProviderAdapter};
use crate::blockchain::chains::{ChainConfig, ChainId};
use crate::cache::PriceCache;
use crate::clock::Clock;
use crate::models::{Address, AggregateResult, ChainWarning, WarningKind};
use chrono::{DateTime, TimeDelta, Utc};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    #[error("All providers unavailable: {0}")]
    AllProvidersUnavailable(String),
}

/// Fans one address out over every requested chain and merges the answers.
pub struct Aggregator {
    adapters: HashMap<ChainId, ProviderAdapter>,
    prices: Arc<PriceCache>,
    clock: Arc<dyn Clock>,
    chain_timeout: Duration,
    max_concurrency: usize,
}

impl Aggregator {
    pub fn new(
        adapters: Vec<ProviderAdapter>,
        prices: Arc<PriceCache>,
        clock: Arc<dyn Clock>,
        chain_timeout: Duration,
        max_concurrency: usize,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.chain().id, adapter))
            .collect();

        Self {
            adapters,
            prices,
            clock,
            chain_timeout,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Chains with a configured adapter, in catalogue order.
    pub fn enabled_chains(&self) -> Vec<&'static ChainConfig> {
        let mut chains: Vec<_> = self.adapters.values().map(ProviderAdapter::chain).collect();
        chains.sort_by_key(|chain| chain.id);
        chains
    }

    pub async fn aggregate(
        &self,
        address: &Address,
        chains: &[&'static ChainConfig],
        window_days: u32,
    ) -> Result<AggregateResult, AggregateError> {
        let now = self.clock.now();
        let since = now - TimeDelta::days(i64::from(window_days));

        let adapters: Vec<&ProviderAdapter> = chains
            .iter()
            .filter_map(|chain| {
                let adapter = self.adapters.get(&chain.id);
                if adapter.is_none() {
                    debug!("No adapter for {}, chain excluded", chain.id);
                }
                adapter
            })
            .collect();

        if adapters.is_empty() {
            return Err(AggregateError::AllProvidersUnavailable(
                "no enabled chains".to_string(),
            ));
        }

        info!(
            "Aggregating {} chains for {} over {} days",
            adapters.len(),
            address,
            window_days
        );

        // Boxed up front; the handler future must stay Send
        let fetches: Vec<BoxFuture<'_, (ChainOutcome, bool)>> = adapters
            .into_iter()
            .map(|adapter| self.fetch_chain(adapter, address, since).boxed())
            .collect();

        let outcomes: Vec<(ChainOutcome, bool)> = stream::iter(fetches)
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        if outcomes.iter().all(|(_, failed)| *failed) {
            let reasons: Vec<String> = outcomes
                .iter()
                .flat_map(|(outcome, _)| outcome.warnings.iter())
                .map(|w| format!("{}: {}", w.chain, w.message))
                .collect();
            warn!("Every provider failed for {}: {:?}", address, reasons);
            return Err(AggregateError::AllProvidersUnavailable(reasons.join("; ")));
        }

        let outcomes = outcomes.into_iter().map(|(outcome, _)| outcome).collect();
        let result = merge(address.clone(), window_days, now, outcomes);
        info!(
            "Aggregated {} transactions for {} ({} warnings)",
            result.totals.tx_count,
            address,
            result.warnings.len()
        );
        Ok(result)
    }

    /// One chain under the per-chain timeout, priced. The flag marks a failed fetch.
    async fn fetch_chain(
        &self,
        adapter: &ProviderAdapter,
        address: &Address,
        since: DateTime<Utc>,
    ) -> (ChainOutcome, bool) {
        let fetch = match timeout(self.chain_timeout, adapter.fetch_transactions(address, since)).await {
            Ok(fetch) => fetch,
            Err(_) => {
                warn!("{} timed out after {:?}", adapter.chain().id, self.chain_timeout);
                ChainFetch::failed(
                    adapter.chain(),
                    WarningKind::TimedOut,
                    format!("no answer within {:?}", self.chain_timeout),
                )
            }
        };
        let failed = fetch.failure.is_some();
        (self.apply_prices(fetch).await, failed)
    }

    /// Attach USD fees; a missing price leaves them absent for the whole chain.
    async fn apply_prices(&self, fetch: ChainFetch) -> ChainOutcome {
        let ChainFetch {
            chain,
            mut records,
            failure,
        } = fetch;
        let mut warnings: Vec<ChainWarning> = failure.into_iter().collect();

        let price_usd = if records.is_empty() {
            None
        } else {
            match self.prices.get_price(chain).await {
                Ok(price) => Some(price),
                Err(e) => {
                    warn!("{}", e);
                    warnings.push(ChainWarning {
                        chain: chain.id,
                        kind: WarningKind::PriceUnavailable,
                        message: e.to_string(),
                    });
                    None
                }
            }
        };

        if let Some(price) = price_usd {
            let scale = 10f64.powi(chain.decimals as i32);
            for record in &mut records {
                record.usd_fee = Some(record.native_fee as f64 / scale * price);
            }
        }

        ChainOutcome {
            chain,
            records,
            price_usd,
            warnings,
        }
    }
}
