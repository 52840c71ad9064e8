use crate::aggregator::Aggregator;
use crate::blockchain::adapter::ProviderAdapter;
use crate::blockchain::chains::{ProviderKind, CHAINS};
use crate::blockchain::client::{HttpClient, ProviderError};
use crate::blockchain::etherscan::EtherscanClient;
use crate::blockchain::moralis::MoralisClient;
use crate::blockchain::source::TransactionSource;
use crate::cache::{PriceCache, ResponseCache};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::price::{CoingeckoClient, PriceFeed};
use crate::resolver::{EnsResolver, IdentifierResolver};
use reqwest::Client;
use std::sync::Arc;
use tracing::{info, warn};

pub struct AppState {
    pub config: Config,
    pub resolver: IdentifierResolver,
    pub aggregator: Aggregator,
}

impl AppState {
    /// Wire the live upstream clients, caches and adapters.
    ///
    /// A chain whose provider has no credential gets no adapter.
    pub fn from_config(config: Config) -> Result<Self, ProviderError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let retries = config.upstream_retries;

        let etherscan = config.etherscan_api_key.as_ref().map(|key| {
            let http = HttpClient::with_client("etherscan", client.clone(), config.etherscan_rate_limit, retries);
            Arc::new(EtherscanClient::new(
                http,
                config.etherscan_api_url.clone(),
                key.clone(),
                config.page_size,
                config.max_pages,
            ))
        });
        let moralis = config.moralis_api_key.as_ref().map(|key| {
            let http = HttpClient::with_client("moralis", client.clone(), config.moralis_rate_limit, retries);
            Arc::new(MoralisClient::new(
                http,
                config.moralis_api_url.clone(),
                key.clone(),
                config.page_size,
                config.max_pages,
            ))
        });

        let response_cache = ResponseCache::new(config.response_cache_capacity, config.response_cache_ttl);
        let mut adapters = Vec::new();
        for chain in CHAINS.iter() {
            let source: Option<Arc<dyn TransactionSource>> = match chain.provider {
                ProviderKind::Etherscan => etherscan.clone().map(|c| c as Arc<dyn TransactionSource>),
                ProviderKind::Moralis => moralis.clone().map(|c| c as Arc<dyn TransactionSource>),
            };
            match source {
                Some(source) => adapters.push(ProviderAdapter::new(
                    chain,
                    source,
                    response_cache.clone(),
                    clock.clone(),
                    config.history_days,
                    config.future_tolerance,
                )),
                None => warn!("No {:?} credential, {} disabled", chain.provider, chain.name),
            }
        }
        info!("{} of {} chains enabled", adapters.len(), CHAINS.len());

        let coingecko = CoingeckoClient::new(
            HttpClient::with_client("coingecko", client.clone(), 0, retries),
            config.coingecko_api_url.clone(),
        );
        let prices = Arc::new(PriceCache::new(
            Arc::new(PriceFeed::new(etherscan.clone(), coingecko)),
            clock.clone(),
            config.price_refresh_interval,
        ));

        let names = EnsResolver::new(
            etherscan,
            HttpClient::with_client("ens", client, 0, retries),
            config.ens_fallback_url.clone(),
        );

        let aggregator = Aggregator::new(
            adapters,
            prices,
            clock,
            config.chain_timeout,
            config.max_concurrent_fetches,
        );

        Ok(Self {
            config,
            resolver: IdentifierResolver::new(Arc::new(names)),
            aggregator,
        })
    }
}
