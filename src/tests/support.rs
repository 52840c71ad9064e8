//! Mock collaborators and builders shared by the test modules

use crate::aggregator::Aggregator;
use crate::blockchain::adapter::ProviderAdapter;
use crate::blockchain::chains::{chain_config, ChainConfig, ChainId, ProviderKind};
use crate::blockchain::client::ProviderError;
use crate::blockchain::source::TransactionSource;
use crate::blockchain::units::fee_from_components;
use crate::cache::{PriceCache, ResponseCache};
use crate::clock::Clock;
use crate::models::{Address, TransactionRecord};
use crate::price::PriceQuoteSource;
use crate::resolver::{NameResolver, ResolveError};
use crate::validation::validate_evm_address;
use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ADDRESS: &str = "0x73be3b500f781234b21a348cafaaa23dfff3b1b5";
pub const OTHER_ADDRESS: &str = "0x00000000219ab540356cbb839cbe05303d7705fa";

// 2024-06-01T12:00:00Z
pub const NOW: i64 = 1_717_243_200;
pub const DAY: i64 = 86_400;

pub fn address() -> Address {
    validate_evm_address(ADDRESS).unwrap()
}

pub fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(NOW, 0).unwrap()
}

/// Clock that only moves when told to.
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(now)))
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// A fee-derived record as the Etherscan family would produce it.
pub fn record(chain: ChainId, hash: &str, timestamp: i64, gas_used: u64, gas_price: u128) -> TransactionRecord {
    TransactionRecord {
        chain,
        hash: hash.to_string(),
        timestamp,
        gas_used,
        gas_price,
        native_fee: fee_from_components(gas_used, gas_price).unwrap(),
        usd_fee: None,
        explorer_url: chain_config(chain).explorer_url(hash),
    }
}

/// Scripted transaction source counting its upstream calls.
pub struct MockSource {
    pub calls: AtomicUsize,
    records: Vec<TransactionRecord>,
    fail: AtomicBool,
    delay: Duration,
}

impl MockSource {
    pub fn with_records(records: Vec<TransactionRecord>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            records,
            fail: AtomicBool::new(false),
            delay: Duration::ZERO,
        })
    }

    pub fn delayed(records: Vec<TransactionRecord>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            records,
            fail: AtomicBool::new(false),
            delay,
        })
    }

    pub fn failing() -> Arc<Self> {
        let source = Self::with_records(Vec::new());
        source.fail.store(true, Ordering::SeqCst);
        source
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionSource for MockSource {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Etherscan
    }

    async fn fetch_history(
        &self,
        _address: &Address,
        chain: &ChainConfig,
        _since: DateTime<Utc>,
    ) -> Result<Vec<TransactionRecord>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self
            .records
            .iter()
            .filter(|r| r.chain == chain.id)
            .cloned()
            .collect())
    }
}

/// Price quotes by symbol, with call counting and a failure switch.
pub struct MockPrices {
    pub calls: AtomicUsize,
    prices: HashMap<&'static str, f64>,
    pub fail: AtomicBool,
    delay: Duration,
}

impl MockPrices {
    pub fn new(prices: &[(&'static str, f64)]) -> Arc<Self> {
        Self::delayed(prices, Duration::ZERO)
    }

    pub fn delayed(prices: &[(&'static str, f64)], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            prices: prices.iter().copied().collect(),
            fail: AtomicBool::new(false),
            delay,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceQuoteSource for MockPrices {
    async fn quote_usd(&self, symbol: &str) -> Result<f64, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Timeout);
        }
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| ProviderError::Api(format!("unsupported symbol: {}", symbol)))
    }
}

/// Name table standing in for ENS.
pub struct MockNames {
    names: HashMap<String, String>,
    unavailable: bool,
}

impl MockNames {
    pub fn with(names: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            names: names
                .iter()
                .map(|(name, address)| (name.to_string(), address.to_string()))
                .collect(),
            unavailable: false,
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            names: HashMap::new(),
            unavailable: true,
        })
    }
}

#[async_trait]
impl NameResolver for MockNames {
    async fn resolve_name(&self, name: &str) -> Result<Option<String>, ResolveError> {
        if self.unavailable {
            return Err(ResolveError::UpstreamUnavailable("resolver offline".to_string()));
        }
        Ok(self.names.get(name).cloned())
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub cache: ResponseCache,
    pub prices: Arc<PriceCache>,
    pub future_tolerance: Option<Duration>,
    pub chain_timeout: Duration,
}

impl Harness {
    pub fn new(quotes: Arc<MockPrices>) -> Self {
        let clock = ManualClock::at(now());
        let prices = Arc::new(PriceCache::new(quotes, clock.clone(), Duration::from_secs(3600)));
        Self {
            clock,
            cache: ResponseCache::new(100, Duration::from_secs(60)),
            prices,
            future_tolerance: Some(Duration::from_secs(7 * DAY as u64)),
            chain_timeout: Duration::from_secs(5),
        }
    }

    pub fn adapter(&self, chain: ChainId, source: Arc<MockSource>) -> ProviderAdapter {
        ProviderAdapter::new(
            chain_config(chain),
            source,
            self.cache.clone(),
            self.clock.clone(),
            90,
            self.future_tolerance,
        )
    }

    pub fn aggregator(&self, sources: Vec<(ChainId, Arc<MockSource>)>) -> Aggregator {
        let adapters = sources
            .into_iter()
            .map(|(chain, source)| self.adapter(chain, source))
            .collect();
        Aggregator::new(adapters, self.prices.clone(), self.clock.clone(), self.chain_timeout, 8)
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
