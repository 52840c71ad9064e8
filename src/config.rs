// Configuration structure for:
// - Provider credentials and endpoints (from environment variables)
// - Server listening address/port
// - Cache settings (size, TTL, price refresh)
// - Query window, pagination and upstream limits

use crate::blockchain::chains::{ChainConfig, ProviderKind, CHAINS};
use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub etherscan_api_key: Option<String>,
    pub moralis_api_key: Option<String>,
    pub etherscan_api_url: String,
    pub moralis_api_url: String,
    pub coingecko_api_url: String,
    pub ens_fallback_url: String,
    pub request_timeout: Duration,
    pub chain_timeout: Duration,
    pub response_cache_ttl: Duration,
    pub response_cache_capacity: u64,
    pub price_refresh_interval: Duration,
    pub history_days: u32,
    pub page_size: u32,
    pub max_pages: u32,
    /// How far past the wall clock a record may be stamped and still count.
    /// `None` keeps every future-dated record.
    pub future_tolerance: Option<Duration>,
    pub max_concurrent_fetches: usize,
    pub etherscan_rate_limit: u32,
    pub moralis_rate_limit: u32,
    pub upstream_retries: usize,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = parse_var("SERVER_PORT", 5001);
        let etherscan_api_key = non_empty_var("ETHERSCAN_API_KEY");
        let moralis_api_key = non_empty_var("MORALIS_API_KEY");
        let etherscan_api_url = env::var("ETHERSCAN_API_URL")
            .unwrap_or_else(|_| "https://api.etherscan.io/v2/api".to_string());
        let moralis_api_url = env::var("MORALIS_API_URL")
            .unwrap_or_else(|_| "https://deep-index.moralis.io/api/v2.2".to_string());
        let coingecko_api_url = env::var("COINGECKO_API_URL")
            .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".to_string());
        let ens_fallback_url = env::var("ENS_FALLBACK_URL")
            .unwrap_or_else(|_| "https://api.ensideas.com/ens/resolve".to_string());
        let request_timeout = Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 15));
        let chain_timeout = Duration::from_secs(parse_var("CHAIN_TIMEOUT_SECS", 30));
        let response_cache_ttl = Duration::from_secs(parse_var("RESPONSE_CACHE_TTL_SECS", 300));
        let response_cache_capacity = parse_var("RESPONSE_CACHE_CAPACITY", 100);
        let price_refresh_interval = Duration::from_secs(parse_var("PRICE_REFRESH_SECS", 3600));
        let history_days = parse_var("HISTORY_DAYS", 90u32).max(1);
        let page_size = parse_var("PAGE_SIZE", 100u32).max(1);
        let max_pages = parse_var("MAX_PAGES", 5u32).max(1);
        let future_tolerance = match env::var("FUTURE_TOLERANCE_SECS") {
            Ok(v) if v.trim().is_empty() || v.trim().eq_ignore_ascii_case("none") => None,
            Ok(v) => Some(Duration::from_secs(v.trim().parse().unwrap_or(604_800))),
            Err(_) => Some(Duration::from_secs(604_800)),
        };
        let max_concurrent_fetches = parse_var("MAX_CONCURRENT_FETCHES", 8usize).max(1);
        let etherscan_rate_limit = parse_var("ETHERSCAN_RATE_LIMIT", 5);
        let moralis_rate_limit = parse_var("MORALIS_RATE_LIMIT", 25);
        let upstream_retries = parse_var("UPSTREAM_RETRIES", 2);

        Self {
            server_host,
            server_port,
            etherscan_api_key,
            moralis_api_key,
            etherscan_api_url,
            moralis_api_url,
            coingecko_api_url,
            ens_fallback_url,
            request_timeout,
            chain_timeout,
            response_cache_ttl,
            response_cache_capacity,
            price_refresh_interval,
            history_days,
            page_size,
            max_pages,
            future_tolerance,
            max_concurrent_fetches,
            etherscan_rate_limit,
            moralis_rate_limit,
            upstream_retries,
        }
    }

    /// Credential for a provider family, if one was supplied.
    pub fn api_key(&self, provider: ProviderKind) -> Option<&str> {
        match provider {
            ProviderKind::Etherscan => self.etherscan_api_key.as_deref(),
            ProviderKind::Moralis => self.moralis_api_key.as_deref(),
        }
    }

    /// Chains whose provider family has a credential configured.
    pub fn enabled_chains(&self) -> Vec<&'static ChainConfig> {
        CHAINS
            .iter()
            .filter(|chain| self.api_key(chain.provider).is_some())
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 5001,
            etherscan_api_key: None,
            moralis_api_key: None,
            etherscan_api_url: "https://api.etherscan.io/v2/api".to_string(),
            moralis_api_url: "https://deep-index.moralis.io/api/v2.2".to_string(),
            coingecko_api_url: "https://api.coingecko.com/api/v3".to_string(),
            ens_fallback_url: "https://api.ensideas.com/ens/resolve".to_string(),
            request_timeout: Duration::from_secs(15),
            chain_timeout: Duration::from_secs(30),
            response_cache_ttl: Duration::from_secs(300),
            response_cache_capacity: 100,
            price_refresh_interval: Duration::from_secs(3600),
            history_days: 90,
            page_size: 100,
            max_pages: 5,
            future_tolerance: Some(Duration::from_secs(604_800)),
            max_concurrent_fetches: 8,
            etherscan_rate_limit: 5,
            moralis_rate_limit: 25,
            upstream_retries: 2,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
