use crate::blockchain::client::{HttpClient, ProviderError};
use crate::price::PriceQuoteSource;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::collections::HashMap;

/// CoinGecko-backed price source using `/simple/price`.
pub struct CoingeckoClient {
    http: HttpClient,
    api_url: String,
}

impl CoingeckoClient {
    pub fn new(http: HttpClient, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
        }
    }

    /// Map a native token symbol to CoinGecko's asset id.
    pub fn map_symbol_to_id(symbol: &str) -> Option<&'static str> {
        match symbol.to_ascii_uppercase().as_str() {
            "ETH" => Some("ethereum"),
            "BNB" => Some("binancecoin"),
            "MATIC" | "POL" => Some("matic-network"),
            _ => None,
        }
    }
}

#[async_trait]
impl PriceQuoteSource for CoingeckoClient {
    async fn quote_usd(&self, symbol: &str) -> Result<f64, ProviderError> {
        let id = Self::map_symbol_to_id(symbol)
            .ok_or_else(|| ProviderError::Api(format!("unsupported symbol: {}", symbol)))?;

        let url = format!("{}/simple/price", self.api_url.trim_end_matches('/'));
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        // Parse like: { "ethereum": {"usd": 2500.1} }
        let parsed: HashMap<String, HashMap<String, f64>> = self
            .http
            .get_json(
                &url,
                &[("ids", id.to_string()), ("vs_currencies", "usd".to_string())],
                headers,
            )
            .await?;

        parsed
            .get(id)
            .and_then(|quote| quote.get("usd"))
            .copied()
            .ok_or_else(|| ProviderError::Malformed(format!("coingecko: usd missing for {}", id)))
    }
}
