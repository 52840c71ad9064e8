use crate::blockchain::client::ProviderError;
use crate::blockchain::etherscan::EtherscanClient;
use crate::price::{CoingeckoClient, PriceQuoteSource};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Etherscan's own ETH quote when a key is configured, CoinGecko otherwise.
pub struct PriceFeed {
    etherscan: Option<Arc<EtherscanClient>>,
    coingecko: CoingeckoClient,
}

impl PriceFeed {
    pub fn new(etherscan: Option<Arc<EtherscanClient>>, coingecko: CoingeckoClient) -> Self {
        Self { etherscan, coingecko }
    }
}

fn usable(price: f64) -> Result<f64, ProviderError> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(ProviderError::Malformed(format!("unusable quote: {}", price)))
    }
}

#[async_trait]
impl PriceQuoteSource for PriceFeed {
    async fn quote_usd(&self, symbol: &str) -> Result<f64, ProviderError> {
        if symbol.eq_ignore_ascii_case("ETH") {
            if let Some(etherscan) = &self.etherscan {
                match etherscan.eth_price().await.and_then(usable) {
                    Ok(price) => {
                        info!("Price for {} from Etherscan: ${}", symbol, price);
                        return Ok(price);
                    }
                    Err(e) => warn!("Etherscan ETH price failed, trying CoinGecko: {}", e),
                }
            }
        }

        let price = self.coingecko.quote_usd(symbol).await.and_then(usable)?;
        info!("Price for {} from CoinGecko: ${}", symbol, price);
        Ok(price)
    }
}
