pub mod coingecko;
pub mod feed;

pub use coingecko::CoingeckoClient;
pub use feed::PriceFeed;

use crate::blockchain::chains::ChainId;
use crate::blockchain::client::ProviderError;
use async_trait::async_trait;
use thiserror::Error;

/// Something that can quote a native token in USD as of now.
#[async_trait]
pub trait PriceQuoteSource: Send + Sync {
    async fn quote_usd(&self, symbol: &str) -> Result<f64, ProviderError>;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PriceError {
    #[error("No USD price available for {chain}: {reason}")]
    Unavailable { chain: ChainId, reason: String },
}
