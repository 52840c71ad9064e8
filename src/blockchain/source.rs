use crate::blockchain::chains::{ChainConfig, ProviderKind};
use crate::blockchain::client::ProviderError;
use crate::models::{Address, TransactionRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One upstream family able to list an account's transactions on a chain.
///
/// Implementations return records normalized to the canonical model, with
/// `usd_fee` left empty, covering at least everything since `since`.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    fn provider(&self) -> ProviderKind;

    async fn fetch_history(
        &self,
        address: &Address,
        chain: &ChainConfig,
        since: DateTime<Utc>,
    ) -> Result<Vec<TransactionRecord>, ProviderError>;
}
