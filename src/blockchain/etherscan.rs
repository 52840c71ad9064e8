//! Etherscan V2 multichain client: transaction lists, ENS lookups and ETH price

use crate::blockchain::chains::{ChainConfig, ProviderKind};
use crate::blockchain::client::{HttpClient, ProviderError};
use crate::blockchain::source::TransactionSource;
use crate::blockchain::units::{fee_from_components, parse_quantity};
use crate::models::{Address, TransactionRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

const NO_TRANSACTIONS: &str = "No transactions found";

/// Common `{status, message, result}` wrapper of every Etherscan answer.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

impl Envelope {
    fn into_result(self) -> Result<Value, ProviderError> {
        if self.status == "1" {
            return Ok(self.result);
        }
        if self.message.starts_with(NO_TRANSACTIONS) {
            return Ok(Value::Array(Vec::new()));
        }
        let detail = match &self.result {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Err(ProviderError::Api(format!("{} {}", self.message, detail).trim().to_string()))
    }
}

/// Row of `module=account&action=txlist`. Every field arrives as a string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtherscanTx {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub time_stamp: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
    #[serde(default)]
    pub gas_price: Option<String>,
}

/// Derive the fee from its components; rows missing any of them are unusable.
pub fn normalize_transaction(tx: &EtherscanTx, chain: &ChainConfig) -> Option<TransactionRecord> {
    let timestamp = parse_quantity(tx.time_stamp.as_deref()?)?;
    let gas_used = u64::try_from(parse_quantity(tx.gas_used.as_deref()?)?).ok()?;
    let gas_price = parse_quantity(tx.gas_price.as_deref()?)?;
    let native_fee = fee_from_components(gas_used, gas_price)?;
    let hash = tx.hash.clone().unwrap_or_default();

    Some(TransactionRecord {
        chain: chain.id,
        explorer_url: chain.explorer_url(&hash),
        hash,
        timestamp: i64::try_from(timestamp).ok()?,
        gas_used,
        gas_price,
        native_fee,
        usd_fee: None,
    })
}

pub struct EtherscanClient {
    http: HttpClient,
    api_url: String,
    api_key: String,
    page_size: u32,
    max_pages: u32,
}

impl EtherscanClient {
    pub fn new(
        http: HttpClient,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        page_size: u32,
        max_pages: u32,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            api_key: api_key.into(),
            page_size,
            max_pages,
        }
    }

    async fn call(&self, mut params: Vec<(&str, String)>) -> Result<Value, ProviderError> {
        debug!("Etherscan call with params: {:?}", params);
        params.push(("apikey", self.api_key.clone()));
        self.http
            .get_json_with(&self.api_url, &params, HeaderMap::new(), Envelope::into_result)
            .await
    }

    async fn txlist_page(
        &self,
        address: &Address,
        chain: &ChainConfig,
        page: u32,
    ) -> Result<Vec<EtherscanTx>, ProviderError> {
        let result = self
            .call(vec![
                ("chainid", chain.evm_chain_id.to_string()),
                ("module", "account".to_string()),
                ("action", "txlist".to_string()),
                ("address", address.to_string()),
                ("startblock", "0".to_string()),
                ("endblock", "99999999".to_string()),
                ("page", page.to_string()),
                ("offset", self.page_size.to_string()),
                ("sort", "desc".to_string()),
            ])
            .await?;

        serde_json::from_value(result)
            .map_err(|e| ProviderError::Malformed(format!("txlist result: {}", e)))
    }

    /// Resolve an ENS name on mainnet. `Ok(None)` means Etherscan has no record.
    pub async fn resolve_name(&self, name: &str) -> Result<Option<String>, ProviderError> {
        let outcome = self
            .call(vec![
                ("chainid", "1".to_string()),
                ("module", "resolver".to_string()),
                ("action", "resolvename".to_string()),
                ("name", name.to_string()),
            ])
            .await;

        match outcome {
            Ok(Value::String(address)) if !address.is_empty() => Ok(Some(address)),
            Ok(_) => Ok(None),
            Err(ProviderError::Api(msg)) if !rejects_credentials_or_rate(&msg) => {
                debug!("Etherscan could not resolve {}: {}", name, msg);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Spot ETH/USD from `module=stats&action=ethprice`.
    pub async fn eth_price(&self) -> Result<f64, ProviderError> {
        let result = self
            .call(vec![
                ("chainid", "1".to_string()),
                ("module", "stats".to_string()),
                ("action", "ethprice".to_string()),
            ])
            .await?;

        result
            .get("ethusd")
            .and_then(|v| match v {
                Value::String(s) => s.parse::<f64>().ok(),
                other => other.as_f64(),
            })
            .ok_or_else(|| ProviderError::Malformed("ethprice result without ethusd".to_string()))
    }
}

fn rejects_credentials_or_rate(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("api key") || message.contains("rate limit")
}

#[async_trait]
impl TransactionSource for EtherscanClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Etherscan
    }

    async fn fetch_history(
        &self,
        address: &Address,
        chain: &ChainConfig,
        since: DateTime<Utc>,
    ) -> Result<Vec<TransactionRecord>, ProviderError> {
        let since = since.timestamp();
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for page in 1..=self.max_pages {
            let rows = self.txlist_page(address, chain, page).await?;
            let row_count = rows.len();
            let mut oldest = i64::MAX;

            for row in &rows {
                match normalize_transaction(row, chain) {
                    Some(record) => {
                        oldest = oldest.min(record.timestamp);
                        if record.timestamp >= since {
                            records.push(record);
                        }
                    }
                    None => {
                        skipped += 1;
                        warn!("Skipping malformed {} transaction: {:?}", chain.id, row.hash);
                    }
                }
            }

            // Rows come newest first, so a short page or one reaching past the horizon is the last
            if row_count < self.page_size as usize || oldest < since {
                break;
            }
        }

        info!(
            "Etherscan returned {} transactions for {} on {} ({} skipped)",
            records.len(),
            address,
            chain.id,
            skipped
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::chains::{chain_config, ChainId};

    fn row(time_stamp: &str, gas_used: &str, gas_price: &str) -> EtherscanTx {
        EtherscanTx {
            hash: Some("0xfeed".to_string()),
            time_stamp: Some(time_stamp.to_string()),
            gas_used: Some(gas_used.to_string()),
            gas_price: Some(gas_price.to_string()),
        }
    }

    #[test]
    fn fee_is_gas_used_times_price() {
        let eth = chain_config(ChainId::Eth);
        let record = normalize_transaction(&row("1700000000", "21000", "50000000000"), eth).unwrap();

        assert_eq!(record.native_fee, 1_050_000_000_000_000);
        assert_eq!(record.gas_used, 21_000);
        assert_eq!(record.timestamp, 1_700_000_000);
        assert_eq!(record.explorer_url, "https://etherscan.io/tx/0xfeed");
        assert_eq!(record.usd_fee, None);
    }

    #[test]
    fn fee_is_exact_above_u64() {
        let eth = chain_config(ChainId::Eth);
        let price = (u64::MAX as u128).to_string();
        let used = u64::MAX.to_string();
        let record = normalize_transaction(&row("1", &used, &price), eth).unwrap();

        assert_eq!(record.native_fee, u64::MAX as u128 * u64::MAX as u128);
    }

    #[test]
    fn rows_missing_components_are_rejected() {
        let eth = chain_config(ChainId::Eth);
        let mut missing_price = row("1700000000", "21000", "1");
        missing_price.gas_price = None;

        assert!(normalize_transaction(&missing_price, eth).is_none());
        assert!(normalize_transaction(&row("soon", "21000", "1"), eth).is_none());
        assert!(normalize_transaction(&EtherscanTx::default(), eth).is_none());
    }

    #[test]
    fn envelope_no_transactions_is_empty_success() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"status":"0","message":"No transactions found","result":[]}"#,
        )
        .unwrap();
        assert_eq!(envelope.into_result().unwrap(), Value::Array(Vec::new()));
    }

    #[test]
    fn envelope_error_carries_reason() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#,
        )
        .unwrap();
        let err = envelope.into_result().unwrap_err();
        assert!(matches!(&err, ProviderError::Api(msg) if msg == "NOTOK Max rate limit reached"));
        assert!(err.is_transient());
    }
}
