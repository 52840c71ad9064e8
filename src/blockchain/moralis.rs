//! Moralis wallet-history client. Moralis reports the fee already computed.

use crate::blockchain::chains::{ChainConfig, ProviderKind};
use crate::blockchain::client::{HttpClient, ProviderError};
use crate::blockchain::source::TransactionSource;
use crate::blockchain::units::{fee_from_components, parse_decimal_units, parse_quantity};
use crate::models::{Address, TransactionRecord};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct MoralisTx {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub block_timestamp: Option<String>,
    #[serde(default)]
    pub receipt_gas_used: Option<String>,
    /// Gas limit; stands in when the receipt is missing.
    #[serde(default)]
    pub gas: Option<String>,
    #[serde(default)]
    pub gas_price: Option<String>,
    /// Total fee as a decimal string in whole native units.
    #[serde(default)]
    pub transaction_fee: Option<String>,
}

/// Moralis answers either with a cursor page or, on older routes, a bare list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MoralisBody {
    Page {
        #[serde(default)]
        cursor: Option<String>,
        #[serde(default)]
        result: Vec<MoralisTx>,
    },
    Bare(Vec<MoralisTx>),
}

impl MoralisBody {
    fn into_parts(self) -> (Vec<MoralisTx>, Option<String>) {
        match self {
            Self::Page { cursor, result } => (result, cursor.filter(|c| !c.is_empty())),
            Self::Bare(result) => (result, None),
        }
    }
}

/// Take the reported fee when present, otherwise fall back to the components.
pub fn normalize_transaction(tx: &MoralisTx, chain: &ChainConfig) -> Option<TransactionRecord> {
    let timestamp = DateTime::parse_from_rfc3339(tx.block_timestamp.as_deref()?)
        .ok()?
        .timestamp();

    let gas_used = tx
        .receipt_gas_used
        .as_deref()
        .and_then(parse_quantity)
        .filter(|used| *used > 0)
        .or_else(|| tx.gas.as_deref().and_then(parse_quantity))
        .and_then(|used| u64::try_from(used).ok())
        .unwrap_or(0);
    let gas_price = tx.gas_price.as_deref().and_then(parse_quantity);

    // An unreadable reported fee is treated like a missing one
    let reported = tx
        .transaction_fee
        .as_deref()
        .and_then(|fee| parse_decimal_units(fee, chain.decimals));
    let native_fee = match reported {
        Some(fee) => fee,
        None => fee_from_components(gas_used, gas_price?)?,
    };
    let gas_price = gas_price.unwrap_or_else(|| {
        if gas_used == 0 {
            0
        } else {
            native_fee / u128::from(gas_used)
        }
    });
    let hash = tx.hash.clone().unwrap_or_default();

    Some(TransactionRecord {
        chain: chain.id,
        explorer_url: chain.explorer_url(&hash),
        hash,
        timestamp,
        gas_used,
        gas_price,
        native_fee,
        usd_fee: None,
    })
}

pub struct MoralisClient {
    http: HttpClient,
    api_url: String,
    api_key: String,
    page_size: u32,
    max_pages: u32,
}

impl MoralisClient {
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

    fn headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| ProviderError::MissingCredential("Moralis"))?;
        headers.insert("X-API-Key", key);
        Ok(headers)
    }
}

#[async_trait]
impl TransactionSource for MoralisClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Moralis
    }

    async fn fetch_history(
        &self,
        address: &Address,
        chain: &ChainConfig,
        since: DateTime<Utc>,
    ) -> Result<Vec<TransactionRecord>, ProviderError> {
        let moralis_chain = chain.moralis_chain.ok_or_else(|| {
            ProviderError::Api(format!("{} is not served by Moralis", chain.id))
        })?;
        let url = format!("{}/{}", self.api_url.trim_end_matches('/'), address);
        let headers = self.headers()?;
        let from_date = since.to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut records = Vec::new();
        let mut skipped = 0usize;
        let mut cursor: Option<String> = None;

        for _ in 0..self.max_pages {
            let mut query = vec![
                ("chain", moralis_chain.to_string()),
                ("limit", self.page_size.to_string()),
                ("from_date", from_date.clone()),
            ];
            if let Some(cursor) = &cursor {
                query.push(("cursor", cursor.clone()));
            }

            let body: MoralisBody = self.http.get_json(&url, &query, headers.clone()).await?;
            let (rows, next) = body.into_parts();

            for row in &rows {
                match normalize_transaction(row, chain) {
                    Some(record) => records.push(record),
                    None => {
                        skipped += 1;
                        warn!("Skipping malformed {} transaction: {:?}", chain.id, row.hash);
                    }
                }
            }

            match next {
                Some(next) if !rows.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        info!(
            "Moralis returned {} transactions for {} on {} ({} skipped)",
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

    fn base() -> &'static ChainConfig {
        chain_config(ChainId::Base)
    }

    #[test]
    fn reported_fee_is_used_directly() {
        let tx = MoralisTx {
            hash: Some("0xbeef".to_string()),
            block_timestamp: Some("2024-03-01T12:30:00.000Z".to_string()),
            receipt_gas_used: Some("21000".to_string()),
            gas_price: Some("1000000".to_string()),
            transaction_fee: Some("0.000000123".to_string()),
            ..MoralisTx::default()
        };
        let record = normalize_transaction(&tx, base()).unwrap();

        // reported fee wins over gas_used * gas_price
        assert_eq!(record.native_fee, 123_000_000_000);
        assert_eq!(record.gas_price, 1_000_000);
        assert_eq!(record.timestamp, 1_709_296_200);
        assert_eq!(record.explorer_url, "https://basescan.org/tx/0xbeef");
    }

    #[test]
    fn falls_back_to_components_and_gas_limit() {
        let tx = MoralisTx {
            block_timestamp: Some("2024-03-01T00:00:00Z".to_string()),
            receipt_gas_used: Some("0".to_string()),
            gas: Some("30000".to_string()),
            gas_price: Some("2".to_string()),
            ..MoralisTx::default()
        };
        let record = normalize_transaction(&tx, base()).unwrap();

        assert_eq!(record.gas_used, 30_000);
        assert_eq!(record.native_fee, 60_000);
        assert_eq!(record.hash, "");
        assert_eq!(record.explorer_url, "");
    }

    #[test]
    fn unparsable_fee_falls_back_to_components() {
        let tx = MoralisTx {
            block_timestamp: Some("2024-03-01T00:00:00Z".to_string()),
            receipt_gas_used: Some("21000".to_string()),
            gas_price: Some("2".to_string()),
            transaction_fee: Some("n/a".to_string()),
            ..MoralisTx::default()
        };
        let record = normalize_transaction(&tx, base()).unwrap();

        assert_eq!(record.native_fee, 42_000);
        assert_eq!(record.gas_price, 2);
    }

    #[test]
    fn unpriceable_rows_are_rejected() {
        let no_fee = MoralisTx {
            block_timestamp: Some("2024-03-01T00:00:00Z".to_string()),
            receipt_gas_used: Some("21000".to_string()),
            ..MoralisTx::default()
        };
        let bad_time = MoralisTx {
            block_timestamp: Some("yesterday".to_string()),
            transaction_fee: Some("0.1".to_string()),
            ..MoralisTx::default()
        };

        let garbled_fee = MoralisTx {
            block_timestamp: Some("2024-03-01T00:00:00Z".to_string()),
            receipt_gas_used: Some("21000".to_string()),
            transaction_fee: Some("n/a".to_string()),
            ..MoralisTx::default()
        };

        assert!(normalize_transaction(&no_fee, base()).is_none());
        assert!(normalize_transaction(&garbled_fee, base()).is_none());
        assert!(normalize_transaction(&bad_time, base()).is_none());
    }

    #[test]
    fn body_accepts_page_or_bare_list() {
        let page: MoralisBody =
            serde_json::from_str(r#"{"cursor":"abc","page_size":100,"result":[{"hash":"0x1"}]}"#)
                .unwrap();
        let (rows, cursor) = page.into_parts();
        assert_eq!(rows.len(), 1);
        assert_eq!(cursor.as_deref(), Some("abc"));

        let bare: MoralisBody = serde_json::from_str(r#"[{"hash":"0x1"},{"hash":"0x2"}]"#).unwrap();
        let (rows, cursor) = bare.into_parts();
        assert_eq!(rows.len(), 2);
        assert!(cursor.is_none());
    }
}
