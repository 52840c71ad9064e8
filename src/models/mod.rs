// Canonical transaction model and the aggregate handed to the API layer

use crate::blockchain::chains::ChainId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// A 20-byte account identifier in canonical lowercase hex (`0x` + 40 digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Only called with input already checked by `validation::validate_evm_address`.
    pub(crate) fn from_canonical(canonical: String) -> Self {
        Self(canonical)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transaction normalized out of either provider family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub chain: ChainId,
    pub hash: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub gas_used: u64,
    /// Smallest native unit per gas.
    #[serde(serialize_with = "as_decimal_string")]
    pub gas_price: u128,
    /// Total fee in the smallest native unit.
    #[serde(serialize_with = "as_decimal_string")]
    pub native_fee: u128,
    /// Absent when no price was available for the chain.
    pub usd_fee: Option<f64>,
    pub explorer_url: String,
}

impl TransactionRecord {
    pub fn date(&self) -> NaiveDate {
        self.datetime().date_naive()
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.timestamp, 0).unwrap_or_default()
    }
}

/// Why a chain contributed less than a full result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    ProviderUnavailable,
    TimedOut,
    PriceUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainWarning {
    pub chain: ChainId,
    pub kind: WarningKind,
    pub message: String,
}

/// A transaction as presented to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub record: TransactionRecord,
    /// UTC, `YYYY-MM-DD HH:MM`.
    pub time: String,
    /// Fee in whole native units.
    pub native_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainTransactions {
    pub chain: ChainId,
    pub name: &'static str,
    pub token_symbol: &'static str,
    pub price_usd: Option<f64>,
    pub transactions: Vec<TransactionView>,
}

/// Gas spent on one chain during one UTC day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyChainTotal {
    pub date: NaiveDate,
    pub chain: ChainId,
    pub tx_count: u64,
    pub gas_used: u64,
    #[serde(serialize_with = "as_decimal_string")]
    pub native_fee: u128,
    pub native_amount: f64,
    pub usd_fee: Option<f64>,
}

/// Gas spent across all chains during one UTC day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub tx_count: u64,
    pub gas_used: u64,
    pub usd_fee: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainTotal {
    pub chain: ChainId,
    pub token_symbol: &'static str,
    pub tx_count: u64,
    pub gas_used: u64,
    #[serde(serialize_with = "as_decimal_string")]
    pub native_fee: u128,
    pub native_amount: f64,
    pub usd_fee: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub tx_count: u64,
    pub gas_used: u64,
    /// Absent when no contributing transaction could be priced.
    pub usd_fee: Option<f64>,
    /// False when some transactions could not be priced.
    pub usd_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub address: Address,
    pub window_days: u32,
    pub generated_at: DateTime<Utc>,
    pub chains: Vec<ChainTransactions>,
    pub daily: Vec<DailyChainTotal>,
    pub daily_totals: Vec<DailyTotal>,
    pub chain_totals: Vec<ChainTotal>,
    pub totals: Totals,
    pub warnings: Vec<ChainWarning>,
}

/// Native quantities can exceed what JSON consumers hold exactly in a double.
fn as_decimal_string<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
