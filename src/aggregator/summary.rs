//! Pure folding of per-chain results into the response shape

use crate::blockchain::chains::{chain_config, ChainConfig, ChainId};
use crate::blockchain::units::to_whole_units;
use crate::models::{
    Address, AggregateResult, ChainTotal, ChainTransactions, ChainWarning, DailyChainTotal,
    DailyTotal, Totals, TransactionRecord, TransactionView,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// A chain's priced records plus anything that went wrong along the way.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub chain: &'static ChainConfig,
    pub records: Vec<TransactionRecord>,
    pub price_usd: Option<f64>,
    pub warnings: Vec<ChainWarning>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    tx_count: u64,
    gas_used: u64,
    native_fee: u128,
    usd_fee: Option<f64>,
}

impl Bucket {
    fn add(&mut self, record: &TransactionRecord) {
        self.tx_count += 1;
        self.gas_used = self.gas_used.saturating_add(record.gas_used);
        self.native_fee = self.native_fee.saturating_add(record.native_fee);
        self.usd_fee = add_usd(self.usd_fee, record.usd_fee);
    }
}

/// Sum of the present figures; absent stays absent rather than becoming zero.
fn add_usd(total: Option<f64>, fee: Option<f64>) -> Option<f64> {
    match (total, fee) {
        (Some(total), Some(fee)) => Some(total + fee),
        (None, fee) => fee,
        (total, None) => total,
    }
}

/// Fold chain outcomes into an `AggregateResult`.
///
/// Outcomes and records are put into a canonical order first, so the result
/// does not depend on the order chains finished in.
pub fn merge(
    address: Address,
    window_days: u32,
    generated_at: DateTime<Utc>,
    mut outcomes: Vec<ChainOutcome>,
) -> AggregateResult {
    outcomes.sort_by_key(|outcome| outcome.chain.id);
    for outcome in &mut outcomes {
        outcome
            .records
            .sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.hash.cmp(&b.hash)));
    }

    let mut daily: BTreeMap<(NaiveDate, ChainId), Bucket> = BTreeMap::new();
    let mut per_day: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
    let mut chain_totals = Vec::with_capacity(outcomes.len());
    let mut chains = Vec::with_capacity(outcomes.len());
    let mut warnings = Vec::new();
    let mut totals = Totals {
        usd_complete: true,
        ..Totals::default()
    };

    for outcome in outcomes {
        let chain = outcome.chain;
        let mut chain_bucket = Bucket::default();

        for record in &outcome.records {
            let date = record.date();
            daily.entry((date, chain.id)).or_default().add(record);
            per_day.entry(date).or_default().add(record);
            chain_bucket.add(record);
        }

        if chain_bucket.tx_count > 0 && outcome.price_usd.is_none() {
            totals.usd_complete = false;
        }
        totals.tx_count += chain_bucket.tx_count;
        totals.gas_used = totals.gas_used.saturating_add(chain_bucket.gas_used);
        totals.usd_fee = add_usd(totals.usd_fee, chain_bucket.usd_fee);

        chain_totals.push(ChainTotal {
            chain: chain.id,
            token_symbol: chain.native_symbol,
            tx_count: chain_bucket.tx_count,
            gas_used: chain_bucket.gas_used,
            native_fee: chain_bucket.native_fee,
            native_amount: to_whole_units(chain_bucket.native_fee, chain.decimals),
            usd_fee: chain_bucket.usd_fee,
        });

        chains.push(ChainTransactions {
            chain: chain.id,
            name: chain.name,
            token_symbol: chain.native_symbol,
            price_usd: outcome.price_usd,
            transactions: outcome
                .records
                .into_iter()
                .map(|record| view(record, chain))
                .collect(),
        });

        warnings.extend(outcome.warnings);
    }

    let daily = daily
        .into_iter()
        .map(|((date, chain), bucket)| DailyChainTotal {
            date,
            chain,
            tx_count: bucket.tx_count,
            gas_used: bucket.gas_used,
            native_fee: bucket.native_fee,
            native_amount: to_whole_units(bucket.native_fee, chain_config(chain).decimals),
            usd_fee: bucket.usd_fee,
        })
        .collect();

    let daily_totals = per_day
        .into_iter()
        .map(|(date, bucket)| DailyTotal {
            date,
            tx_count: bucket.tx_count,
            gas_used: bucket.gas_used,
            usd_fee: bucket.usd_fee,
        })
        .collect();

    AggregateResult {
        address,
        window_days,
        generated_at,
        chains,
        daily,
        daily_totals,
        chain_totals,
        totals,
        warnings,
    }
}

fn view(record: TransactionRecord, chain: &ChainConfig) -> TransactionView {
    TransactionView {
        time: record.datetime().format("%Y-%m-%d %H:%M").to_string(),
        native_amount: to_whole_units(record.native_fee, chain.decimals),
        record,
    }
}
