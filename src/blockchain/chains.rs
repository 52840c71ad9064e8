//! Static catalogue of supported chains and the provider family serving each

use serde::Serialize;
use std::fmt;

/// Chains the service knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    Eth,
    Arbitrum,
    Base,
    Optimism,
    Bsc,
    Polygon,
    Zksync,
    Linea,
}

impl ChainId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eth => "eth",
            Self::Arbitrum => "arbitrum",
            Self::Base => "base",
            Self::Optimism => "optimism",
            Self::Bsc => "bsc",
            Self::Polygon => "polygon",
            Self::Zksync => "zksync",
            Self::Linea => "linea",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which upstream family an adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Etherscan V2 multichain API; reports `gasUsed` and `gasPrice` separately.
    Etherscan,
    /// Moralis wallet history API; reports a precomputed `transaction_fee`.
    Moralis,
}

#[derive(Debug)]
pub struct ChainConfig {
    pub id: ChainId,
    pub name: &'static str,
    /// EIP-155 chain id, used as the Etherscan `chainid` selector.
    pub evm_chain_id: u64,
    pub native_symbol: &'static str,
    /// Decimal places of the native unit (18 for wei-based chains).
    pub decimals: u32,
    pub provider: ProviderKind,
    /// Chain selector understood by Moralis, when served by Moralis.
    pub moralis_chain: Option<&'static str>,
    pub explorer_tx_url: &'static str,
}

impl ChainConfig {
    pub fn explorer_url(&self, tx_hash: &str) -> String {
        if tx_hash.is_empty() {
            return String::new();
        }
        format!("{}{}", self.explorer_tx_url, tx_hash)
    }
}

pub static CHAINS: [ChainConfig; 8] = [
    ChainConfig {
        id: ChainId::Eth,
        name: "Ethereum",
        evm_chain_id: 1,
        native_symbol: "ETH",
        decimals: 18,
        provider: ProviderKind::Etherscan,
        moralis_chain: None,
        explorer_tx_url: "https://etherscan.io/tx/",
    },
    ChainConfig {
        id: ChainId::Arbitrum,
        name: "Arbitrum",
        evm_chain_id: 42161,
        native_symbol: "ETH",
        decimals: 18,
        provider: ProviderKind::Etherscan,
        moralis_chain: None,
        explorer_tx_url: "https://arbiscan.io/tx/",
    },
    ChainConfig {
        id: ChainId::Base,
        name: "Base",
        evm_chain_id: 8453,
        native_symbol: "ETH",
        decimals: 18,
        provider: ProviderKind::Moralis,
        moralis_chain: Some("base"),
        explorer_tx_url: "https://basescan.org/tx/",
    },
    ChainConfig {
        id: ChainId::Optimism,
        name: "Optimism",
        evm_chain_id: 10,
        native_symbol: "ETH",
        decimals: 18,
        provider: ProviderKind::Moralis,
        moralis_chain: Some("optimism"),
        explorer_tx_url: "https://optimistic.etherscan.io/tx/",
    },
    ChainConfig {
        id: ChainId::Bsc,
        name: "BSC",
        evm_chain_id: 56,
        native_symbol: "BNB",
        decimals: 18,
        provider: ProviderKind::Etherscan,
        moralis_chain: None,
        explorer_tx_url: "https://bscscan.com/tx/",
    },
    ChainConfig {
        id: ChainId::Polygon,
        name: "Polygon",
        evm_chain_id: 137,
        native_symbol: "MATIC",
        decimals: 18,
        provider: ProviderKind::Etherscan,
        moralis_chain: None,
        explorer_tx_url: "https://polygonscan.com/tx/",
    },
    ChainConfig {
        id: ChainId::Zksync,
        name: "zkSync",
        evm_chain_id: 324,
        native_symbol: "ETH",
        decimals: 18,
        provider: ProviderKind::Etherscan,
        moralis_chain: None,
        explorer_tx_url: "https://explorer.zksync.io/tx/",
    },
    ChainConfig {
        id: ChainId::Linea,
        name: "Linea",
        evm_chain_id: 59144,
        native_symbol: "ETH",
        decimals: 18,
        provider: ProviderKind::Etherscan,
        moralis_chain: None,
        explorer_tx_url: "https://lineascan.build/tx/",
    },
];

/// Look up the static descriptor for a chain.
pub fn chain_config(id: ChainId) -> &'static ChainConfig {
    // CHAINS is declared in ChainId order
    &CHAINS[id as usize]
}
