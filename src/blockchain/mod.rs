pub mod adapter;
pub mod chains;
pub mod client;
pub mod etherscan;
pub mod moralis;
pub mod source;
pub mod units;

// Re-exports for convenience
pub use adapter::{ChainFetch, ProviderAdapter};
pub use chains::{chain_config, ChainConfig, ChainId, ProviderKind, CHAINS};
pub use client::{HttpClient, ProviderError};
pub use etherscan::EtherscanClient;
pub use moralis::MoralisClient;
pub use source::TransactionSource;
