//! Cache key generation and management

use crate::blockchain::chains::ChainId;
use crate::models::Address;
use std::fmt;

/// Key of a cached provider response.
///
/// Deliberately free of any time window so that one fetch serves every
/// window the caller asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub address: Address,
    pub chain: ChainId,
}

impl CacheKey {
    pub fn new(address: &Address, chain: ChainId) -> Self {
        Self {
            address: address.clone(),
            chain,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx:{}:{}", self.chain, self.address)
    }
}
