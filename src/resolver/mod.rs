pub mod ens;

pub use ens::EnsResolver;

use crate::models::Address;
use crate::validation::{parse_identifier, validate_evm_address, Identifier, ValidationError};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Unresolvable identifier: {0}")]
    NotFound(String),

    #[error("Name resolution unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// External name → address lookup (ENS and friends).
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// `Ok(None)` when the name has no address.
    async fn resolve_name(&self, name: &str) -> Result<Option<String>, ResolveError>;
}

/// Turns whatever the user typed into a canonical address.
#[derive(Clone)]
pub struct IdentifierResolver {
    names: Arc<dyn NameResolver>,
}

impl IdentifierResolver {
    pub fn new(names: Arc<dyn NameResolver>) -> Self {
        Self { names }
    }

    pub async fn resolve(&self, identifier: &str) -> Result<Address, ResolveError> {
        let name = match parse_identifier(identifier)? {
            Identifier::Address(address) => return Ok(address),
            Identifier::Name(name) => name,
        };

        let resolved = self
            .names
            .resolve_name(&name)
            .await?
            .ok_or_else(|| ResolveError::NotFound(name.clone()))?;

        let address = validate_evm_address(&resolved).map_err(|_| {
            warn!("Resolver returned malformed address for {}: {}", name, resolved);
            ResolveError::UpstreamUnavailable(format!("malformed address for {}", name))
        })?;

        info!("Resolved {} to {}", name, address);
        Ok(address)
    }
}
