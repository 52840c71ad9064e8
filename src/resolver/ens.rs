use crate::blockchain::client::{HttpClient, ProviderError};
use crate::blockchain::etherscan::EtherscanClient;
use crate::resolver::{NameResolver, ResolveError};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct FallbackAnswer {
    #[serde(default)]
    address: Option<String>,
}

/// ENS lookup through Etherscan, falling back to a public resolver API.
pub struct EnsResolver {
    etherscan: Option<Arc<EtherscanClient>>,
    http: HttpClient,
    fallback_url: String,
}

impl EnsResolver {
    pub fn new(
        etherscan: Option<Arc<EtherscanClient>>,
        http: HttpClient,
        fallback_url: impl Into<String>,
    ) -> Self {
        Self {
            etherscan,
            http,
            fallback_url: fallback_url.into(),
        }
    }

    async fn resolve_with_fallback(&self, name: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/{}", self.fallback_url.trim_end_matches('/'), name);
        match self.http.get_json::<FallbackAnswer>(&url, &[], HeaderMap::new()).await {
            Ok(answer) => Ok(answer.address.filter(|a| !a.is_empty())),
            // the public resolver answers unknown names with 404
            Err(ProviderError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl NameResolver for EnsResolver {
    async fn resolve_name(&self, name: &str) -> Result<Option<String>, ResolveError> {
        let mut failures = Vec::new();
        let mut answered = false;

        if let Some(etherscan) = &self.etherscan {
            match etherscan.resolve_name(name).await {
                Ok(Some(address)) => return Ok(Some(address)),
                Ok(None) => answered = true,
                Err(e) => {
                    warn!("Etherscan ENS lookup failed for {}: {}", name, e);
                    failures.push(format!("etherscan: {}", e));
                }
            }
        }

        debug!("Trying fallback resolver for {}", name);
        match self.resolve_with_fallback(name).await {
            Ok(Some(address)) => return Ok(Some(address)),
            Ok(None) => answered = true,
            Err(e) => {
                warn!("Fallback ENS lookup failed for {}: {}", name, e);
                failures.push(format!("fallback: {}", e));
            }
        }

        if answered {
            Ok(None)
        } else {
            Err(ResolveError::UpstreamUnavailable(failures.join("; ")))
        }
    }
}
