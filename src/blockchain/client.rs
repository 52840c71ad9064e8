use backon::{ExponentialBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{header::HeaderMap, Client, StatusCode};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream request timed out")]
    Timeout,

    #[error("Upstream rate limit exceeded")]
    RateLimited,

    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Provider rejected request: {0}")]
    Api(String),

    #[error("Missing credential for {0}")]
    MissingCredential(&'static str),
}

impl ProviderError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::RateLimited => true,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status >= 500,
            Self::Api(msg) => msg.to_ascii_lowercase().contains("rate limit"),
            Self::Malformed(_) | Self::MissingCredential(_) => false,
        }
    }
}

/// Shared HTTP plumbing for one upstream family: timeout, rate limit, retry.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
    retries: usize,
    label: &'static str,
}

impl HttpClient {
    pub fn new(
        label: &'static str,
        timeout: Duration,
        requests_per_second: u32,
        retries: usize,
    ) -> Result<Self, ProviderError> {
        let inner = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(label, inner, requests_per_second, retries))
    }

    /// Reuse an existing connection pool under a separate rate limit.
    pub fn with_client(
        label: &'static str,
        inner: Client,
        requests_per_second: u32,
        retries: usize,
    ) -> Self {
        // 0 disables limiting
        let limiter = NonZeroU32::new(requests_per_second)
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));

        Self {
            inner,
            limiter,
            retries,
            label,
        }
    }

    /// GET `url` and decode the JSON body, retrying transient failures.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<T, ProviderError> {
        self.get_json_with(url, query, headers, Ok).await
    }

    /// Like `get_json`, with `validate` applied to every decoded body.
    ///
    /// A transient error from `validate` (an in-body throttle answer) is
    /// retried the same way as a transport failure.
    pub async fn get_json_with<T, U, V>(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: HeaderMap,
        validate: V,
    ) -> Result<U, ProviderError>
    where
        T: DeserializeOwned,
        V: Fn(T) -> Result<U, ProviderError>,
    {
        let validate = &validate;
        let attempt = move || {
            let headers = headers.clone();
            async move { self.get_json_once(url, query, headers).await.and_then(validate) }
        };

        attempt
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(250))
                    .with_max_times(self.retries),
            )
            .when(ProviderError::is_transient)
            .notify(|err, after| {
                warn!("{} request failed ({}), retrying in {:?}", self.label, err, after);
            })
            .await
    }

    async fn get_json_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<T, ProviderError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        debug!("{} request to {}", self.label, url);
        let response = self
            .inner
            .get(url)
            .query(query)
            .headers(headers)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { ProviderError::Timeout } else { ProviderError::Http(e) })?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("{} rate limit exceeded", self.label);
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::Malformed(format!("{}: {}", e, snippet(&body))))
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(ProviderError::Timeout.is_transient());
        assert!(ProviderError::RateLimited.is_transient());
        assert!(ProviderError::Status { status: 502, body: String::new() }.is_transient());
        assert!(!ProviderError::Status { status: 404, body: String::new() }.is_transient());
        assert!(ProviderError::Api("Max rate limit reached".to_string()).is_transient());
        assert!(!ProviderError::Api("Invalid API Key".to_string()).is_transient());
        assert!(!ProviderError::Malformed("bad".to_string()).is_transient());
    }

    #[test]
    fn snippet_is_bounded() {
        let long = "x".repeat(1000);
        assert_eq!(snippet(&long).len(), 200);
    }
}
