//! reqwest-backed [`RemoteFetch`].

use crate::core::{PrefMergeError, RemoteFetch, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Configuration for the HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchConfig {
    /// Connection timeout in seconds.
    pub connection_timeout_secs: u64,
    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            connection_timeout_secs: 10,
            request_timeout_ms: 30000,
            user_agent: concat!("prefmerge/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

pub struct ReqwestFetch {
    client: Client,
}

impl ReqwestFetch {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connection_timeout_secs))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| PrefMergeError::Config(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteFetch for ReqwestFetch {
    async fn get(&self, url: &str) -> Result<String> {
        let fetch_error = |message: String| PrefMergeError::Fetch {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!(
                "{} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }

        response.text().await.map_err(|e| fetch_error(e.to_string()))
    }
}
