//! Content fetcher contract and the bundled HTTP implementation.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::settings::Settings;

/// URL → bytes. Implementations must be safe for concurrent use; the
/// orchestrator fans one task out per source URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>>;

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

/// `reqwest`-backed fetcher. Carries the configured timeout, user agent
/// and TLS-verification policy; non-200 responses surface as
/// `FETCH_FAILED`.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.fetch_timeout_secs))
            .user_agent(settings.user_agent.clone())
            .danger_accept_invalid_certs(settings.insecure_skip_verify)
            .build()
            .map_err(|e| Error::internal(format!("failed to build http client: {}", e)))?;
        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch_failed(format!("failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::fetch_failed(format!("HTTP {} from {}", status, url))
                .with_details(serde_json::json!({ "status": status.as_u16(), "url": url })));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::fetch_failed(format!("failed to read body of {}: {}", url, e)))?;
        Ok(body.to_vec())
    }
}
