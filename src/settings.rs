//! Runtime settings.
//!
//! Discovery and file loading belong to the embedding layer; the crate
//! only defines the shape and a YAML helper.

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Per-request deadline for subscription fetches, in seconds.
    pub fetch_timeout_secs: u64,
    /// User-Agent sent by the bundled fetcher.
    pub user_agent: String,
    /// Skip TLS verification on subscription fetches. Subscription hosts
    /// are routinely self-signed, matching upstream defaults.
    pub insecure_skip_verify: bool,
    /// TTL for cached conversion responses, in seconds.
    pub cache_ttl_secs: u64,
    pub templates_dir: String,
    pub rules_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            fetch_timeout_secs: 30,
            user_agent: format!("subconv/{}", env!("CARGO_PKG_VERSION")),
            insecure_skip_verify: true,
            cache_ttl_secs: 300,
            templates_dir: "templates".to_string(),
            rules_dir: "rules".to_string(),
        }
    }
}

impl Settings {
    pub fn from_yaml_str(content: &str) -> Result<Settings> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::invalid_request(format!("invalid settings: {}", e)))
    }
}
