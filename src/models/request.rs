//! Conversion request/response surface.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::group::ProxyGroup;
use super::proxy::Proxy;

/// A request to convert one or more subscription URLs to a target format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub target: String,
    pub urls: Vec<String>,
    #[serde(default)]
    pub options: ConvertOptions,
}

/// Literal-substring rename applied to proxy names, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameRule {
    #[serde(rename = "match")]
    pub pattern: String,
    pub replace: String,
}

/// Emoji prefixed to names containing the match substring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmojiRule {
    #[serde(rename = "match")]
    pub pattern: String,
    pub emoji: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub include_remarks: Vec<String>,
    pub exclude_remarks: Vec<String>,
    pub rename_rules: Vec<RenameRule>,
    pub emoji_rules: Vec<EmojiRule>,
    pub sort: bool,
    pub udp: bool,
    pub proxy_groups: Vec<ProxyGroup>,
    /// Custom rule lines appended after all ruleset rules.
    pub rules: Vec<String>,
    /// Extra top-level keys merged into structured outputs (Clash).
    pub custom_options: HashMap<String, serde_json::Value>,
    pub base_template: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub config: String,
    pub format: String,
    pub proxies: Vec<Proxy>,
    /// RFC3339 generation timestamp.
    pub generated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub format: String,
    pub proxies_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
