//! Proxy group model: a named policy over a set of proxies.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupType {
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "url-test")]
    UrlTest,
    #[serde(rename = "fallback")]
    Fallback,
    #[serde(rename = "load-balance")]
    LoadBalance,
    #[serde(rename = "relay")]
    Relay,
}

impl GroupType {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupType::Select => "select",
            GroupType::UrlTest => "url-test",
            GroupType::Fallback => "fallback",
            GroupType::LoadBalance => "load-balance",
            GroupType::Relay => "relay",
        }
    }
}

/// `proxies` holds literal member names (proxy or nested group names).
/// A non-empty `filter` additionally pulls in every proxy whose name
/// contains the filter substring; with no filter, all proxy names are
/// appended by the generators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyGroup {
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: GroupType,
    #[serde(default)]
    pub proxies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub interval: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub tolerance: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl ProxyGroup {
    pub fn new(name: impl Into<String>, group_type: GroupType) -> Self {
        ProxyGroup {
            name: name.into(),
            group_type,
            proxies: Vec::new(),
            url: None,
            interval: 0,
            tolerance: 0,
            filter: None,
            strategy: None,
        }
    }
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}
