//! Traffic rule model.
//!
//! A `Rule` binds a match pattern to a policy target; a `RuleSet` is an
//! ordered, toggleable bundle of rules with a source label. Order is
//! significant everywhere: generators emit rules exactly as provided.

use serde::{Deserialize, Serialize};

/// Match kind of a rule, spelled the way every client dialect spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKind {
    #[serde(rename = "DOMAIN")]
    Domain,
    #[serde(rename = "DOMAIN-SUFFIX")]
    DomainSuffix,
    #[serde(rename = "DOMAIN-KEYWORD")]
    DomainKeyword,
    #[serde(rename = "IP-CIDR")]
    IpCidr,
    #[serde(rename = "IP-CIDR6")]
    IpCidr6,
    #[serde(rename = "GEOIP")]
    GeoIp,
    #[serde(rename = "USER-AGENT")]
    UserAgent,
    #[serde(rename = "URL-REGEX")]
    UrlRegex,
    #[serde(rename = "FINAL")]
    Final,
    #[serde(rename = "MATCH")]
    Match,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Domain => "DOMAIN",
            RuleKind::DomainSuffix => "DOMAIN-SUFFIX",
            RuleKind::DomainKeyword => "DOMAIN-KEYWORD",
            RuleKind::IpCidr => "IP-CIDR",
            RuleKind::IpCidr6 => "IP-CIDR6",
            RuleKind::GeoIp => "GEOIP",
            RuleKind::UserAgent => "USER-AGENT",
            RuleKind::UrlRegex => "URL-REGEX",
            RuleKind::Final => "FINAL",
            RuleKind::Match => "MATCH",
        }
    }

    pub fn from_tag(tag: &str) -> Option<RuleKind> {
        Some(match tag {
            "DOMAIN" => RuleKind::Domain,
            "DOMAIN-SUFFIX" => RuleKind::DomainSuffix,
            "DOMAIN-KEYWORD" => RuleKind::DomainKeyword,
            "IP-CIDR" => RuleKind::IpCidr,
            "IP-CIDR6" => RuleKind::IpCidr6,
            "GEOIP" => RuleKind::GeoIp,
            "USER-AGENT" => RuleKind::UserAgent,
            "URL-REGEX" => RuleKind::UrlRegex,
            "FINAL" => RuleKind::Final,
            "MATCH" => RuleKind::Match,
            _ => return None,
        })
    }

    /// Terminal kinds carry no match value, only a target.
    pub fn is_terminal(self) -> bool {
        matches!(self, RuleKind::Final | RuleKind::Match)
    }

    /// IP kinds may carry the `no-resolve` flag.
    pub fn is_ip(self) -> bool {
        matches!(self, RuleKind::IpCidr | RuleKind::IpCidr6 | RuleKind::GeoIp)
    }
}

/// A single pattern-to-target binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub kind: RuleKind,
    #[serde(default)]
    pub value: String,
    pub target: String,
    #[serde(rename = "no-resolve", default, skip_serializing_if = "std::ops::Not::not")]
    pub no_resolve: bool,
}

impl Rule {
    pub fn new(kind: RuleKind, value: impl Into<String>, target: impl Into<String>) -> Self {
        Rule {
            kind,
            value: value.into(),
            target: target.into(),
            no_resolve: false,
        }
    }
}

/// An ordered, enable-gated sequence of rules from one origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    pub rules: Vec<Rule>,
    pub enabled: bool,
}

impl RuleSet {
    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> Self {
        RuleSet {
            name: name.into(),
            source: String::new(),
            rules,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_round_trip() {
        for tag in [
            "DOMAIN",
            "DOMAIN-SUFFIX",
            "DOMAIN-KEYWORD",
            "IP-CIDR",
            "IP-CIDR6",
            "GEOIP",
            "USER-AGENT",
            "URL-REGEX",
            "FINAL",
            "MATCH",
        ] {
            assert_eq!(RuleKind::from_tag(tag).unwrap().as_str(), tag);
        }
        assert!(RuleKind::from_tag("SRC-IP").is_none());
    }

    #[test]
    fn test_terminal_and_ip_classification() {
        assert!(RuleKind::Final.is_terminal());
        assert!(RuleKind::Match.is_terminal());
        assert!(!RuleKind::Domain.is_terminal());
        assert!(RuleKind::GeoIp.is_ip());
        assert!(!RuleKind::DomainSuffix.is_ip());
    }
}
