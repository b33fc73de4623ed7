//! Parser pipeline: format auto-detection and per-dialect link parsing.
//!
//! A [`Parser`] handles one link dialect. The [`ParserRegistry`] owns the
//! dispatch algorithm: one top-level base64 unwrap, a whole-document
//! probe (Clash), then line mode where the first supporting parser wins.
//! Per-line failures are logged and skipped; the registry always returns
//! the successfully parsed subset.

pub mod clash;
pub mod http;
pub mod hysteria;
pub mod hysteria2;
pub mod snell;
pub mod socks;
pub mod ss;
pub mod ssr;
pub mod trojan;
pub mod vless;
pub mod vmess;

use std::collections::HashMap;

use log::warn;
use thiserror::Error;
use url::Url;

use crate::models::Proxy;
use crate::utils::base64::unwrap_document;

/// Per-item parse failure. Absorbed by the registry; a failing line or
/// document entry never aborts the subscription.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unsupported link format")]
    Unsupported,
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("bad port: {0}")]
    BadPort(String),
}

/// One proxy-link dialect.
pub trait Parser: Send + Sync {
    /// Canonical tag of the variant this parser produces.
    fn proxy_type(&self) -> &'static str;

    /// Cheap probe; must not allocate per call.
    fn supports(&self, content: &str) -> bool;

    /// Parse one line (or, for whole-document parsers, the full buffer).
    fn parse(&self, content: &str) -> Result<Vec<Proxy>, ParseError>;

    /// Whether `parse` consumes the entire buffer instead of one line.
    fn whole_document(&self) -> bool {
        false
    }
}

/// Ordered parser table. Dispatch ties are resolved by registry order;
/// the canonical order puts the whole-document parser first and the
/// line dialects after it.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn Parser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        ParserRegistry {
            parsers: vec![
                Box::new(clash::ClashParser),
                Box::new(ss::SsParser),
                Box::new(ssr::SsrParser),
                Box::new(vmess::VmessParser),
                Box::new(vless::VlessParser),
                Box::new(trojan::TrojanParser),
                Box::new(hysteria::HysteriaParser),
                Box::new(hysteria2::Hysteria2Parser),
                Box::new(snell::SnellParser),
                Box::new(http::HttpParser),
                Box::new(socks::Socks5Parser),
            ],
        }
    }

    /// Append a custom parser; it is consulted after the built-in ones.
    pub fn register(&mut self, parser: Box<dyn Parser>) {
        self.parsers.push(parser);
    }

    pub fn parsers(&self) -> &[Box<dyn Parser>] {
        &self.parsers
    }

    /// Run the full dispatch over one subscription body.
    pub fn parse_subscription(&self, content: &str) -> Vec<Proxy> {
        let content = unwrap_document(content);

        // Whole-document formats are not line based; first match consumes
        // the entire buffer.
        for parser in self.parsers.iter().filter(|p| p.whole_document()) {
            if parser.supports(&content) {
                return match parser.parse(&content) {
                    Ok(nodes) => nodes,
                    Err(err) => {
                        warn!("{} document rejected: {}", parser.proxy_type(), err);
                        Vec::new()
                    }
                };
            }
        }

        let mut nodes = Vec::new();
        for raw in content.split('\n') {
            let line = raw.trim_end_matches('\r').trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                continue;
            }

            for parser in self.parsers.iter().filter(|p| !p.whole_document()) {
                if !parser.supports(line) {
                    continue;
                }
                match parser.parse(line) {
                    Ok(parsed) => nodes.extend(parsed),
                    Err(err) => warn!("skipping {} line: {}", parser.proxy_type(), err),
                }
                break;
            }
        }
        nodes
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        ParserRegistry::new()
    }
}

// Shared extraction helpers for URL-shaped dialects.

pub(crate) fn check_port(port: u16) -> Result<u16, ParseError> {
    if port == 0 {
        return Err(ParseError::BadPort("0".to_string()));
    }
    Ok(port)
}

pub(crate) fn parse_port(raw: &str) -> Result<u16, ParseError> {
    let port = raw
        .parse::<u16>()
        .map_err(|_| ParseError::BadPort(raw.to_string()))?;
    check_port(port)
}

pub(crate) fn require_host(url: &Url) -> Result<String, ParseError> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_string())
        .ok_or(ParseError::MissingField("server"))
}

/// Percent-decoded fragment, or the `<LABEL>-<server>` fallback.
pub(crate) fn name_from_fragment(url: &Url, label: &str, server: &str) -> String {
    match url.fragment() {
        Some(fragment) if !fragment.is_empty() => urlencoding::decode(fragment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| fragment.to_string()),
        _ => format!("{}-{}", label, server),
    }
}

pub(crate) fn query_map(url: &Url) -> HashMap<String, String> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

pub(crate) fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
