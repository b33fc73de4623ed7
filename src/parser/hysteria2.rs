//! Hysteria2 link parser.

use url::Url;

use super::{check_port, is_truthy, name_from_fragment, query_map, require_host, Parser, ParseError};
use crate::models::{Proxy, ProxyType, TlsMode};

pub struct Hysteria2Parser;

impl Parser for Hysteria2Parser {
    fn proxy_type(&self) -> &'static str {
        "hysteria2"
    }

    fn supports(&self, content: &str) -> bool {
        content.starts_with("hysteria2://")
    }

    fn parse(&self, content: &str) -> Result<Vec<Proxy>, ParseError> {
        if !self.supports(content) {
            return Err(ParseError::Unsupported);
        }

        let url = Url::parse(content).map_err(|e| ParseError::Malformed(e.to_string()))?;
        let server = require_host(&url)?;
        let port = check_port(url.port().unwrap_or(443))?;
        let password = url.username();
        if password.is_empty() {
            return Err(ParseError::MissingField("password"));
        }

        let query = query_map(&url);
        let name = name_from_fragment(&url, "Hysteria2", &server);
        let mut node = Proxy::new(ProxyType::Hysteria2, name, server, port);
        node.password = Some(password.to_string());
        node.obfs = query.get("obfs").cloned().filter(|v| !v.is_empty());
        node.obfs_param = query
            .get("obfs-password")
            .cloned()
            .filter(|v| !v.is_empty());
        node.sni = query.get("sni").cloned().filter(|v| !v.is_empty());
        node.skip_cert_verify = query
            .get("insecure")
            .map(|v| is_truthy(v))
            .unwrap_or(false);
        if let Some(alpn) = query.get("alpn").filter(|v| !v.is_empty()) {
            node.alpn = alpn.split(',').map(|s| s.trim().to_string()).collect();
        }
        if node.sni.is_some() || !node.alpn.is_empty() {
            node.tls = TlsMode::Require;
        }
        node.udp = true;
        Ok(vec![node])
    }
}
