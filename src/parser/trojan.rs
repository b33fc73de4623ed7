//! Trojan link parser.
//!
//! Trojan always rides TLS. The `type=ws` and `type=grpc` transports are
//! folded onto TCP with their path fields preserved; the transport tag
//! itself is not kept on the node.

use url::Url;

use super::{check_port, is_truthy, name_from_fragment, query_map, require_host, Parser, ParseError};
use crate::models::{Network, Proxy, ProxyType, TlsMode};

pub struct TrojanParser;

impl Parser for TrojanParser {
    fn proxy_type(&self) -> &'static str {
        "trojan"
    }

    fn supports(&self, content: &str) -> bool {
        content.starts_with("trojan://")
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
        let transport = query.get("type").map(String::as_str).unwrap_or("tcp");
        let network = Network::from_tag(transport);

        let mut path = query.get("path").cloned().filter(|v| !v.is_empty());
        if transport == "grpc" {
            path = query.get("serviceName").cloned().filter(|v| !v.is_empty());
        }

        let name = name_from_fragment(&url, "Trojan", &server);
        let mut node = Proxy::new(ProxyType::Trojan, name, server, port);
        node.password = Some(password.to_string());
        node.network = Some(network);
        node.tls = TlsMode::Require;
        node.sni = query
            .get("sni")
            .or_else(|| query.get("peer"))
            .cloned()
            .filter(|v| !v.is_empty());
        node.host = query.get("host").cloned().filter(|v| !v.is_empty());
        node.path = path;
        node.skip_cert_verify = query
            .get("allowInsecure")
            .map(|v| is_truthy(v))
            .unwrap_or(false);
        if let Some(alpn) = query.get("alpn").filter(|v| !v.is_empty()) {
            node.alpn = alpn.split(',').map(|s| s.trim().to_string()).collect();
        }
        node.udp = network.carries_udp()
            || query.get("udp").map(|v| is_truthy(v)).unwrap_or(false);
        Ok(vec![node])
    }
}
