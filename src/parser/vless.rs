//! VLESS link parser.
//!
//! URL-shaped: the userinfo carries the endpoint uuid; well-known query
//! keys carry the TLS posture and transport details. As with trojan, ws
//! and grpc transports fold to TCP while keeping their path fields.

use url::Url;

use super::{check_port, is_truthy, name_from_fragment, query_map, require_host, Parser, ParseError};
use crate::models::{Network, Proxy, ProxyType, TlsMode};

pub struct VlessParser;

impl Parser for VlessParser {
    fn proxy_type(&self) -> &'static str {
        "vless"
    }

    fn supports(&self, content: &str) -> bool {
        content.starts_with("vless://")
    }

    fn parse(&self, content: &str) -> Result<Vec<Proxy>, ParseError> {
        if !self.supports(content) {
            return Err(ParseError::Unsupported);
        }

        let url = Url::parse(content).map_err(|e| ParseError::Malformed(e.to_string()))?;
        let server = require_host(&url)?;
        let port = check_port(url.port().ok_or(ParseError::MissingField("port"))?)?;
        let uuid = url.username();
        if uuid.is_empty() {
            return Err(ParseError::MissingField("uuid"));
        }

        let query = query_map(&url);
        let network = Network::from_tag(query.get("type").map(String::as_str).unwrap_or("tcp"));
        let tls = match query.get("security").map(String::as_str) {
            Some("tls") | Some("reality") => TlsMode::Require,
            _ => TlsMode::None,
        };

        let mut path = query.get("path").cloned().filter(|v| !v.is_empty());
        if query.get("type").map(String::as_str) == Some("grpc") {
            path = query.get("serviceName").cloned().filter(|v| !v.is_empty());
        }

        let name = name_from_fragment(&url, "VLESS", &server);
        let mut node = Proxy::new(ProxyType::Vless, name, server, port);
        node.uuid = Some(uuid.to_string());
        node.network = Some(network);
        node.tls = tls;
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
        node.udp = true;
        Ok(vec![node])
    }
}
