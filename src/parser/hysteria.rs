//! Hysteria (v1) link parser.

use url::Url;

use super::{check_port, is_truthy, name_from_fragment, query_map, require_host, Parser, ParseError};
use crate::models::{Proxy, ProxyType, TlsMode};

pub struct HysteriaParser;

impl Parser for HysteriaParser {
    fn proxy_type(&self) -> &'static str {
        "hysteria"
    }

    fn supports(&self, content: &str) -> bool {
        content.starts_with("hysteria://")
    }

    fn parse(&self, content: &str) -> Result<Vec<Proxy>, ParseError> {
        if !self.supports(content) {
            return Err(ParseError::Unsupported);
        }

        let url = Url::parse(content).map_err(|e| ParseError::Malformed(e.to_string()))?;
        let server = require_host(&url)?;
        let port = check_port(url.port().ok_or(ParseError::MissingField("port"))?)?;

        let query = query_map(&url);
        // v1 links carry the secret either in the userinfo or in `auth`.
        let password = Some(url.username())
            .filter(|u| !u.is_empty())
            .map(|u| u.to_string())
            .or_else(|| query.get("auth").cloned().filter(|v| !v.is_empty()));

        let name = name_from_fragment(&url, "Hysteria", &server);
        let mut node = Proxy::new(ProxyType::Hysteria, name, server, port);
        node.password = password;
        node.up_mbps = query
            .get("upmbps")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        node.down_mbps = query
            .get("downmbps")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        node.obfs = query.get("obfs").cloned().filter(|v| !v.is_empty());
        node.sni = query
            .get("peer")
            .or_else(|| query.get("sni"))
            .cloned()
            .filter(|v| !v.is_empty());
        node.skip_cert_verify = query
            .get("insecure")
            .or_else(|| query.get("allowInsecure"))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_with_bandwidth_hints() {
        let node = HysteriaParser
            .parse("hysteria://secret@example.com:443?upmbps=50&downmbps=100&peer=sni.example&insecure=1&alpn=h3#Hy")
            .unwrap()
            .remove(0);
        assert_eq!(node.proxy_type, ProxyType::Hysteria);
        assert_eq!(node.password.as_deref(), Some("secret"));
        assert_eq!(node.up_mbps, 50);
        assert_eq!(node.down_mbps, 100);
        assert_eq!(node.sni.as_deref(), Some("sni.example"));
        assert!(node.skip_cert_verify);
        assert_eq!(node.alpn, vec!["h3"]);
        assert_eq!(node.name, "Hy");
        assert!(node.udp);
    }

    #[test]
    fn test_auth_query_fallback() {
        let node = HysteriaParser
            .parse("hysteria://example.com:443?auth=token")
            .unwrap()
            .remove(0);
        assert_eq!(node.password.as_deref(), Some("token"));
        assert_eq!(node.name, "Hysteria-example.com");
    }

    #[test]
    fn test_missing_port_is_rejected() {
        assert!(HysteriaParser.parse("hysteria://secret@example.com").is_err());
    }
}
