//! VMess link parser: `vmess://` wrapping a base64 JSON payload.

use serde_json::Value;

use super::{check_port, Parser, ParseError};
use crate::models::{Network, Proxy, ProxyType, TlsMode};
use crate::utils::base64::decode_any_str;

pub struct VmessParser;

impl Parser for VmessParser {
    fn proxy_type(&self) -> &'static str {
        "vmess"
    }

    fn supports(&self, content: &str) -> bool {
        content.starts_with("vmess://")
    }

    fn parse(&self, content: &str) -> Result<Vec<Proxy>, ParseError> {
        if !self.supports(content) {
            return Err(ParseError::Unsupported);
        }

        let decoded = decode_any_str(&content["vmess://".len()..])
            .ok_or_else(|| ParseError::Malformed("body is not base64".to_string()))?;
        let json: Value = serde_json::from_str(&decoded)
            .map_err(|e| ParseError::Malformed(format!("invalid json payload: {}", e)))?;

        let server = str_field(&json, "add").ok_or(ParseError::MissingField("add"))?;
        let uuid = str_field(&json, "id").ok_or(ParseError::MissingField("id"))?;
        let port = check_port(
            int_field(&json, "port")
                .and_then(|p| u16::try_from(p).ok())
                .ok_or_else(|| ParseError::BadPort(json["port"].to_string()))?,
        )?;
        let aid = int_field(&json, "aid").and_then(|a| u16::try_from(a).ok()).unwrap_or(0);

        let version = int_field(&json, "v").unwrap_or(1);
        let mut host = str_field(&json, "host").unwrap_or_default();
        let mut path = str_field(&json, "path").unwrap_or_default();
        // v2 payloads may pack `host;path` into the host field.
        if version == 2 && host.contains(';') {
            if let Some((h, p)) = host.clone().split_once(';') {
                host = h.to_string();
                path = p.to_string();
            }
        }

        let network = Network::from_tag(&str_field(&json, "net").unwrap_or_default());
        let tls = if str_field(&json, "tls").unwrap_or_default().eq_ignore_ascii_case("tls") {
            TlsMode::Require
        } else {
            TlsMode::None
        };

        let name = str_field(&json, "ps")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("VMess-{}", server));

        let mut node = Proxy::new(ProxyType::Vmess, name, server, port);
        node.uuid = Some(uuid);
        node.aid = aid;
        node.method = str_field(&json, "scy").filter(|s| !s.is_empty());
        node.network = Some(network);
        node.tls = tls;
        node.sni = str_field(&json, "sni").filter(|s| !s.is_empty());
        if !host.is_empty() {
            node.headers.insert("Host".to_string(), host.clone());
            node.host = Some(host);
        }
        node.path = Some(path).filter(|p| !p.is_empty());
        if let Some(alpn) = str_field(&json, "alpn").filter(|s| !s.is_empty()) {
            node.alpn = alpn.split(',').map(|s| s.trim().to_string()).collect();
        }
        node.udp = network.carries_udp();
        Ok(vec![node])
    }
}

/// Subscription payloads are sloppy about types; accept both `"443"` and
/// `443` for numeric fields.
fn int_field(json: &Value, key: &str) -> Option<u64> {
    match &json[key] {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse::<u64>().ok(),
        _ => None,
    }
}

fn str_field(json: &Value, key: &str) -> Option<String> {
    json[key].as_str().map(|s| s.to_string())
}
