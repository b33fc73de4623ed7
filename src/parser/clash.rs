//! Clash document parser: YAML with a top-level `proxies:` sequence.
//!
//! The only whole-document parser in the registry. Entries are routed by
//! their inner `type` tag into the same per-variant extraction the link
//! parsers perform, reading Clash-idiomatic keys. Unknown types and
//! entries that fail extraction are silently dropped.

use log::debug;
use serde::Deserialize;
use serde_yaml::Value;

use super::{check_port, Parser, ParseError};
use crate::models::{Network, Proxy, ProxyType, TlsMode};

pub struct ClashParser;

#[derive(Debug, Deserialize)]
struct ClashDocument {
    #[serde(default)]
    proxies: Vec<Value>,
}

impl Parser for ClashParser {
    fn proxy_type(&self) -> &'static str {
        "clash"
    }

    fn whole_document(&self) -> bool {
        true
    }

    fn supports(&self, content: &str) -> bool {
        // A proxy link is never a Clash document even when a query value
        // happens to contain the marker.
        if content.starts_with("ss://")
            || content.starts_with("ssr://")
            || content.starts_with("vmess://")
            || content.starts_with("trojan://")
        {
            return false;
        }
        content.contains("proxies:")
    }

    fn parse(&self, content: &str) -> Result<Vec<Proxy>, ParseError> {
        let doc: ClashDocument = serde_yaml::from_str(content)
            .map_err(|e| ParseError::Malformed(format!("invalid yaml document: {}", e)))?;

        let mut nodes = Vec::new();
        for entry in &doc.proxies {
            let Some(tag) = get_str(entry, "type") else {
                continue;
            };
            let Some(proxy_type) = ProxyType::from_tag(&tag) else {
                // Unknown variants are dropped, not fatal.
                continue;
            };
            match parse_entry(entry, proxy_type) {
                Ok(node) => nodes.push(node),
                Err(err) => debug!("dropping {} entry: {}", tag, err),
            }
        }
        Ok(nodes)
    }
}

fn parse_entry(entry: &Value, proxy_type: ProxyType) -> Result<Proxy, ParseError> {
    let server = get_str(entry, "server").ok_or(ParseError::MissingField("server"))?;
    let port = get_u64(entry, "port").ok_or(ParseError::MissingField("port"))?;
    let port = check_port(
        u16::try_from(port).map_err(|_| ParseError::BadPort(port.to_string()))?,
    )?;

    let name = get_str(entry, "name")
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("{}-{}", proxy_type.label(), server));

    let mut node = Proxy::new(proxy_type, name, server, port);
    node.udp = get_bool(entry, "udp").unwrap_or(false);

    match proxy_type {
        ProxyType::Ss => {
            node.method = get_str(entry, "cipher");
            node.password = get_str(entry, "password");
            node.plugin = get_str(entry, "plugin");
            if let Some(opts) = entry.get("plugin-opts") {
                if node.plugin.as_deref() == Some("obfs") {
                    node.plugin_opts = Some(format!(
                        "obfs={};obfs-host={}",
                        get_str(opts, "mode").unwrap_or_default(),
                        get_str(opts, "host").unwrap_or_default(),
                    ));
                }
            }
        }
        ProxyType::Ssr => {
            node.method = get_str(entry, "cipher");
            node.password = get_str(entry, "password");
            node.protocol = get_str(entry, "protocol");
            node.protocol_param = get_str(entry, "protocol-param");
            node.obfs = get_str(entry, "obfs");
            node.obfs_param = get_str(entry, "obfs-param");
        }
        ProxyType::Vmess => {
            node.uuid = Some(get_str(entry, "uuid").ok_or(ParseError::MissingField("uuid"))?);
            node.aid = get_u64(entry, "alterId").and_then(|a| u16::try_from(a).ok()).unwrap_or(0);
            node.method = get_str(entry, "cipher");
            node.network = Some(Network::from_tag(
                &get_str(entry, "network").unwrap_or_else(|| "tcp".to_string()),
            ));
            if get_bool(entry, "tls").unwrap_or(false) {
                node.tls = TlsMode::Require;
            }
            node.sni = get_str(entry, "servername").filter(|s| !s.is_empty());
            node.skip_cert_verify = get_bool(entry, "skip-cert-verify").unwrap_or(false);
            read_ws_opts(entry, &mut node);
        }
        ProxyType::Vless => {
            node.uuid = Some(get_str(entry, "uuid").ok_or(ParseError::MissingField("uuid"))?);
            node.network = Some(Network::from_tag(
                &get_str(entry, "network").unwrap_or_else(|| "tcp".to_string()),
            ));
            if get_bool(entry, "tls").unwrap_or(false) {
                node.tls = TlsMode::Require;
            }
            node.sni = get_str(entry, "servername").filter(|s| !s.is_empty());
            if let Some(opts) = entry.get("grpc-opts") {
                node.path = get_str(opts, "grpc-service-name").filter(|s| !s.is_empty());
            }
            read_ws_opts(entry, &mut node);
        }
        ProxyType::Trojan => {
            node.password =
                Some(get_str(entry, "password").ok_or(ParseError::MissingField("password"))?);
            node.tls = TlsMode::Require;
            node.sni = get_str(entry, "sni").filter(|s| !s.is_empty());
            node.skip_cert_verify = get_bool(entry, "skip-cert-verify").unwrap_or(false);
        }
        ProxyType::Http | ProxyType::Https => {
            node.username = get_str(entry, "username").filter(|s| !s.is_empty());
            node.password = get_str(entry, "password");
            if get_bool(entry, "tls").unwrap_or(false) {
                node.tls = TlsMode::Require;
            }
        }
        ProxyType::Snell => {
            node.password = get_str(entry, "psk");
        }
        ProxyType::Hysteria | ProxyType::Hysteria2 => {
            node.password = get_str(entry, "password").or_else(|| get_str(entry, "auth-str"));
            node.sni = get_str(entry, "sni").filter(|s| !s.is_empty());
            node.skip_cert_verify = get_bool(entry, "skip-cert-verify").unwrap_or(false);
        }
        ProxyType::Socks5 => {
            node.username = get_str(entry, "username").filter(|s| !s.is_empty());
            node.password = get_str(entry, "password");
        }
    }

    Ok(node)
}

fn read_ws_opts(entry: &Value, node: &mut Proxy) {
    if let Some(opts) = entry.get("ws-opts") {
        node.path = get_str(opts, "path").filter(|s| !s.is_empty()).or(node.path.take());
        if let Some(headers) = opts.get("headers") {
            if let Some(host) = get_str(headers, "Host").filter(|s| !s.is_empty()) {
                node.headers.insert("Host".to_string(), host.clone());
                node.host = Some(host);
            }
        }
    }
}

fn get_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn get_u64(value: &Value, key: &str) -> Option<u64> {
    value.get(key).and_then(|v| match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    })
}

fn get_bool(value: &Value, key: &str) -> Option<bool> {
    value.get(key).and_then(|v| v.as_bool())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ss_and_vmess_entries() {
        let doc = r#"
proxies:
  - name: "SS-1"
    type: ss
    server: 1.2.3.4
    port: 8388
    cipher: aes-256-gcm
    password: pw
    udp: true
  - name: "VM-1"
    type: vmess
    server: example.com
    port: 443
    uuid: abcd-ef
    alterId: 4
    cipher: auto
    tls: true
    network: ws
    servername: sni.example
    ws-opts:
      path: /tunnel
      headers:
        Host: front.example
"#;
        let nodes = ClashParser.parse(doc).unwrap();
        assert_eq!(nodes.len(), 2);

        let ss = &nodes[0];
        assert_eq!(ss.proxy_type, ProxyType::Ss);
        assert_eq!(ss.method.as_deref(), Some("aes-256-gcm"));
        assert_eq!(ss.password.as_deref(), Some("pw"));
        assert!(ss.udp);

        let vm = &nodes[1];
        assert_eq!(vm.proxy_type, ProxyType::Vmess);
        assert_eq!(vm.uuid.as_deref(), Some("abcd-ef"));
        assert_eq!(vm.aid, 4);
        assert_eq!(vm.tls, TlsMode::Require);
        assert_eq!(vm.sni.as_deref(), Some("sni.example"));
        assert_eq!(vm.path.as_deref(), Some("/tunnel"));
        assert_eq!(vm.host.as_deref(), Some("front.example"));
    }

    #[test]
    fn test_obfs_plugin_opts_flatten() {
        let doc = r#"
proxies:
  - name: "SS-Obfs"
    type: ss
    server: 1.2.3.4
    port: 8388
    cipher: aes-128-gcm
    password: pw
    plugin: obfs
    plugin-opts:
      mode: http
      host: bing.com
"#;
        let node = ClashParser.parse(doc).unwrap().remove(0);
        assert_eq!(node.plugin.as_deref(), Some("obfs"));
        assert_eq!(node.plugin_opts.as_deref(), Some("obfs=http;obfs-host=bing.com"));
    }

    #[test]
    fn test_unknown_types_are_dropped_silently() {
        let doc = r#"
proxies:
  - name: "WG"
    type: wireguard
    server: 1.2.3.4
    port: 51820
  - name: "T"
    type: trojan
    server: example.com
    port: 443
    password: pw
"#;
        let nodes = ClashParser.parse(doc).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].proxy_type, ProxyType::Trojan);
    }

    #[test]
    fn test_entry_with_bad_port_is_dropped() {
        let doc = r#"
proxies:
  - name: "Bad"
    type: ss
    server: 1.2.3.4
    port: 0
    cipher: aes-128-gcm
    password: pw
"#;
        let nodes = ClashParser.parse(doc).unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_supports_requires_proxies_marker() {
        assert!(ClashParser.supports("proxies:\n  - name: x"));
        assert!(!ClashParser.supports("ss://abc#proxies:"));
        assert!(!ClashParser.supports("just text"));
    }

    #[test]
    fn test_invalid_yaml_is_malformed() {
        assert!(matches!(
            ClashParser.parse("proxies:\n  - {unclosed"),
            Err(ParseError::Malformed(_))
        ));
    }
}
