//! Proxy model definitions
//!
//! The universal node record every parser produces and every generator
//! consumes. Kept flat on purpose: per-variant fields are optional and
//! only meaningful for the variant that sets them, which keeps
//! serialisation trivial across the six output dialects.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical proxy variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    Ss,
    Ssr,
    Vmess,
    Vless,
    Trojan,
    Hysteria,
    Hysteria2,
    Snell,
    Http,
    Https,
    Socks5,
}

impl ProxyType {
    /// Wire spelling used in link schemes and Clash documents.
    pub fn as_str(self) -> &'static str {
        match self {
            ProxyType::Ss => "ss",
            ProxyType::Ssr => "ssr",
            ProxyType::Vmess => "vmess",
            ProxyType::Vless => "vless",
            ProxyType::Trojan => "trojan",
            ProxyType::Hysteria => "hysteria",
            ProxyType::Hysteria2 => "hysteria2",
            ProxyType::Snell => "snell",
            ProxyType::Http => "http",
            ProxyType::Https => "https",
            ProxyType::Socks5 => "socks5",
        }
    }

    /// Human-readable label, used for the `<LABEL>-<server>` name fallback.
    pub fn label(self) -> &'static str {
        match self {
            ProxyType::Ss => "SS",
            ProxyType::Ssr => "SSR",
            ProxyType::Vmess => "VMess",
            ProxyType::Vless => "VLESS",
            ProxyType::Trojan => "Trojan",
            ProxyType::Hysteria => "Hysteria",
            ProxyType::Hysteria2 => "Hysteria2",
            ProxyType::Snell => "Snell",
            ProxyType::Http => "HTTP",
            ProxyType::Https => "HTTPS",
            ProxyType::Socks5 => "SOCKS5",
        }
    }

    /// Reverse lookup for tags found inside structured documents.
    pub fn from_tag(tag: &str) -> Option<ProxyType> {
        Some(match tag {
            "ss" => ProxyType::Ss,
            "ssr" => ProxyType::Ssr,
            "vmess" => ProxyType::Vmess,
            "vless" => ProxyType::Vless,
            "trojan" => ProxyType::Trojan,
            "hysteria" => ProxyType::Hysteria,
            "hysteria2" => ProxyType::Hysteria2,
            "snell" => ProxyType::Snell,
            "http" => ProxyType::Http,
            "https" => ProxyType::Https,
            "socks5" => ProxyType::Socks5,
            _ => return None,
        })
    }
}

impl std::fmt::Display for ProxyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport advertised by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Network {
    #[serde(rename = "tcp")]
    Tcp,
    #[serde(rename = "udp")]
    Udp,
    #[serde(rename = "tcp,udp")]
    TcpUdp,
}

impl Network {
    /// Transport for an opaque tag. Application-layer transports (ws,
    /// grpc, h2) ride on TCP; their path/host details live on the node.
    pub fn from_tag(tag: &str) -> Network {
        match tag.to_ascii_lowercase().as_str() {
            "udp" => Network::Udp,
            "tcp,udp" | "tcp+udp" => Network::TcpUdp,
            _ => Network::Tcp,
        }
    }

    pub fn carries_udp(self) -> bool {
        matches!(self, Network::Udp | Network::TcpUdp)
    }
}

/// TLS posture of the endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TlsMode {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "request")]
    Request,
    #[serde(rename = "require")]
    Require,
    #[serde(rename = "verify")]
    Verify,
    #[serde(rename = "no-verify")]
    NoVerify,
}

impl TlsMode {
    pub fn is_none(&self) -> bool {
        matches!(self, TlsMode::None)
    }

    pub fn enabled(&self) -> bool {
        !self.is_none()
    }
}

/// One proxy endpoint, normalised from whatever dialect it arrived in.
///
/// `id` is regenerated at parse time and unique within a conversion;
/// `name` is never empty after a successful parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proxy {
    pub id: String,
    #[serde(rename = "type")]
    pub proxy_type: ProxyType,
    pub name: String,
    pub server: String,
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub aid: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
    #[serde(default, skip_serializing_if = "TlsMode::is_none")]
    pub tls: TlsMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    #[serde(rename = "plugin-opts", default, skip_serializing_if = "Option::is_none")]
    pub plugin_opts: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(rename = "protocol-param", default, skip_serializing_if = "Option::is_none")]
    pub protocol_param: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs: Option<String>,
    #[serde(rename = "obfs-param", default, skip_serializing_if = "Option::is_none")]
    pub obfs_param: Option<String>,

    #[serde(rename = "up-mbps", default, skip_serializing_if = "is_zero_u32")]
    pub up_mbps: u32,
    #[serde(rename = "down-mbps", default, skip_serializing_if = "is_zero_u32")]
    pub down_mbps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub congestion: Option<String>,

    #[serde(rename = "skip-cert-verify", default, skip_serializing_if = "is_false")]
    pub skip_cert_verify: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(default)]
    pub udp: bool,
}

impl Proxy {
    /// A node with the five required fields set and everything else empty.
    /// `name` may still be blank here; parsers fall back to
    /// `<LABEL>-<server>` before returning the node.
    pub fn new(
        proxy_type: ProxyType,
        name: impl Into<String>,
        server: impl Into<String>,
        port: u16,
    ) -> Self {
        Proxy {
            id: Uuid::new_v4().to_string(),
            proxy_type,
            name: name.into(),
            server: server.into(),
            port,
            password: None,
            username: None,
            method: None,
            uuid: None,
            aid: 0,
            network: None,
            tls: TlsMode::None,
            sni: None,
            host: None,
            path: None,
            headers: HashMap::new(),
            plugin: None,
            plugin_opts: None,
            protocol: None,
            protocol_param: None,
            obfs: None,
            obfs_param: None,
            up_mbps: 0,
            down_mbps: 0,
            congestion: None,
            skip_cert_verify: false,
            alpn: Vec::new(),
            udp: false,
        }
    }

    /// Identity used by the dedup step.
    pub fn endpoint_key(&self) -> (String, u16, ProxyType) {
        (self.server.clone(), self.port, self.proxy_type)
    }
}

fn is_zero_u16(v: &u16) -> bool {
    *v == 0
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !*v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_type_round_trip() {
        for tag in [
            "ss", "ssr", "vmess", "vless", "trojan", "hysteria", "hysteria2", "snell", "http",
            "https", "socks5",
        ] {
            let pt = ProxyType::from_tag(tag).unwrap();
            assert_eq!(pt.as_str(), tag);
        }
        assert!(ProxyType::from_tag("wireguard").is_none());
    }

    #[test]
    fn test_network_from_tag_folds_app_transports() {
        assert_eq!(Network::from_tag("tcp"), Network::Tcp);
        assert_eq!(Network::from_tag("udp"), Network::Udp);
        assert_eq!(Network::from_tag("tcp,udp"), Network::TcpUdp);
        // ws and grpc ride on TCP
        assert_eq!(Network::from_tag("ws"), Network::Tcp);
        assert_eq!(Network::from_tag("grpc"), Network::Tcp);
    }

    #[test]
    fn test_serialize_omits_empty_fields() {
        let node = Proxy::new(ProxyType::Ss, "Test", "example.com", 8388);
        let json = serde_json::to_value(&node).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["type"], "ss");
        assert_eq!(obj["port"], 8388);
        assert!(!obj.contains_key("password"));
        assert!(!obj.contains_key("tls"));
        assert!(!obj.contains_key("alpn"));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Proxy::new(ProxyType::Ss, "a", "s", 1);
        let b = Proxy::new(ProxyType::Ss, "a", "s", 1);
        assert_ne!(a.id, b.id);
        assert_eq!(a.endpoint_key(), b.endpoint_key());
    }
}
