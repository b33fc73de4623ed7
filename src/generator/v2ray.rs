//! V2Ray JSON generator: an outbound array reflecting the input proxies.

use serde_json::{json, Value};

use super::{GenerateOptions, Generator};
use crate::error::{Error, Result};
use crate::models::{Network, Proxy, ProxyType, RuleSet};

pub struct V2rayGenerator;

impl Generator for V2rayGenerator {
    fn format(&self) -> &'static str {
        "v2ray"
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn generate(
        &self,
        proxies: &[Proxy],
        _rulesets: &[RuleSet],
        _options: &GenerateOptions,
    ) -> Result<String> {
        let mut outbounds: Vec<Value> = proxies.iter().filter_map(outbound).collect();
        outbounds.push(json!({ "protocol": "freedom", "tag": "direct" }));

        let doc = json!({ "outbounds": outbounds });
        serde_json::to_string_pretty(&doc)
            .map_err(|e| Error::generation_failed(format!("failed to marshal json: {}", e)))
    }
}

fn outbound(p: &Proxy) -> Option<Value> {
    let mut out = match p.proxy_type {
        ProxyType::Vmess => json!({
            "protocol": "vmess",
            "tag": p.name,
            "settings": {
                "vnext": [{
                    "address": p.server,
                    "port": p.port,
                    "users": [{
                        "id": p.uuid.as_deref().unwrap_or_default(),
                        "alterId": p.aid,
                        "security": p.method.as_deref().unwrap_or("auto"),
                    }],
                }],
            },
        }),
        ProxyType::Vless => json!({
            "protocol": "vless",
            "tag": p.name,
            "settings": {
                "vnext": [{
                    "address": p.server,
                    "port": p.port,
                    "users": [{
                        "id": p.uuid.as_deref().unwrap_or_default(),
                        "encryption": "none",
                    }],
                }],
            },
        }),
        ProxyType::Ss => json!({
            "protocol": "shadowsocks",
            "tag": p.name,
            "settings": {
                "servers": [{
                    "address": p.server,
                    "port": p.port,
                    "method": p.method.as_deref().unwrap_or_default(),
                    "password": p.password.as_deref().unwrap_or_default(),
                }],
            },
        }),
        ProxyType::Trojan => json!({
            "protocol": "trojan",
            "tag": p.name,
            "settings": {
                "servers": [{
                    "address": p.server,
                    "port": p.port,
                    "password": p.password.as_deref().unwrap_or_default(),
                }],
            },
        }),
        ProxyType::Socks5 => {
            let mut server = json!({ "address": p.server, "port": p.port });
            if let (Some(user), Some(pass)) = (p.username.as_deref(), p.password.as_deref()) {
                server["users"] = json!([{ "user": user, "pass": pass }]);
            }
            json!({
                "protocol": "socks",
                "tag": p.name,
                "settings": { "servers": [server] },
            })
        }
        ProxyType::Http | ProxyType::Https => {
            let mut server = json!({ "address": p.server, "port": p.port });
            if let (Some(user), Some(pass)) = (p.username.as_deref(), p.password.as_deref()) {
                server["users"] = json!([{ "user": user, "pass": pass }]);
            }
            json!({
                "protocol": "http",
                "tag": p.name,
                "settings": { "servers": [server] },
            })
        }
        // no v2ray outbound schema for these
        ProxyType::Ssr | ProxyType::Snell | ProxyType::Hysteria | ProxyType::Hysteria2 => {
            return None;
        }
    };

    let stream = stream_settings(p);
    if !stream.as_object().map(|o| o.is_empty()).unwrap_or(true) {
        out["streamSettings"] = stream;
    }
    Some(out)
}

fn stream_settings(p: &Proxy) -> Value {
    let mut stream = serde_json::Map::new();
    if matches!(p.proxy_type, ProxyType::Vmess | ProxyType::Vless) {
        if let Some(network) = p.network {
            let tag = match network {
                Network::Tcp => "tcp",
                Network::Udp | Network::TcpUdp => "udp",
            };
            stream.insert("network".to_string(), json!(tag));
        }
        if p.path.is_some() || p.host.is_some() {
            let mut ws = serde_json::Map::new();
            if let Some(path) = p.path.as_deref() {
                ws.insert("path".to_string(), json!(path));
            }
            if let Some(host) = p.host.as_deref() {
                ws.insert("headers".to_string(), json!({ "Host": host }));
            }
            stream.insert("wsSettings".to_string(), Value::Object(ws));
        }
    }
    if p.tls.enabled() {
        stream.insert("security".to_string(), json!("tls"));
        let mut tls = serde_json::Map::new();
        if let Some(sni) = p.sni.as_deref().filter(|s| !s.is_empty()) {
            tls.insert("serverName".to_string(), json!(sni));
        }
        if p.skip_cert_verify {
            tls.insert("allowInsecure".to_string(), json!(true));
        }
        if !tls.is_empty() {
            stream.insert("tlsSettings".to_string(), Value::Object(tls));
        }
    }
    Value::Object(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TlsMode;

    fn parse(out: &str) -> Value {
        serde_json::from_str(out).unwrap()
    }

    #[test]
    fn test_document_is_valid_json_with_trailing_direct() {
        let out = V2rayGenerator
            .generate(&[], &[], &GenerateOptions::default())
            .unwrap();
        let doc = parse(&out);
        let outbounds = doc["outbounds"].as_array().unwrap();
        assert_eq!(outbounds.len(), 1);
        assert_eq!(outbounds[0]["protocol"], "freedom");
    }

    #[test]
    fn test_vmess_outbound_shape() {
        let mut p = Proxy::new(ProxyType::Vmess, "VM", "example.com", 443);
        p.uuid = Some("uuid-1".to_string());
        p.aid = 2;
        p.network = Some(Network::Tcp);
        p.tls = TlsMode::Require;
        p.sni = Some("sni.example".to_string());
        p.path = Some("/ws".to_string());
        let out = V2rayGenerator
            .generate(&[p], &[], &GenerateOptions::default())
            .unwrap();
        let doc = parse(&out);
        let ob = &doc["outbounds"][0];
        assert_eq!(ob["protocol"], "vmess");
        assert_eq!(ob["tag"], "VM");
        assert_eq!(ob["settings"]["vnext"][0]["address"], "example.com");
        assert_eq!(ob["settings"]["vnext"][0]["users"][0]["id"], "uuid-1");
        assert_eq!(ob["settings"]["vnext"][0]["users"][0]["alterId"], 2);
        assert_eq!(ob["streamSettings"]["security"], "tls");
        assert_eq!(ob["streamSettings"]["tlsSettings"]["serverName"], "sni.example");
        assert_eq!(ob["streamSettings"]["wsSettings"]["path"], "/ws");
    }

    #[test]
    fn test_ss_outbound_shape() {
        let mut p = Proxy::new(ProxyType::Ss, "SS", "1.2.3.4", 8388);
        p.method = Some("aes-256-gcm".to_string());
        p.password = Some("pw".to_string());
        let out = V2rayGenerator
            .generate(&[p], &[], &GenerateOptions::default())
            .unwrap();
        let doc = parse(&out);
        assert_eq!(doc["outbounds"][0]["protocol"], "shadowsocks");
        assert_eq!(doc["outbounds"][0]["settings"]["servers"][0]["method"], "aes-256-gcm");
    }

    #[test]
    fn test_inexpressible_variants_are_skipped() {
        let mut p = Proxy::new(ProxyType::Snell, "SN", "1.2.3.4", 6333);
        p.password = Some("psk".to_string());
        let out = V2rayGenerator
            .generate(&[p], &[], &GenerateOptions::default())
            .unwrap();
        let doc = parse(&out);
        // only the trailing freedom outbound remains
        assert_eq!(doc["outbounds"].as_array().unwrap().len(), 1);
    }
}
