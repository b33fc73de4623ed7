//! Clash YAML generator.

use std::sync::Arc;

use log::warn;
use serde_yaml::{Mapping, Value};

use super::ruleconvert::render_rules;
use super::{effective_groups, group_members, proxy_names, GenerateOptions, Generator};
use crate::error::{Error, Result};
use crate::models::{Proxy, ProxyType, RuleSet};
use crate::template::TemplateManager;

pub struct ClashGenerator {
    templates: Arc<TemplateManager>,
}

impl ClashGenerator {
    pub fn new(templates: Arc<TemplateManager>) -> Self {
        ClashGenerator { templates }
    }
}

impl Generator for ClashGenerator {
    fn format(&self) -> &'static str {
        "clash"
    }

    fn content_type(&self) -> &'static str {
        "application/x-yaml"
    }

    fn generate(
        &self,
        proxies: &[Proxy],
        rulesets: &[RuleSet],
        options: &GenerateOptions,
    ) -> Result<String> {
        // A resolvable base template replaces the programmatic output
        // entirely; a broken one falls back to it.
        if let Some(name) = &options.base_template {
            match self.templates.render(
                name,
                minijinja::context! {
                    proxies => proxies,
                    proxy_names => proxy_names(proxies),
                },
            ) {
                Ok(rendered) => return Ok(rendered),
                Err(err) => warn!("base template {} unusable, generating instead: {}", name, err),
            }
        }

        let mut root = Mapping::new();

        let proxy_values: Vec<Value> = proxies
            .iter()
            .map(|p| Value::Mapping(proxy_entry(p, options.udp)))
            .collect();
        root.insert("proxies".into(), Value::Sequence(proxy_values));

        let names = proxy_names(proxies);
        let group_values: Vec<Value> = effective_groups(options)
            .iter()
            .map(|group| {
                let mut map = Mapping::new();
                map.insert("name".into(), group.name.clone().into());
                map.insert("type".into(), group.group_type.as_str().into());
                map.insert(
                    "proxies".into(),
                    Value::Sequence(group_members(group, &names).into_iter().map(Value::from).collect()),
                );
                if let Some(url) = &group.url {
                    map.insert("url".into(), url.clone().into());
                }
                if group.interval > 0 {
                    map.insert("interval".into(), u64::from(group.interval).into());
                }
                if group.tolerance > 0 {
                    map.insert("tolerance".into(), u64::from(group.tolerance).into());
                }
                if let Some(strategy) = &group.strategy {
                    map.insert("strategy".into(), strategy.clone().into());
                }
                Value::Mapping(map)
            })
            .collect();
        root.insert("proxy-groups".into(), Value::Sequence(group_values));

        let rules: Vec<Value> = render_rules(rulesets, &options.rules, "MATCH")
            .into_iter()
            .map(Value::from)
            .collect();
        root.insert("rules".into(), Value::Sequence(rules));

        // Deterministic key order keeps repeated conversions byte-identical.
        let mut extra: Vec<(&String, &serde_json::Value)> = options.custom_options.iter().collect();
        extra.sort_by_key(|(k, _)| k.as_str());
        for (key, value) in extra {
            let value = serde_yaml::to_value(value)
                .map_err(|e| Error::generation_failed(format!("bad custom option {}: {}", key, e)))?;
            root.insert(key.clone().into(), value);
        }

        serde_yaml::to_string(&Value::Mapping(root))
            .map_err(|e| Error::generation_failed(format!("failed to marshal yaml: {}", e)))
    }
}

fn proxy_entry(p: &Proxy, force_udp: bool) -> Mapping {
    let mut map = Mapping::new();
    map.insert("name".into(), p.name.clone().into());
    map.insert("type".into(), p.proxy_type.as_str().into());
    map.insert("server".into(), p.server.clone().into());
    map.insert("port".into(), u64::from(p.port).into());

    match p.proxy_type {
        ProxyType::Ss => {
            map.insert("cipher".into(), p.method.clone().unwrap_or_default().into());
            map.insert("password".into(), p.password.clone().unwrap_or_default().into());
            if let Some(plugin) = p.plugin.as_deref().filter(|s| !s.is_empty()) {
                // Clash spells the SIP003 obfs plugins `obfs`.
                let plugin = match plugin {
                    "obfs-local" | "simple-obfs" => "obfs",
                    other => other,
                };
                map.insert("plugin".into(), plugin.into());
                if let Some(opts) = p.plugin_opts.as_deref().filter(|s| !s.is_empty()) {
                    map.insert("plugin-opts".into(), Value::Mapping(plugin_opts_entry(plugin, opts)));
                }
            }
        }
        ProxyType::Ssr => {
            map.insert("cipher".into(), p.method.clone().unwrap_or_default().into());
            map.insert("password".into(), p.password.clone().unwrap_or_default().into());
            map.insert("protocol".into(), p.protocol.clone().unwrap_or_default().into());
            map.insert("obfs".into(), p.obfs.clone().unwrap_or_default().into());
            if let Some(param) = p.protocol_param.as_deref().filter(|s| !s.is_empty()) {
                map.insert("protocol-param".into(), param.into());
            }
            if let Some(param) = p.obfs_param.as_deref().filter(|s| !s.is_empty()) {
                map.insert("obfs-param".into(), param.into());
            }
        }
        ProxyType::Vmess => {
            map.insert("uuid".into(), p.uuid.clone().unwrap_or_default().into());
            map.insert("alterId".into(), u64::from(p.aid).into());
            map.insert(
                "cipher".into(),
                p.method.clone().unwrap_or_else(|| "auto".to_string()).into(),
            );
            if let Some(network) = p.network {
                map.insert("network".into(), network_tag(network).into());
            }
            insert_tls(&mut map, p);
            insert_ws_opts(&mut map, p);
        }
        ProxyType::Vless => {
            map.insert("uuid".into(), p.uuid.clone().unwrap_or_default().into());
            if let Some(network) = p.network {
                map.insert("network".into(), network_tag(network).into());
            }
            insert_tls(&mut map, p);
            insert_ws_opts(&mut map, p);
        }
        ProxyType::Trojan => {
            map.insert("password".into(), p.password.clone().unwrap_or_default().into());
            if let Some(sni) = p.sni.as_deref().filter(|s| !s.is_empty()) {
                map.insert("sni".into(), sni.into());
            }
            if p.skip_cert_verify {
                map.insert("skip-cert-verify".into(), true.into());
            }
            if !p.alpn.is_empty() {
                map.insert(
                    "alpn".into(),
                    Value::Sequence(p.alpn.iter().cloned().map(Value::from).collect()),
                );
            }
        }
        ProxyType::Hysteria => {
            map.insert("auth-str".into(), p.password.clone().unwrap_or_default().into());
            if p.up_mbps > 0 {
                map.insert("up".into(), format!("{} Mbps", p.up_mbps).into());
            }
            if p.down_mbps > 0 {
                map.insert("down".into(), format!("{} Mbps", p.down_mbps).into());
            }
            if let Some(sni) = p.sni.as_deref().filter(|s| !s.is_empty()) {
                map.insert("sni".into(), sni.into());
            }
            if p.skip_cert_verify {
                map.insert("skip-cert-verify".into(), true.into());
            }
        }
        ProxyType::Hysteria2 => {
            map.insert("password".into(), p.password.clone().unwrap_or_default().into());
            if let Some(obfs) = p.obfs.as_deref().filter(|s| !s.is_empty()) {
                map.insert("obfs".into(), obfs.into());
            }
            if let Some(param) = p.obfs_param.as_deref().filter(|s| !s.is_empty()) {
                map.insert("obfs-password".into(), param.into());
            }
            if let Some(sni) = p.sni.as_deref().filter(|s| !s.is_empty()) {
                map.insert("sni".into(), sni.into());
            }
            if p.skip_cert_verify {
                map.insert("skip-cert-verify".into(), true.into());
            }
        }
        ProxyType::Snell => {
            map.insert("psk".into(), p.password.clone().unwrap_or_default().into());
            map.insert("version".into(), 3u64.into());
        }
        ProxyType::Http | ProxyType::Https => {
            if let Some(username) = p.username.as_deref() {
                map.insert("username".into(), username.into());
            }
            if let Some(password) = p.password.as_deref() {
                map.insert("password".into(), password.into());
            }
            if p.proxy_type == ProxyType::Https {
                map.insert("tls".into(), true.into());
                if let Some(sni) = p.sni.as_deref().filter(|s| !s.is_empty()) {
                    map.insert("sni".into(), sni.into());
                }
            }
        }
        ProxyType::Socks5 => {
            if let Some(username) = p.username.as_deref() {
                map.insert("username".into(), username.into());
            }
            if let Some(password) = p.password.as_deref() {
                map.insert("password".into(), password.into());
            }
        }
    }

    if p.udp || force_udp {
        map.insert("udp".into(), true.into());
    }
    map
}

fn insert_tls(map: &mut Mapping, p: &Proxy) {
    if p.tls.enabled() {
        map.insert("tls".into(), true.into());
        if let Some(sni) = p.sni.as_deref().filter(|s| !s.is_empty()) {
            map.insert("servername".into(), sni.into());
        }
    }
    if p.skip_cert_verify {
        map.insert("skip-cert-verify".into(), true.into());
    }
}

fn insert_ws_opts(map: &mut Mapping, p: &Proxy) {
    let path = p.path.as_deref().unwrap_or_default();
    let host = p.host.as_deref().unwrap_or_default();
    if path.is_empty() && host.is_empty() {
        return;
    }
    let mut opts = Mapping::new();
    opts.insert("path".into(), path.into());
    if !host.is_empty() {
        let mut headers = Mapping::new();
        headers.insert("Host".into(), host.into());
        opts.insert("headers".into(), Value::Mapping(headers));
    }
    map.insert("ws-opts".into(), Value::Mapping(opts));
}

/// `obfs` plugin options arrive flattened as `obfs=http;obfs-host=x`;
/// Clash wants them as `mode`/`host`.
fn plugin_opts_entry(plugin: &str, opts: &str) -> Mapping {
    let mut map = Mapping::new();
    for pair in opts.split(';') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = match (plugin, key.trim()) {
            ("obfs", "obfs") => "mode",
            ("obfs", "obfs-host") => "host",
            (_, key) => key,
        };
        map.insert(key.into(), value.trim().into());
    }
    map
}

fn network_tag(network: crate::models::Network) -> &'static str {
    match network {
        crate::models::Network::Tcp => "tcp",
        crate::models::Network::Udp => "udp",
        crate::models::Network::TcpUdp => "tcp,udp",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Network, TlsMode};

    fn generator() -> ClashGenerator {
        ClashGenerator::new(Arc::new(TemplateManager::new("templates", "rules")))
    }

    fn sample_ss() -> Proxy {
        let mut p = Proxy::new(ProxyType::Ss, "SS-1", "1.2.3.4", 8388);
        p.method = Some("aes-256-gcm".to_string());
        p.password = Some("pw".to_string());
        p.udp = true;
        p
    }

    fn sample_vmess() -> Proxy {
        let mut p = Proxy::new(ProxyType::Vmess, "VM-1", "example.com", 443);
        p.uuid = Some("uuid-1".to_string());
        p.aid = 0;
        p.network = Some(Network::Tcp);
        p.tls = TlsMode::Require;
        p.host = Some("front.example".to_string());
        p.path = Some("/ws".to_string());
        p
    }

    fn doc_for(proxies: &[Proxy], options: &GenerateOptions) -> serde_yaml::Value {
        let out = generator().generate(proxies, &[], options).unwrap();
        serde_yaml::from_str(&out).unwrap()
    }

    #[test]
    fn test_ss_and_vmess_entries() {
        let doc = doc_for(&[sample_ss(), sample_vmess()], &GenerateOptions::default());
        let proxies = doc["proxies"].as_sequence().unwrap();
        assert_eq!(proxies.len(), 2);

        assert_eq!(proxies[0]["type"], "ss");
        assert_eq!(proxies[0]["cipher"], "aes-256-gcm");
        assert_eq!(proxies[0]["password"], "pw");
        assert_eq!(proxies[0]["udp"], true);

        assert_eq!(proxies[1]["type"], "vmess");
        assert_eq!(proxies[1]["uuid"], "uuid-1");
        assert_eq!(proxies[1]["alterId"], 0);
        assert_eq!(proxies[1]["cipher"], "auto");
        assert_eq!(proxies[1]["tls"], true);
        assert_eq!(proxies[1]["ws-opts"]["path"], "/ws");
        assert_eq!(proxies[1]["ws-opts"]["headers"]["Host"], "front.example");
    }

    #[test]
    fn test_default_groups_reference_all_proxies() {
        let doc = doc_for(&[sample_ss(), sample_vmess()], &GenerateOptions::default());
        let groups = doc["proxy-groups"].as_sequence().unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0]["type"], "select");
        assert_eq!(groups[1]["type"], "url-test");
        assert_eq!(groups[1]["url"], "http://www.gstatic.com/generate_204");
        assert_eq!(groups[1]["interval"], 300);
        assert_eq!(groups[2]["type"], "fallback");
        for group in groups {
            let members = group["proxies"].as_sequence().unwrap();
            assert!(members.iter().any(|m| m.as_str() == Some("SS-1")));
            assert!(members.iter().any(|m| m.as_str() == Some("VM-1")));
        }
    }

    #[test]
    fn test_empty_inputs_produce_empty_proxies_and_terminal_rule() {
        let doc = doc_for(&[], &GenerateOptions::default());
        assert_eq!(doc["proxies"].as_sequence().unwrap().len(), 0);
        let rules = doc["rules"].as_sequence().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0], "MATCH,DIRECT");
    }

    #[test]
    fn test_custom_options_merged_into_document() {
        let mut options = GenerateOptions::default();
        options
            .custom_options
            .insert("mode".to_string(), serde_json::json!("rule"));
        options
            .custom_options
            .insert("port".to_string(), serde_json::json!(7890));
        let doc = doc_for(&[sample_ss()], &options);
        assert_eq!(doc["mode"], "rule");
        assert_eq!(doc["port"], 7890);
    }

    #[test]
    fn test_udp_option_forces_udp_on_all_proxies() {
        let mut p = sample_vmess();
        p.udp = false;
        let mut options = GenerateOptions::default();
        options.udp = true;
        let doc = doc_for(&[p], &options);
        assert_eq!(doc["proxies"][0]["udp"], true);
    }

    #[test]
    fn test_obfs_plugin_opts_use_clash_keys() {
        let mut p = sample_ss();
        p.plugin = Some("obfs-local".to_string());
        p.plugin_opts = Some("obfs=http;obfs-host=bing.com".to_string());
        let doc = doc_for(&[p], &GenerateOptions::default());
        assert_eq!(doc["proxies"][0]["plugin"], "obfs");
        assert_eq!(doc["proxies"][0]["plugin-opts"]["mode"], "http");
        assert_eq!(doc["proxies"][0]["plugin-opts"]["host"], "bing.com");
    }

    #[test]
    fn test_output_is_deterministic() {
        let mut options = GenerateOptions::default();
        options
            .custom_options
            .insert("zz".to_string(), serde_json::json!(1));
        options
            .custom_options
            .insert("aa".to_string(), serde_json::json!(2));
        let a = generator().generate(&[sample_ss()], &[], &options).unwrap();
        let b = generator().generate(&[sample_ss()], &[], &options).unwrap();
        assert_eq!(a, b);
    }
}
