//! Surge configuration generator (INI-like sections).

use super::ruleconvert::render_rules;
use super::{effective_groups, group_members, proxy_names, GenerateOptions, Generator};
use crate::error::Result;
use crate::models::{GroupType, Proxy, ProxyGroup, ProxyType, RuleSet};

pub struct SurgeGenerator;

impl Generator for SurgeGenerator {
    fn format(&self) -> &'static str {
        "surge"
    }

    fn content_type(&self) -> &'static str {
        "text/plain"
    }

    fn generate(
        &self,
        proxies: &[Proxy],
        rulesets: &[RuleSet],
        options: &GenerateOptions,
    ) -> Result<String> {
        let mut out = String::new();
        out.push_str("#!MANAGED-CONFIG https://example.com interval=86400 strict=false\n\n");

        out.push_str("[General]\n");
        out.push_str("loglevel = notify\n");
        out.push_str("dns-server = 8.8.8.8, 1.1.1.1\n");
        out.push_str("skip-proxy = 127.0.0.1, 192.168.0.0/16\n\n");

        out.push_str("[Proxy]\n");
        for p in proxies {
            out.push_str(&proxy_line(p, options.udp));
            out.push('\n');
        }
        out.push('\n');

        out.push_str("[Proxy Group]\n");
        let names = proxy_names(proxies);
        for group in effective_groups(options) {
            out.push_str(&group_line(&group, &names));
            out.push('\n');
        }
        out.push('\n');

        out.push_str("[Rule]\n");
        for rule in render_rules(rulesets, &options.rules, "FINAL") {
            out.push_str(&rule);
            out.push('\n');
        }

        Ok(out)
    }
}

fn proxy_line(p: &Proxy, force_udp: bool) -> String {
    let mut line = match p.proxy_type {
        ProxyType::Ss => {
            let mut line = format!(
                "{} = ss, {}, {}, encrypt-method={}, password={}",
                p.name,
                p.server,
                p.port,
                p.method.as_deref().unwrap_or_default(),
                p.password.as_deref().unwrap_or_default(),
            );
            // simple-obfs options flatten into the proxy line
            if let Some(opts) = p.plugin_opts.as_deref() {
                for pair in opts.split(';') {
                    match pair.split_once('=') {
                        Some(("obfs", v)) | Some(("mode", v)) => {
                            line.push_str(&format!(", obfs={}", v));
                        }
                        Some(("obfs-host", v)) | Some(("host", v)) => {
                            line.push_str(&format!(", obfs-host={}", v));
                        }
                        _ => {}
                    }
                }
            }
            line
        }
        ProxyType::Vmess => {
            let mut line = format!(
                "{} = vmess, {}, {}, username={}",
                p.name,
                p.server,
                p.port,
                p.uuid.as_deref().unwrap_or_default(),
            );
            if p.aid > 0 {
                line.push_str(&format!(", alterId={}", p.aid));
            }
            if let Some(method) = p.method.as_deref().filter(|m| !m.is_empty()) {
                line.push_str(&format!(", encrypt-method={}", method));
            }
            // a path marks a websocket transport
            if let Some(path) = p.path.as_deref().filter(|s| !s.is_empty()) {
                line.push_str(&format!(", ws=true, ws-path={}", path));
                if let Some(host) = p.host.as_deref().filter(|s| !s.is_empty()) {
                    line.push_str(&format!(", ws-headers=Host:{}", host));
                }
            }
            if p.tls.enabled() {
                line.push_str(", tls=true");
                if let Some(sni) = p.sni.as_deref().filter(|s| !s.is_empty()) {
                    line.push_str(&format!(", sni={}", sni));
                }
            }
            line
        }
        ProxyType::Trojan => {
            let mut line = format!(
                "{} = trojan, {}, {}, password={}",
                p.name,
                p.server,
                p.port,
                p.password.as_deref().unwrap_or_default(),
            );
            if let Some(sni) = p.sni.as_deref().filter(|s| !s.is_empty()) {
                line.push_str(&format!(", sni={}", sni));
            }
            line
        }
        ProxyType::Http | ProxyType::Https => {
            let mut line = format!(
                "{} = {}, {}, {}",
                p.name,
                p.proxy_type.as_str(),
                p.server,
                p.port
            );
            if let Some(username) = p.username.as_deref().filter(|s| !s.is_empty()) {
                line.push_str(&format!(", username={}", username));
            }
            if let Some(password) = p.password.as_deref().filter(|s| !s.is_empty()) {
                line.push_str(&format!(", password={}", password));
            }
            line
        }
        ProxyType::Socks5 => {
            let mut line = format!("{} = socks5, {}, {}", p.name, p.server, p.port);
            if let Some(username) = p.username.as_deref().filter(|s| !s.is_empty()) {
                line.push_str(&format!(", username={}", username));
            }
            if let Some(password) = p.password.as_deref().filter(|s| !s.is_empty()) {
                line.push_str(&format!(", password={}", password));
            }
            line
        }
        ProxyType::Snell => {
            let mut line = format!(
                "{} = snell, {}, {}, psk={}, version=3",
                p.name,
                p.server,
                p.port,
                p.password.as_deref().unwrap_or_default(),
            );
            if let Some(obfs) = p.obfs.as_deref().filter(|s| !s.is_empty()) {
                line.push_str(&format!(", obfs={}", obfs));
                if let Some(host) = p.host.as_deref().filter(|s| !s.is_empty()) {
                    line.push_str(&format!(", obfs-host={}", host));
                }
            }
            line
        }
        // Surge cannot express these
        ProxyType::Ssr | ProxyType::Vless | ProxyType::Hysteria | ProxyType::Hysteria2 => {
            return format!("# Unsupported: {} ({})", p.name, p.proxy_type);
        }
    };

    if p.udp || force_udp {
        line.push_str(", udp-relay=true");
    }
    if p.skip_cert_verify {
        line.push_str(", skip-cert-verify=true");
    }
    line
}

fn group_line(group: &ProxyGroup, proxy_names: &[String]) -> String {
    let mut line = format!("{} = {}", group.name, group.group_type.as_str());
    for member in group_members(group, proxy_names) {
        line.push_str(&format!(", {}", member));
    }
    if matches!(group.group_type, GroupType::UrlTest | GroupType::Fallback | GroupType::LoadBalance) {
        if let Some(url) = group.url.as_deref() {
            line.push_str(&format!(", url={}", url));
        }
        if group.interval > 0 {
            line.push_str(&format!(", interval={}", group.interval));
        }
        if group.tolerance > 0 {
            line.push_str(&format!(", tolerance={}", group.tolerance));
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TlsMode;

    fn sample_ss() -> Proxy {
        let mut p = Proxy::new(ProxyType::Ss, "SS-1", "1.2.3.4", 8388);
        p.method = Some("aes-256-gcm".to_string());
        p.password = Some("pw".to_string());
        p.udp = true;
        p
    }

    #[test]
    fn test_sections_present() {
        let out = SurgeGenerator
            .generate(&[sample_ss()], &[], &GenerateOptions::default())
            .unwrap();
        assert!(out.starts_with("#!MANAGED-CONFIG"));
        assert!(out.contains("[General]"));
        assert!(out.contains("[Proxy]"));
        assert!(out.contains("[Proxy Group]"));
        assert!(out.contains("[Rule]"));
        assert!(out.contains("FINAL,DIRECT"));
    }

    #[test]
    fn test_ss_line_format() {
        let out = SurgeGenerator
            .generate(&[sample_ss()], &[], &GenerateOptions::default())
            .unwrap();
        assert!(out.contains(
            "SS-1 = ss, 1.2.3.4, 8388, encrypt-method=aes-256-gcm, password=pw, udp-relay=true"
        ));
    }

    #[test]
    fn test_vmess_ws_tls_line() {
        let mut p = Proxy::new(ProxyType::Vmess, "VM", "example.com", 443);
        p.uuid = Some("uuid-1".to_string());
        p.path = Some("/ws".to_string());
        p.host = Some("front.example".to_string());
        p.tls = TlsMode::Require;
        p.sni = Some("sni.example".to_string());
        let out = SurgeGenerator
            .generate(&[p], &[], &GenerateOptions::default())
            .unwrap();
        assert!(out.contains(
            "VM = vmess, example.com, 443, username=uuid-1, ws=true, ws-path=/ws, ws-headers=Host:front.example, tls=true, sni=sni.example"
        ));
    }

    #[test]
    fn test_unsupported_variant_degrades_to_comment() {
        let mut p = Proxy::new(ProxyType::Ssr, "R-1", "1.2.3.4", 443);
        p.password = Some("pw".to_string());
        let out = SurgeGenerator
            .generate(&[p], &[], &GenerateOptions::default())
            .unwrap();
        assert!(out.contains("# Unsupported: R-1 (ssr)"));
    }

    #[test]
    fn test_default_group_lines() {
        let out = SurgeGenerator
            .generate(&[sample_ss()], &[], &GenerateOptions::default())
            .unwrap();
        assert!(out.contains("🚀 节点选择 = select, ♻️ 自动选择, 🔯 故障转移, DIRECT, SS-1"));
        assert!(out.contains(
            "♻️ 自动选择 = url-test, SS-1, url=http://www.gstatic.com/generate_204, interval=300"
        ));
    }

    #[test]
    fn test_custom_rules_precede_nothing_else() {
        let mut options = GenerateOptions::default();
        options.rules = vec!["DOMAIN-SUFFIX,example.com,DIRECT".to_string()];
        let out = SurgeGenerator.generate(&[sample_ss()], &[], &options).unwrap();
        assert!(out.contains("DOMAIN-SUFFIX,example.com,DIRECT"));
        // terminal only appended when the rule list is empty
        assert!(!out.contains("FINAL,DIRECT"));
    }
}
