//! Surfboard configuration generator.
//!
//! Surfboard speaks a Surge-compatible dialect with a narrower variant
//! set: ss, vmess, trojan, http and socks5.

use super::ruleconvert::render_rules;
use super::{effective_groups, group_members, proxy_names, GenerateOptions, Generator};
use crate::error::Result;
use crate::models::{GroupType, Proxy, ProxyGroup, ProxyType, RuleSet};

pub struct SurfboardGenerator;

impl Generator for SurfboardGenerator {
    fn format(&self) -> &'static str {
        "surfboard"
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
        ProxyType::Ss => format!(
            "{} = ss, {}, {}, encrypt-method={}, password={}",
            p.name,
            p.server,
            p.port,
            p.method.as_deref().unwrap_or_default(),
            p.password.as_deref().unwrap_or_default(),
        ),
        ProxyType::Vmess => {
            let mut line = format!(
                "{} = vmess, {}, {}, username={}",
                p.name,
                p.server,
                p.port,
                p.uuid.as_deref().unwrap_or_default(),
            );
            if let Some(path) = p.path.as_deref().filter(|s| !s.is_empty()) {
                line.push_str(&format!(", ws=true, ws-path={}", path));
            }
            if p.tls.enabled() {
                line.push_str(", tls=true");
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
                line.push_str(&format!(", {}", username));
                if let Some(password) = p.password.as_deref().filter(|s| !s.is_empty()) {
                    line.push_str(&format!(", {}", password));
                }
            }
            line
        }
        ProxyType::Socks5 => {
            let mut line = format!("{} = socks, {}, {}", p.name, p.server, p.port);
            if let Some(username) = p.username.as_deref().filter(|s| !s.is_empty()) {
                line.push_str(&format!(", {}", username));
                if let Some(password) = p.password.as_deref().filter(|s| !s.is_empty()) {
                    line.push_str(&format!(", {}", password));
                }
            }
            line
        }
        ProxyType::Ssr
        | ProxyType::Vless
        | ProxyType::Hysteria
        | ProxyType::Hysteria2
        | ProxyType::Snell => {
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
    if matches!(group.group_type, GroupType::UrlTest | GroupType::Fallback) {
        if let Some(url) = group.url.as_deref() {
            line.push_str(&format!(", url={}", url));
        }
        if group.interval > 0 {
            line.push_str(&format!(", interval={}", group.interval));
        }
    }
    line
}
