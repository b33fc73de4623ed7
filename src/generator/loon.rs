//! Loon configuration generator.

use super::ruleconvert::render_rules;
use super::{effective_groups, group_members, proxy_names, GenerateOptions, Generator};
use crate::error::Result;
use crate::models::{GroupType, Proxy, ProxyGroup, ProxyType, RuleSet};

pub struct LoonGenerator;

impl Generator for LoonGenerator {
    fn format(&self) -> &'static str {
        "loon"
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

        out.push_str("[Proxy]\n");
        for p in proxies {
            out.push_str(&proxy_line(p));
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

fn proxy_line(p: &Proxy) -> String {
    match p.proxy_type {
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
            if p.tls.enabled() {
                line.push_str(", over-tls=true");
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
                line.push_str(&format!(", tls-name={}", sni));
            }
            line
        }
        ProxyType::Http | ProxyType::Https => format!(
            "{} = {}, {}, {}",
            p.name,
            p.proxy_type.as_str(),
            p.server,
            p.port
        ),
        _ => format!(
            "# {} = {}, {}, {}",
            p.name,
            p.proxy_type.as_str(),
            p.server,
            p.port
        ),
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ss_line_format() {
        let mut p = Proxy::new(ProxyType::Ss, "SS-1", "1.2.3.4", 8388);
        p.method = Some("aes-256-gcm".to_string());
        p.password = Some("pw".to_string());
        let out = LoonGenerator
            .generate(&[p], &[], &GenerateOptions::default())
            .unwrap();
        assert!(out.contains("SS-1 = ss, 1.2.3.4, 8388, encrypt-method=aes-256-gcm, password=pw"));
    }

    #[test]
    fn test_unexpressible_variant_is_commented() {
        let mut p = Proxy::new(ProxyType::Ssr, "R", "1.2.3.4", 443);
        p.password = Some("pw".to_string());
        let out = LoonGenerator
            .generate(&[p], &[], &GenerateOptions::default())
            .unwrap();
        assert!(out.contains("# R = ssr, 1.2.3.4, 443"));
    }

    #[test]
    fn test_sections_and_terminal_rule() {
        let out = LoonGenerator
            .generate(&[], &[], &GenerateOptions::default())
            .unwrap();
        assert!(out.contains("[Proxy]"));
        assert!(out.contains("[Proxy Group]"));
        assert!(out.contains("[Rule]\nFINAL,DIRECT"));
    }
}
