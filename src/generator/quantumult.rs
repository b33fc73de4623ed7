//! Quantumult configuration generator (one proxy per line).

use super::{GenerateOptions, Generator};
use crate::error::Result;
use crate::models::{Proxy, ProxyType, RuleSet};

pub struct QuantumultGenerator;

impl Generator for QuantumultGenerator {
    fn format(&self) -> &'static str {
        "quantumult"
    }

    fn content_type(&self) -> &'static str {
        "text/plain"
    }

    fn generate(
        &self,
        proxies: &[Proxy],
        _rulesets: &[RuleSet],
        _options: &GenerateOptions,
    ) -> Result<String> {
        let mut out = String::new();
        for p in proxies {
            out.push_str(&proxy_line(p));
            out.push('\n');
        }
        Ok(out)
    }
}

fn proxy_line(p: &Proxy) -> String {
    match p.proxy_type {
        ProxyType::Ss => format!(
            "shadowsocks={}:{}, method={}, password={}, tag={}",
            p.server,
            p.port,
            p.method.as_deref().unwrap_or_default(),
            p.password.as_deref().unwrap_or_default(),
            p.name,
        ),
        ProxyType::Ssr => format!(
            "shadowsocksr={}:{}, method={}, password={}, ssr-protocol={}, ssr-protocol-param={}, obfs={}, obfs-param={}, tag={}",
            p.server,
            p.port,
            p.method.as_deref().unwrap_or_default(),
            p.password.as_deref().unwrap_or_default(),
            p.protocol.as_deref().unwrap_or_default(),
            p.protocol_param.as_deref().unwrap_or_default(),
            p.obfs.as_deref().unwrap_or_default(),
            p.obfs_param.as_deref().unwrap_or_default(),
            p.name,
        ),
        ProxyType::Vmess => format!(
            "vmess={}:{}, method=none, password={}, tag={}",
            p.server,
            p.port,
            p.uuid.as_deref().unwrap_or_default(),
            p.name,
        ),
        ProxyType::Trojan => format!(
            "trojan={}:{}, password={}, over-tls=true, tag={}",
            p.server,
            p.port,
            p.password.as_deref().unwrap_or_default(),
            p.name,
        ),
        _ => format!("# Unsupported: {} ({})", p.name, p.proxy_type),
    }
}
