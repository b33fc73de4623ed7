//! Generator pipeline: mapping the normalised proxy list onto the six
//! output dialects.
//!
//! A [`Generator`] produces one dialect; the [`GeneratorRegistry`] is a
//! string-keyed table populated at startup and read-only afterwards.
//! Feature coercion is per-dialect: a variant the target cannot express
//! degrades to a comment line instead of failing the conversion.

pub mod clash;
pub mod loon;
pub mod quantumult;
pub mod ruleconvert;
pub mod surfboard;
pub mod surge;
pub mod v2ray;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{ConvertOptions, GroupType, Proxy, ProxyGroup, RuleSet};
use crate::template::TemplateManager;

/// Probe URL and interval shared by the synthesised auto groups.
const DEFAULT_TEST_URL: &str = "http://www.gstatic.com/generate_204";
const DEFAULT_TEST_INTERVAL: u32 = 300;

/// One output dialect.
pub trait Generator: Send + Sync {
    /// Registry key of this dialect.
    fn format(&self) -> &'static str;

    /// MIME type of the generated document.
    fn content_type(&self) -> &'static str;

    fn generate(
        &self,
        proxies: &[Proxy],
        rulesets: &[RuleSet],
        options: &GenerateOptions,
    ) -> Result<String>;
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub proxy_groups: Vec<ProxyGroup>,
    /// Custom rule lines appended after all ruleset rules.
    pub rules: Vec<String>,
    pub base_template: Option<String>,
    /// Force UDP forwarding on every emitted proxy.
    pub udp: bool,
    /// Extra top-level keys merged into structured outputs.
    pub custom_options: HashMap<String, serde_json::Value>,
}

impl From<&ConvertOptions> for GenerateOptions {
    fn from(options: &ConvertOptions) -> Self {
        GenerateOptions {
            proxy_groups: options.proxy_groups.clone(),
            rules: options.rules.clone(),
            base_template: options.base_template.clone(),
            udp: options.udp,
            custom_options: options.custom_options.clone(),
        }
    }
}

/// String-keyed generator table.
pub struct GeneratorRegistry {
    generators: HashMap<&'static str, Box<dyn Generator>>,
}

impl GeneratorRegistry {
    pub fn empty() -> Self {
        GeneratorRegistry {
            generators: HashMap::new(),
        }
    }

    /// The six built-in dialects.
    pub fn with_defaults(templates: Arc<TemplateManager>) -> Self {
        let mut registry = GeneratorRegistry::empty();
        registry.register(Box::new(clash::ClashGenerator::new(templates)));
        registry.register(Box::new(surge::SurgeGenerator));
        registry.register(Box::new(quantumult::QuantumultGenerator));
        registry.register(Box::new(loon::LoonGenerator));
        registry.register(Box::new(v2ray::V2rayGenerator));
        registry.register(Box::new(surfboard::SurfboardGenerator));
        registry
    }

    pub fn register(&mut self, generator: Box<dyn Generator>) {
        self.generators.insert(generator.format(), generator);
    }

    pub fn get(&self, format: &str) -> Option<&dyn Generator> {
        self.generators.get(format).map(|g| g.as_ref())
    }

    pub fn supported_formats(&self) -> Vec<String> {
        let mut formats: Vec<String> = self.generators.keys().map(|k| k.to_string()).collect();
        formats.sort();
        formats
    }

    pub fn generate(
        &self,
        format: &str,
        proxies: &[Proxy],
        rulesets: &[RuleSet],
        options: &GenerateOptions,
    ) -> Result<String> {
        let generator = self
            .get(format)
            .ok_or_else(|| Error::unsupported_target(format))?;
        generator.generate(proxies, rulesets, options)
    }
}

/// The groups a generator actually emits: the request's own groups, or
/// the three synthesised defaults when none were supplied.
pub fn effective_groups(options: &GenerateOptions) -> Vec<ProxyGroup> {
    if !options.proxy_groups.is_empty() {
        return options.proxy_groups.clone();
    }
    default_groups()
}

fn default_groups() -> Vec<ProxyGroup> {
    let mut select = ProxyGroup::new("🚀 节点选择", GroupType::Select);
    select.proxies = vec![
        "♻️ 自动选择".to_string(),
        "🔯 故障转移".to_string(),
        "DIRECT".to_string(),
    ];

    let mut auto = ProxyGroup::new("♻️ 自动选择", GroupType::UrlTest);
    auto.url = Some(DEFAULT_TEST_URL.to_string());
    auto.interval = DEFAULT_TEST_INTERVAL;

    let mut fallback = ProxyGroup::new("🔯 故障转移", GroupType::Fallback);
    fallback.url = Some(DEFAULT_TEST_URL.to_string());
    fallback.interval = DEFAULT_TEST_INTERVAL;

    vec![select, auto, fallback]
}

/// Member list of one group: its literal members, extended by every proxy
/// name containing the filter substring, or by all proxy names when no
/// filter is set.
pub fn group_members(group: &ProxyGroup, proxy_names: &[String]) -> Vec<String> {
    let mut members = group.proxies.clone();
    match group.filter.as_deref().filter(|f| !f.is_empty()) {
        Some(filter) => {
            members.extend(proxy_names.iter().filter(|n| n.contains(filter)).cloned())
        }
        None => members.extend(proxy_names.iter().cloned()),
    }
    members
}

pub(crate) fn proxy_names(proxies: &[Proxy]) -> Vec<String> {
    proxies.iter().map(|p| p.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyType;

    fn named(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_default_groups_shape() {
        let groups = default_groups();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].group_type, GroupType::Select);
        assert_eq!(groups[1].group_type, GroupType::UrlTest);
        assert_eq!(groups[2].group_type, GroupType::Fallback);
        assert_eq!(groups[1].url.as_deref(), Some(DEFAULT_TEST_URL));
        assert_eq!(groups[1].interval, 300);
        assert!(groups[0].proxies.contains(&"DIRECT".to_string()));
    }

    #[test]
    fn test_effective_groups_prefers_request_groups() {
        let mut options = GenerateOptions::default();
        options.proxy_groups = vec![ProxyGroup::new("Mine", GroupType::Select)];
        let groups = effective_groups(&options);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Mine");
    }

    #[test]
    fn test_group_members_without_filter_appends_all() {
        let mut group = ProxyGroup::new("G", GroupType::Select);
        group.proxies = vec!["DIRECT".to_string()];
        let members = group_members(&group, &named(&["A", "B"]));
        assert_eq!(members, named(&["DIRECT", "A", "B"]));
    }

    #[test]
    fn test_group_members_filter_is_substring_match() {
        let mut group = ProxyGroup::new("HK", GroupType::UrlTest);
        group.filter = Some("HK".to_string());
        let members = group_members(&group, &named(&["HK-1", "JP-1", "My HK Node"]));
        assert_eq!(members, named(&["HK-1", "My HK Node"]));
    }

    #[test]
    fn test_registry_rejects_unknown_format() {
        let registry = GeneratorRegistry::empty();
        let err = registry
            .generate("surge", &[], &[], &GenerateOptions::default())
            .unwrap_err();
        assert_eq!(err.code, "UNSUPPORTED_TARGET");
    }

    #[test]
    fn test_registry_lists_default_formats() {
        let templates = Arc::new(TemplateManager::new("templates", "rules"));
        let registry = GeneratorRegistry::with_defaults(templates);
        assert_eq!(
            registry.supported_formats(),
            vec!["clash", "loon", "quantumult", "surfboard", "surge", "v2ray"]
        );
        assert_eq!(registry.get("clash").unwrap().content_type(), "application/x-yaml");
    }

    #[test]
    fn test_proxy_names_preserves_order() {
        let proxies = vec![
            Proxy::new(ProxyType::Ss, "b", "s1", 1),
            Proxy::new(ProxyType::Ss, "a", "s2", 2),
        ];
        assert_eq!(proxy_names(&proxies), named(&["b", "a"]));
    }
}
