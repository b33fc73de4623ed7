//! Template manager: base-template rendering and rule-list loading.
//!
//! Template sources are cached after first load; the cache is guarded by
//! a reader-writer lock so concurrent conversions can render the same
//! template while the first loader inserts it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::error;
use minijinja::Environment;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{Rule, RuleKind, RuleSet};

pub struct TemplateManager {
    templates_dir: PathBuf,
    rules_dir: PathBuf,
    sources: RwLock<HashMap<String, String>>,
}

impl TemplateManager {
    pub fn new(templates_dir: impl AsRef<Path>, rules_dir: impl AsRef<Path>) -> Self {
        TemplateManager {
            templates_dir: templates_dir.as_ref().to_path_buf(),
            rules_dir: rules_dir.as_ref().to_path_buf(),
            sources: RwLock::new(HashMap::new()),
        }
    }

    /// Render the named template with the given context.
    pub fn render(&self, name: &str, ctx: impl Serialize) -> Result<String> {
        let source = self.load_source(name)?;

        let mut env = Environment::new();
        env.add_filter("url_encode", filter_url_encode);
        env.add_filter("url_decode", filter_url_decode);

        let template = env.template_from_str(&source).map_err(|e| {
            error!("template {} failed to parse: {}", name, e);
            Error::generation_failed(format!("template {} failed to parse: {}", name, e))
        })?;
        template.render(ctx).map_err(|e| {
            error!("template {} failed to render: {}", name, e);
            Error::generation_failed(format!("template {} failed to render: {}", name, e))
        })
    }

    fn load_source(&self, name: &str) -> Result<String> {
        if let Some(source) = self
            .sources
            .read()
            .map_err(|_| Error::internal("template cache lock poisoned"))?
            .get(name)
        {
            return Ok(source.clone());
        }

        let path = self.templates_dir.join(name);
        let source = std::fs::read_to_string(&path)
            .map_err(|e| Error::internal(format!("template {} not readable: {}", name, e)))?;

        let mut cache = self
            .sources
            .write()
            .map_err(|_| Error::internal("template cache lock poisoned"))?;
        // Another conversion may have loaded it while we read the file;
        // first insert wins either way.
        Ok(cache
            .entry(name.to_string())
            .or_insert(source)
            .clone())
    }

    /// Load a rule-list file (`KIND,VALUE[,no-resolve]` per line, `#`
    /// comments) into a ruleset pointing every rule at `target`.
    pub fn load_rules(&self, file: &str, target: &str) -> Result<RuleSet> {
        let path = self.rules_dir.join(file);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::internal(format!("rule list {} not readable: {}", file, e)))?;

        let mut rules = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split(',').map(str::trim);
            let Some(kind) = fields.next().and_then(RuleKind::from_tag) else {
                continue;
            };
            let value = if kind.is_terminal() {
                String::new()
            } else {
                match fields.next() {
                    Some(v) if !v.is_empty() => v.to_string(),
                    _ => continue,
                }
            };
            let mut rule = Rule::new(kind, value, target);
            rule.no_resolve = fields.any(|f| f == "no-resolve");
            rules.push(rule);
        }

        let mut set = RuleSet::new(file, rules);
        set.source = path.display().to_string();
        Ok(set)
    }

    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.sources.write() {
            cache.clear();
        }
    }
}

fn filter_url_encode(value: String) -> String {
    urlencoding::encode(&value).into_owned()
}

fn filter_url_decode(value: String) -> String {
    match urlencoding::decode(&value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn manager_with(files: &[(&str, &str)]) -> (tempfile::TempDir, TemplateManager) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
            f.write_all(content.as_bytes()).unwrap();
        }
        let manager = TemplateManager::new(dir.path(), dir.path());
        (dir, manager)
    }

    #[test]
    fn test_render_with_context() {
        let (_dir, manager) = manager_with(&[("base.tpl", "port: {{ port }}\n")]);
        let out = manager
            .render("base.tpl", minijinja::context! { port => 7890 })
            .unwrap();
        assert_eq!(out, "port: 7890\n");
    }

    #[test]
    fn test_missing_template_errors() {
        let (_dir, manager) = manager_with(&[]);
        assert!(manager.render("absent.tpl", minijinja::context! {}).is_err());
    }

    #[test]
    fn test_source_cache_survives_file_removal() {
        let (dir, manager) = manager_with(&[("t.tpl", "hello")]);
        assert_eq!(manager.render("t.tpl", minijinja::context! {}).unwrap(), "hello");
        std::fs::remove_file(dir.path().join("t.tpl")).unwrap();
        // second render is served from the cache
        assert_eq!(manager.render("t.tpl", minijinja::context! {}).unwrap(), "hello");
    }

    #[test]
    fn test_load_rules_skips_comments_and_flags_no_resolve() {
        let (_dir, manager) = manager_with(&[(
            "cn.list",
            "# header\nDOMAIN-SUFFIX,example.cn\nIP-CIDR,10.0.0.0/8,no-resolve\n\nFINAL\n",
        )]);
        let set = manager.load_rules("cn.list", "DIRECT").unwrap();
        assert_eq!(set.rules.len(), 3);
        assert_eq!(set.rules[0].kind, RuleKind::DomainSuffix);
        assert_eq!(set.rules[0].target, "DIRECT");
        assert!(set.rules[1].no_resolve);
        assert_eq!(set.rules[2].kind, RuleKind::Final);
        assert!(set.enabled);
    }
}
