//! Rule emission shared by the generators.
//!
//! Rules are rendered in declaration order: enabled rulesets first (each
//! in its own order), then the caller's custom lines. The terminal
//! catch-all is appended only when the result would otherwise be empty;
//! its keyword differs per dialect family (`MATCH` for Clash, `FINAL`
//! for the INI-like family).

use crate::models::{Rule, RuleSet};

pub fn render_rules(rulesets: &[RuleSet], custom: &[String], final_keyword: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for set in rulesets.iter().filter(|s| s.enabled) {
        for rule in &set.rules {
            lines.push(rule_line(rule, final_keyword));
        }
    }
    lines.extend(custom.iter().cloned());

    if lines.is_empty() {
        lines.push(format!("{},DIRECT", final_keyword));
    }
    lines
}

pub fn rule_line(rule: &Rule, final_keyword: &str) -> String {
    if rule.kind.is_terminal() {
        return format!("{},{}", final_keyword, rule.target);
    }
    if rule.kind.is_ip() && rule.no_resolve {
        return format!("{},{},{},no-resolve", rule.kind.as_str(), rule.value, rule.target);
    }
    format!("{},{},{}", rule.kind.as_str(), rule.value, rule.target)
}
