//! Transform stage: the ordered pipeline applied to the merged proxy
//! list before generation.
//!
//! Order is fixed: include, exclude, rename, emoji, sort, dedup. Every
//! step is idempotent, so running the stage twice yields the same list
//! as running it once.

use std::collections::HashSet;

use crate::models::{ConvertOptions, EmojiRule, Proxy, RenameRule};

pub fn apply(proxies: Vec<Proxy>, options: &ConvertOptions) -> Vec<Proxy> {
    let mut proxies = filter_include(proxies, &options.include_remarks);
    proxies = filter_exclude(proxies, &options.exclude_remarks);
    apply_renames(&mut proxies, &options.rename_rules);
    apply_emojis(&mut proxies, &options.emoji_rules);
    if options.sort {
        sort_by_name(&mut proxies);
    }
    dedup(proxies)
}

/// Retain proxies whose name contains at least one pattern. No patterns
/// means no filtering.
pub(crate) fn filter_include(proxies: Vec<Proxy>, patterns: &[String]) -> Vec<Proxy> {
    if patterns.is_empty() {
        return proxies;
    }
    proxies
        .into_iter()
        .filter(|p| patterns.iter().any(|pat| p.name.contains(pat)))
        .collect()
}

/// Drop proxies whose name contains any pattern.
pub(crate) fn filter_exclude(proxies: Vec<Proxy>, patterns: &[String]) -> Vec<Proxy> {
    if patterns.is_empty() {
        return proxies;
    }
    proxies
        .into_iter()
        .filter(|p| !patterns.iter().any(|pat| p.name.contains(pat)))
        .collect()
}

/// Literal substring replacement, each rule applied in order.
pub(crate) fn apply_renames(proxies: &mut [Proxy], rules: &[RenameRule]) {
    for p in proxies.iter_mut() {
        for rule in rules {
            if rule.pattern.is_empty() {
                continue;
            }
            p.name = p.name.replace(&rule.pattern, &rule.replace);
        }
    }
}

/// Prepend `<emoji> ` once per matching rule. Names already carrying the
/// prefix are left alone, which keeps the step idempotent.
pub(crate) fn apply_emojis(proxies: &mut [Proxy], rules: &[EmojiRule]) {
    for p in proxies.iter_mut() {
        for rule in rules {
            if rule.pattern.is_empty() || rule.emoji.is_empty() {
                continue;
            }
            if !p.name.contains(&rule.pattern) {
                continue;
            }
            let prefix = format!("{} ", rule.emoji);
            if !p.name.starts_with(&prefix) {
                p.name = format!("{}{}", prefix, p.name);
            }
        }
    }
}

/// Stable lexicographic sort by name.
pub(crate) fn sort_by_name(proxies: &mut [Proxy]) {
    proxies.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Keep the first occurrence of each `(server, port, type)` triple.
pub(crate) fn dedup(proxies: Vec<Proxy>) -> Vec<Proxy> {
    let mut seen = HashSet::new();
    proxies
        .into_iter()
        .filter(|p| seen.insert(p.endpoint_key()))
        .collect()
}
