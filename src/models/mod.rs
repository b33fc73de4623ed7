//! Core data model: proxies, rules, groups and the request surface.

pub mod group;
pub mod proxy;
pub mod request;
pub mod ruleset;

pub use group::{GroupType, ProxyGroup};
pub use proxy::{Network, Proxy, ProxyType, TlsMode};
pub use request::{
    ConvertOptions, ConvertRequest, ConvertResponse, EmojiRule, RenameRule, ValidateRequest,
    ValidateResponse,
};
pub use ruleset::{Rule, RuleKind, RuleSet};
