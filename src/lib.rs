//! subconv: convert proxy subscriptions between client dialects.
//!
//! Input may be a single-link URI, a base64 blob of newline-separated
//! URIs, or a Clash-style YAML document; output is the configuration
//! dialect of a specific client (Clash, Surge, Quantumult, Loon, V2Ray
//! or Surfboard). The crate exposes the conversion entry point
//! ([`convert::Service`]) plus the parser and generator registries; HTTP
//! routing, authentication and the rest of the serving surface are the
//! embedder's business.

pub mod cache;
pub mod convert;
pub mod error;
pub mod fetch;
pub mod generator;
pub mod models;
pub mod parser;
pub mod settings;
pub mod template;
pub mod utils;

pub use cache::{Cache, MemoryCache};
pub use convert::Service;
pub use error::Error;
pub use fetch::{Fetcher, HttpFetcher};
pub use generator::{GenerateOptions, Generator, GeneratorRegistry};
pub use models::{
    ConvertOptions, ConvertRequest, ConvertResponse, Proxy, ProxyGroup, ProxyType, Rule, RuleKind,
    RuleSet, ValidateRequest, ValidateResponse,
};
pub use parser::{Parser, ParserRegistry};
pub use settings::Settings;
pub use template::TemplateManager;
