//! User-visible error surface.
//!
//! Every failure that escapes the crate carries a stable machine code, a
//! human message, an HTTP-compatible status and optional structured
//! details. Parser-internal failures live in [`crate::parser::ParseError`]
//! and are absorbed per line/per source, never surfacing here directly.

use serde::Serialize;

#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Error {
    pub code: String,
    pub message: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Error {
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Error {
            code: code.into(),
            message: message.into(),
            status,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::new("INVALID_REQUEST", message, 400)
    }

    pub fn unsupported_target(target: &str) -> Self {
        Error::new(
            "UNSUPPORTED_TARGET",
            format!("target format '{}' is not supported", target),
            400,
        )
    }

    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Error::new("FETCH_FAILED", message, 502)
    }

    pub fn parse_failed(message: impl Into<String>) -> Self {
        Error::new("PARSE_FAILED", message, 400)
    }

    pub fn no_proxies() -> Self {
        Error::new("NO_PROXIES", "no valid proxies found in subscriptions", 400)
    }

    pub fn generation_failed(message: impl Into<String>) -> Self {
        Error::new("GENERATION_FAILED", message, 500)
    }

    pub fn cache_error(message: impl Into<String>) -> Self {
        Error::new("CACHE_ERROR", message, 500)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Error::new("TIMEOUT", message, 504)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::new("INTERNAL_ERROR", message, 500)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
