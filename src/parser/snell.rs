//! Snell link parser.

use url::Url;

use super::{check_port, name_from_fragment, query_map, require_host, Parser, ParseError};
use crate::models::{Proxy, ProxyType};

pub struct SnellParser;

impl Parser for SnellParser {
    fn proxy_type(&self) -> &'static str {
        "snell"
    }

    fn supports(&self, content: &str) -> bool {
        content.starts_with("snell://")
    }

    fn parse(&self, content: &str) -> Result<Vec<Proxy>, ParseError> {
        if !self.supports(content) {
            return Err(ParseError::Unsupported);
        }

        let url = Url::parse(content).map_err(|e| ParseError::Malformed(e.to_string()))?;
        let server = require_host(&url)?;
        let port = check_port(url.port().ok_or(ParseError::MissingField("port"))?)?;
        let psk = url.username();
        if psk.is_empty() {
            return Err(ParseError::MissingField("password"));
        }

        let query = query_map(&url);
        let name = name_from_fragment(&url, "Snell", &server);
        let mut node = Proxy::new(ProxyType::Snell, name, server, port);
        node.password = Some(psk.to_string());
        node.obfs = query.get("obfs").cloned().filter(|v| !v.is_empty());
        node.host = query.get("obfs-host").cloned().filter(|v| !v.is_empty());
        node.udp = true;
        Ok(vec![node])
    }
}
