//! ShadowsocksR link parser.
//!
//! `ssr://` wraps a base64 body of the form
//! `HOST:PORT:PROTOCOL:METHOD:OBFS:PASSWORD_B64[/?k=v&...]` where the
//! password and every parameter value are themselves base64 in either
//! alphabet.

use super::{parse_port, Parser, ParseError};
use crate::models::{Proxy, ProxyType};
use crate::utils::base64::decode_any_str;

pub struct SsrParser;

impl Parser for SsrParser {
    fn proxy_type(&self) -> &'static str {
        "ssr"
    }

    fn supports(&self, content: &str) -> bool {
        content.starts_with("ssr://")
    }

    fn parse(&self, content: &str) -> Result<Vec<Proxy>, ParseError> {
        if !self.supports(content) {
            return Err(ParseError::Unsupported);
        }

        let decoded = decode_any_str(&content["ssr://".len()..])
            .ok_or_else(|| ParseError::Malformed("body is not base64".to_string()))?;

        let (main, params) = match decoded.split_once("/?") {
            Some((main, params)) => (main, Some(params)),
            None => (decoded.as_str(), None),
        };

        // Split from the right so IPv6 hosts keep their colons.
        let mut fields = main.rsplitn(6, ':');
        let password_b64 = fields.next().ok_or(ParseError::MissingField("password"))?;
        let obfs = fields.next().ok_or(ParseError::MissingField("obfs"))?;
        let method = fields.next().ok_or(ParseError::MissingField("method"))?;
        let protocol = fields.next().ok_or(ParseError::MissingField("protocol"))?;
        let port = fields.next().ok_or(ParseError::MissingField("port"))?;
        let server = fields.next().ok_or(ParseError::MissingField("server"))?;
        let port = parse_port(port)?;

        let password = decode_any_str(password_b64)
            .ok_or_else(|| ParseError::Malformed("password is not base64".to_string()))?;

        let mut name = None;
        let mut obfs_param = None;
        let mut protocol_param = None;
        let mut group = None;
        if let Some(params) = params {
            for pair in params.split('&') {
                let Some((key, value)) = pair.split_once('=') else {
                    continue;
                };
                // Parameter values are base64 in either alphabet; keep the
                // raw text when decoding fails.
                let value = decode_any_str(value).unwrap_or_else(|| value.to_string());
                match key {
                    "remarks" => name = Some(value).filter(|v| !v.is_empty()),
                    "obfsparam" => obfs_param = Some(value).filter(|v| !v.is_empty()),
                    "protoparam" => protocol_param = Some(value).filter(|v| !v.is_empty()),
                    "group" => group = Some(value).filter(|v| !v.is_empty()),
                    _ => {}
                }
            }
        }

        let name = name
            .or(group)
            .unwrap_or_else(|| format!("SSR-{}", server));
        let mut node = Proxy::new(ProxyType::Ssr, name, server, port);
        node.password = Some(password);
        node.method = Some(method.to_string());
        node.protocol = Some(protocol.to_string());
        node.obfs = Some(obfs.to_string());
        node.protocol_param = protocol_param;
        node.obfs_param = obfs_param;
        node.udp = true;
        Ok(vec![node])
    }
}
