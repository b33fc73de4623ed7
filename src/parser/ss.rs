//! Shadowsocks link parser: legacy `ss://base64(...)` and SIP002 forms.

use url::Url;

use super::{check_port, name_from_fragment, parse_port, query_map, Parser, ParseError};
use crate::models::{Proxy, ProxyType};
use crate::utils::base64::decode_any_str;

pub struct SsParser;

impl Parser for SsParser {
    fn proxy_type(&self) -> &'static str {
        "ss"
    }

    fn supports(&self, content: &str) -> bool {
        content.starts_with("ss://")
    }

    fn parse(&self, content: &str) -> Result<Vec<Proxy>, ParseError> {
        if !self.supports(content) {
            return Err(ParseError::Unsupported);
        }

        // Some producers write `/?plugin=...`; normalise before URL parsing.
        let link = content.replacen("/?", "?", 1);
        let mut body = link["ss://".len()..].to_string();

        let mut fragment = None;
        if let Some(pos) = body.find('#') {
            let raw = &body[pos + 1..];
            if !raw.is_empty() {
                fragment = Some(
                    urlencoding::decode(raw)
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| raw.to_string()),
                );
            }
            body.truncate(pos);
        }

        // Legacy form: the entire remainder is base64 of
        // `method:password@host:port`.
        if let Some(decoded) = decode_any_str(&body) {
            if decoded.contains('@') {
                let node = parse_legacy(&decoded, fragment)?;
                return Ok(vec![node]);
            }
        }

        let node = parse_sip002(&link)?;
        Ok(vec![node])
    }
}

fn parse_legacy(decoded: &str, fragment: Option<String>) -> Result<Proxy, ParseError> {
    let (secret, endpoint) = decoded
        .rsplit_once('@')
        .ok_or_else(|| ParseError::Malformed("legacy form lacks '@'".to_string()))?;
    let (method, password) = secret
        .split_once(':')
        .ok_or(ParseError::MissingField("password"))?;
    let (server, port) = endpoint
        .rsplit_once(':')
        .ok_or(ParseError::MissingField("port"))?;
    let port = parse_port(port)?;

    let name = fragment.unwrap_or_else(|| format!("SS-{}", server));
    let mut node = Proxy::new(ProxyType::Ss, name, server, port);
    node.method = Some(method.to_string());
    node.password = Some(password.to_string());
    node.udp = true;
    Ok(node)
}

fn parse_sip002(link: &str) -> Result<Proxy, ParseError> {
    let url = Url::parse(link).map_err(|e| ParseError::Malformed(e.to_string()))?;
    let server = super::require_host(&url)?;
    let port = check_port(url.port().ok_or(ParseError::MissingField("port"))?)?;

    // Userinfo is either plain `method:password` or base64 of the same.
    let user = urlencoding::decode(url.username())
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| url.username().to_string());
    let (method, password) = match url.password() {
        Some(password) => {
            let password = urlencoding::decode(password)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| password.to_string());
            (user, password)
        }
        None => {
            let decoded = decode_any_str(&user)
                .ok_or_else(|| ParseError::Malformed("userinfo is not base64".to_string()))?;
            let (method, password) = decoded
                .split_once(':')
                .ok_or(ParseError::MissingField("password"))?;
            (method.to_string(), password.to_string())
        }
    };

    let query = query_map(&url);
    let mut plugin = None;
    let mut plugin_opts = None;
    if let Some(raw) = query.get("plugin").filter(|v| !v.is_empty()) {
        match raw.split_once(';') {
            Some((name, opts)) => {
                plugin = Some(name.to_string());
                plugin_opts = Some(opts.to_string());
            }
            None => plugin = Some(raw.clone()),
        }
    }
    if let Some(opts) = query.get("plugin-opts").filter(|v| !v.is_empty()) {
        plugin_opts = Some(opts.clone());
    }

    let name = name_from_fragment(&url, "SS", &server);
    let mut node = Proxy::new(ProxyType::Ss, name, server, port);
    node.method = Some(method);
    node.password = Some(password);
    node.plugin = plugin;
    node.plugin_opts = plugin_opts;
    node.udp = true;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(link: &str) -> Proxy {
        SsParser.parse(link).unwrap().remove(0)
    }

    #[test]
    fn test_sip002_with_fragment() {
        let node = parse_one("ss://YWVzLTI1Ni1nY206dGVzdA==@127.0.0.1:8388#Test");
        assert_eq!(node.proxy_type, ProxyType::Ss);
        assert_eq!(node.server, "127.0.0.1");
        assert_eq!(node.port, 8388);
        assert_eq!(node.method.as_deref(), Some("aes-256-gcm"));
        assert_eq!(node.password.as_deref(), Some("test"));
        assert_eq!(node.name, "Test");
        assert!(node.udp);
    }

    #[test]
    fn test_legacy_form() {
        // base64(chacha20-ietf-poly1305:password@127.0.0.1:8080)
        let node =
            parse_one("ss://Y2hhY2hhMjAtaWV0Zi1wb2x5MTMwNTpwYXNzd29yZEAxMjcuMC4wLjE6ODA4MA==");
        assert_eq!(node.server, "127.0.0.1");
        assert_eq!(node.port, 8080);
        assert_eq!(node.method.as_deref(), Some("chacha20-ietf-poly1305"));
        assert_eq!(node.password.as_deref(), Some("password"));
        assert_eq!(node.name, "SS-127.0.0.1");
    }

    #[test]
    fn test_plain_userinfo() {
        let node = parse_one("ss://aes-256-gcm:password123@example.com:8388");
        assert_eq!(node.method.as_deref(), Some("aes-256-gcm"));
        assert_eq!(node.password.as_deref(), Some("password123"));
    }

    #[test]
    fn test_password_containing_colon_survives() {
        // base64(chacha20-ietf-poly1305:pass:word)
        let node = parse_one("ss://Y2hhY2hhMjAtaWV0Zi1wb2x5MTMwNTpwYXNzOndvcmQ=@example.com:8388");
        assert_eq!(node.password.as_deref(), Some("pass:word"));
    }

    #[test]
    fn test_plugin_and_opts_split() {
        let node = parse_one(
            "ss://YWVzLTI1Ni1nY206dGVzdA==@example.com:8388/?plugin=obfs-local;obfs=http;obfs-host=example.com#P",
        );
        assert_eq!(node.plugin.as_deref(), Some("obfs-local"));
        assert_eq!(
            node.plugin_opts.as_deref(),
            Some("obfs=http;obfs-host=example.com")
        );
        assert_eq!(node.name, "P");
    }

    #[test]
    fn test_percent_encoded_fragment_decodes() {
        let node = parse_one("ss://YWVzLTI1Ni1nY206dGVzdA==@example.com:8388#Example%20Server");
        assert_eq!(node.name, "Example Server");
    }

    #[test]
    fn test_missing_port_is_rejected() {
        assert!(matches!(
            SsParser.parse("ss://YWVzLTI1Ni1nY206dGVzdA==@example.com"),
            Err(ParseError::MissingField("port"))
        ));
    }

    #[test]
    fn test_port_zero_is_rejected() {
        assert!(matches!(
            SsParser.parse("ss://YWVzLTI1Ni1nY206dGVzdA==@example.com:0"),
            Err(ParseError::BadPort(_))
        ));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(SsParser.parse("ss://invalid").is_err());
    }
}
