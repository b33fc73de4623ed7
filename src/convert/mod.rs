//! Conversion orchestrator.
//!
//! Validates the request, probes the response cache, fans one fetch task
//! out per source URL, unions the parsed proxies, runs the transform
//! stage and hands the result to the target generator. One bad source
//! never poisons the request; an empty union does.

pub mod transform;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use log::{info, warn};

use crate::cache::Cache;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::generator::{GenerateOptions, GeneratorRegistry};
use crate::models::{ConvertRequest, ConvertResponse, Proxy, ValidateRequest, ValidateResponse};
use crate::parser::ParserRegistry;
use crate::settings::Settings;
use crate::template::TemplateManager;

pub struct Service {
    parsers: Arc<ParserRegistry>,
    generators: GeneratorRegistry,
    templates: Arc<TemplateManager>,
    cache: Arc<dyn Cache>,
    fetcher: Arc<dyn Fetcher>,
    settings: Settings,
}

impl Service {
    pub fn new(settings: Settings, fetcher: Arc<dyn Fetcher>, cache: Arc<dyn Cache>) -> Self {
        let templates = Arc::new(TemplateManager::new(
            &settings.templates_dir,
            &settings.rules_dir,
        ));
        Service {
            parsers: Arc::new(ParserRegistry::new()),
            generators: GeneratorRegistry::with_defaults(Arc::clone(&templates)),
            templates,
            cache,
            fetcher,
            settings,
        }
    }

    pub fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    pub fn generators(&self) -> &GeneratorRegistry {
        &self.generators
    }

    pub fn templates(&self) -> &TemplateManager {
        &self.templates
    }

    pub fn supported_formats(&self) -> Vec<String> {
        self.generators.supported_formats()
    }

    pub async fn convert(&self, req: &ConvertRequest) -> Result<ConvertResponse> {
        let started = Instant::now();
        self.validate_request(req)?;

        let key = cache_key(req);
        match self.cache.get(&key).await {
            Ok(Some(bytes)) => {
                // A corrupt entry is a miss; the fresh response overwrites it.
                if let Ok(cached) = serde_json::from_slice::<ConvertResponse>(&bytes) {
                    return Ok(cached);
                }
            }
            Ok(None) => {}
            Err(err) => warn!("cache read failed: {}", err),
        }

        let proxies = self.fetch_all(&req.urls).await;
        if proxies.is_empty() {
            return Err(Error::no_proxies());
        }

        let proxies = transform::apply(proxies, &req.options);
        let options = GenerateOptions::from(&req.options);
        let config = self
            .generators
            .generate(&req.target, &proxies, &[], &options)?;

        let response = ConvertResponse {
            config,
            format: req.target.clone(),
            proxies,
            generated: Utc::now().to_rfc3339(),
        };

        match serde_json::to_vec(&response) {
            Ok(bytes) => {
                let ttl = Duration::from_secs(self.settings.cache_ttl_secs);
                if let Err(err) = self.cache.set(&key, bytes, ttl).await {
                    warn!("cache write failed: {}", err);
                }
            }
            Err(err) => warn!("response not cacheable: {}", err),
        }

        info!(
            "conversion completed: target={} urls={} proxies={} duration={:?}",
            req.target,
            req.urls.len(),
            response.proxies.len(),
            started.elapsed()
        );
        Ok(response)
    }

    /// Fetch and parse a single subscription URL as a diagnostic.
    pub async fn validate(&self, req: &ValidateRequest) -> Result<ValidateResponse> {
        let body = match self.fetch_one(&req.url).await {
            Ok(body) => body,
            Err(err) => {
                return Ok(ValidateResponse {
                    valid: false,
                    format: String::new(),
                    proxies_count: 0,
                    error: Some(err.to_string()),
                })
            }
        };

        let content = String::from_utf8_lossy(&body).into_owned();
        let proxies = self.parsers.parse_subscription(&content);
        if proxies.is_empty() {
            return Ok(ValidateResponse {
                valid: false,
                format: detect_format(&content).to_string(),
                proxies_count: 0,
                error: Some(Error::parse_failed("no proxies recognised in content").to_string()),
            });
        }
        Ok(ValidateResponse {
            valid: true,
            format: detect_format(&content).to_string(),
            proxies_count: proxies.len(),
            error: None,
        })
    }

    pub async fn health(&self) -> Result<()> {
        self.cache
            .health()
            .await
            .map_err(|e| Error::cache_error(format!("cache health check failed: {}", e.message)))?;
        self.fetcher
            .health()
            .await
            .map_err(|e| Error::fetch_failed(format!("fetcher health check failed: {}", e.message)))
    }

    fn validate_request(&self, req: &ConvertRequest) -> Result<()> {
        if req.target.is_empty() {
            return Err(Error::invalid_request("target format is required"));
        }
        if req.urls.is_empty() {
            return Err(Error::invalid_request(
                "at least one subscription URL is required",
            ));
        }
        if self.generators.get(&req.target).is_none() {
            return Err(Error::unsupported_target(&req.target));
        }
        Ok(())
    }

    /// One task per source; per-source failures are logged and absorbed.
    /// Per-source proxy order is preserved and sources are concatenated
    /// in request order.
    async fn fetch_all(&self, urls: &[String]) -> Vec<Proxy> {
        let deadline = Duration::from_secs(self.settings.fetch_timeout_secs);
        let handles: Vec<_> = urls
            .iter()
            .map(|url| {
                let url = url.clone();
                let fetcher = Arc::clone(&self.fetcher);
                let parsers = Arc::clone(&self.parsers);
                tokio::spawn(async move {
                    let body = tokio::time::timeout(deadline, fetcher.get(&url))
                        .await
                        .map_err(|_| {
                            Error::timeout(format!("fetching {} exceeded deadline", url))
                        })??;
                    let content = String::from_utf8_lossy(&body).into_owned();
                    Ok::<Vec<Proxy>, Error>(parsers.parse_subscription(&content))
                })
            })
            .collect();

        let mut proxies = Vec::new();
        for (url, joined) in urls.iter().zip(join_all(handles).await) {
            match joined {
                Ok(Ok(parsed)) => {
                    if parsed.is_empty() {
                        warn!("source {} yielded no proxies", url);
                    }
                    proxies.extend(parsed);
                }
                Ok(Err(err)) => warn!("source {} failed: {}", url, err),
                Err(err) => warn!("source task for {} died: {}", url, err),
            }
        }
        proxies
    }

    async fn fetch_one(&self, url: &str) -> Result<Vec<u8>> {
        let deadline = Duration::from_secs(self.settings.fetch_timeout_secs);
        tokio::time::timeout(deadline, self.fetcher.get(url))
            .await
            .map_err(|_| Error::timeout(format!("fetching {} exceeded deadline", url)))?
    }
}

/// Fingerprint of a convert request: target plus the sorted URL set.
fn cache_key(req: &ConvertRequest) -> String {
    let mut urls = req.urls.clone();
    urls.sort();
    format!("convert:{}:{}", req.target, urls.join(","))
}

/// Classify subscription content by scheme probes.
pub fn detect_format(content: &str) -> &'static str {
    if content.contains("ss://") || content.contains("ssr://") {
        return "shadowsocks";
    }
    if content.contains("vmess://") {
        return "vmess";
    }
    if content.contains("trojan://") {
        return "trojan";
    }
    if content.contains("vless://") {
        return "vless";
    }
    if content.contains("hysteria2://") {
        return "hysteria2";
    }
    if content.contains("hysteria://") {
        return "hysteria";
    }
    if content.contains("snell://") {
        return "snell";
    }
    if content.contains("proxies:") {
        return "clash";
    }
    "unknown"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConvertOptions;

    #[test]
    fn test_cache_key_is_order_insensitive() {
        let a = ConvertRequest {
            target: "clash".to_string(),
            urls: vec!["https://b.example".to_string(), "https://a.example".to_string()],
            options: ConvertOptions::default(),
        };
        let b = ConvertRequest {
            target: "clash".to_string(),
            urls: vec!["https://a.example".to_string(), "https://b.example".to_string()],
            options: ConvertOptions::default(),
        };
        assert_eq!(cache_key(&a), cache_key(&b));
        assert_eq!(
            cache_key(&a),
            "convert:clash:https://a.example,https://b.example"
        );
    }

    #[test]
    fn test_cache_key_separates_targets() {
        let mut req = ConvertRequest {
            target: "clash".to_string(),
            urls: vec!["https://a.example".to_string()],
            options: ConvertOptions::default(),
        };
        let clash_key = cache_key(&req);
        req.target = "surge".to_string();
        assert_ne!(clash_key, cache_key(&req));
    }

    #[test]
    fn test_detect_format_probes() {
        assert_eq!(detect_format("ss://abc"), "shadowsocks");
        assert_eq!(detect_format("ssr://abc"), "shadowsocks");
        assert_eq!(detect_format("vmess://abc"), "vmess");
        assert_eq!(detect_format("trojan://pw@h:443"), "trojan");
        assert_eq!(detect_format("hysteria2://pw@h"), "hysteria2");
        assert_eq!(detect_format("hysteria://pw@h:443"), "hysteria");
        assert_eq!(detect_format("proxies:\n  - name: x"), "clash");
        assert_eq!(detect_format("plain text"), "unknown");
    }
}
