// URL canonicalization and same-resource classification.

use sitepulse_model::CrawlContext;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum UrlError {
    #[error("invalid URL: {0}")]
    Invalid(String),
}

/// Lookup tables for canonicalization, injected at construction so tests can
/// substitute fixtures.
#[derive(Debug, Clone)]
pub struct CanonicalConfig {
    /// Compound public suffixes where the registrable domain spans three
    /// labels instead of two.
    pub compound_suffixes: Vec<String>,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        let compound_suffixes = [
            "co.uk", "org.uk", "ac.uk", "gov.uk", "co.nz", "net.nz", "org.nz", "com.au",
            "net.au", "org.au", "co.za", "com.br", "com.mx", "co.jp", "co.kr", "co.in",
            "com.sg", "com.hk", "com.tw", "com.cn",
        ];
        Self {
            compound_suffixes: compound_suffixes.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub struct Canonicalizer {
    config: CanonicalConfig,
}

impl Canonicalizer {
    pub fn new() -> Self {
        Self::with_config(CanonicalConfig::default())
    }

    pub fn with_config(config: CanonicalConfig) -> Self {
        Self { config }
    }

    /// Normalizes `url` into its canonical string form.
    ///
    /// Drops the fragment, strips a trailing slash from non-root paths,
    /// lower-cases the host, drops default ports, and sorts query parameters
    /// by key. When `ctx` is given and the host shares a root domain with the
    /// crawl's preferred hostname, host and scheme are rewritten to the crawl
    /// preference.
    ///
    /// Canonicalization is idempotent: feeding the output back in returns the
    /// same string.
    pub fn canonicalize(&self, url: &str, ctx: Option<&CrawlContext>) -> Result<String, UrlError> {
        let mut parsed =
            Url::parse(url.trim()).map_err(|e| UrlError::Invalid(format!("{}: {}", url, e)))?;

        parsed.set_fragment(None);

        if let Some(ctx) = ctx
            && let Some(host) = parsed.host_str()
            && self.root_domain(host) == self.root_domain(&ctx.preferred_hostname)
        {
            let preferred_host = ctx.preferred_hostname.to_ascii_lowercase();
            let _ = parsed.set_host(Some(&preferred_host));
            let _ = parsed.set_scheme(&ctx.preferred_protocol);
        }

        // Sort query parameters by key. Equal keys keep their input order.
        let mut pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        if pairs.is_empty() {
            parsed.set_query(None);
        } else {
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in &pairs {
                serializer.append_pair(key, value);
            }
            parsed.set_query(Some(&serializer.finish()));
        }

        let path = parsed.path().to_string();
        if path.len() > 1 && path.ends_with('/') {
            let trimmed = path.trim_end_matches('/');
            let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
            parsed.set_path(trimmed);
        }

        Ok(parsed.to_string())
    }

    /// Canonicalization with the one-shot recovery policy for scheme-less
    /// input: prefix `https://` and retry once, then give up and return
    /// `None`. Callers count the `None`s and carry on.
    pub fn canonicalize_with_fallback(
        &self,
        url: &str,
        ctx: Option<&CrawlContext>,
    ) -> Option<String> {
        match self.canonicalize(url, ctx) {
            Ok(canonical) => Some(canonical),
            Err(_) => {
                let retried = format!("https://{}", url.trim());
                match self.canonicalize(&retried, ctx) {
                    Ok(canonical) => Some(canonical),
                    Err(e) => {
                        debug!("dropping unparseable URL {}: {}", url, e);
                        None
                    }
                }
            }
        }
    }

    /// True when both URLs point at the same resource, judged by root domain
    /// alone: `www.example.com` and `example.com` match, `example.org` does
    /// not.
    pub fn is_same_resource(&self, a: &str, b: &str) -> bool {
        match (self.host_of(a), self.host_of(b)) {
            (Some(host_a), Some(host_b)) => {
                self.root_domain(&host_a) == self.root_domain(&host_b)
            }
            _ => false,
        }
    }

    /// Registrable domain of `hostname`: the last two labels, or three when
    /// the trailing pair is a compound public suffix (`co.uk`, `com.au`, ...).
    pub fn root_domain(&self, hostname: &str) -> String {
        let host = hostname.trim_end_matches('.').to_ascii_lowercase();
        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() <= 2 {
            return host;
        }
        let last_two = labels[labels.len() - 2..].join(".");
        let take = if self.config.compound_suffixes.iter().any(|s| *s == last_two) {
            3
        } else {
            2
        };
        if labels.len() <= take {
            host
        } else {
            labels[labels.len() - take..].join(".")
        }
    }

    fn host_of(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url.trim())
            .or_else(|_| Url::parse(&format!("https://{}", url.trim())))
            .ok()?;
        parsed.host_str().map(|h| h.to_string())
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new()
    }
}
