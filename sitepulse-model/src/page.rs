use serde::{Deserialize, Serialize};

/// One URL observed during a crawl, as handed over by the external crawler.
///
/// Records are immutable once they reach the engine; when a duplicate with
/// more information is found the record is superseded, never mutated in
/// place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawledPage {
    /// Raw URL, exactly as fetched.
    pub url: String,
    /// HTTP status code; 0 means the URL was discovered but never fetched.
    pub status_code: u16,
    pub word_count: usize,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    /// Author-declared canonical URL, when the page carries one.
    pub canonical_declared: Option<String>,
    /// Ordered outbound internal link targets found on the page. `None` when
    /// the crawler only reported a count (see `outbound_link_count`).
    pub outbound_internal_links: Option<Vec<String>>,
    /// Outbound internal link count for crawlers that do not retain targets.
    pub outbound_link_count: Option<usize>,
    pub h1_count: usize,
    pub h2_count: usize,
    pub image_count: usize,
    pub missing_alt_count: usize,
    pub has_viewport: bool,
}

impl CrawledPage {
    /// Builds an empty page record for `url`. Status code 0 marks the page
    /// as discovered-but-unfetched until the crawler fills it in.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status_code: 0,
            word_count: 0,
            title: None,
            meta_description: None,
            canonical_declared: None,
            outbound_internal_links: None,
            outbound_link_count: None,
            h1_count: 0,
            h2_count: 0,
            image_count: 0,
            missing_alt_count: 0,
            has_viewport: false,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_word_count(mut self, word_count: usize) -> Self {
        self.word_count = word_count;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_meta_description(mut self, meta: impl Into<String>) -> Self {
        self.meta_description = Some(meta.into());
        self
    }

    pub fn with_canonical(mut self, canonical: impl Into<String>) -> Self {
        self.canonical_declared = Some(canonical.into());
        self
    }

    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outbound_internal_links = Some(links.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_link_count(mut self, count: usize) -> Self {
        self.outbound_link_count = Some(count);
        self
    }

    pub fn with_headings(mut self, h1_count: usize, h2_count: usize) -> Self {
        self.h1_count = h1_count;
        self.h2_count = h2_count;
        self
    }

    pub fn with_images(mut self, image_count: usize, missing_alt_count: usize) -> Self {
        self.image_count = image_count;
        self.missing_alt_count = missing_alt_count;
        self
    }

    pub fn with_viewport(mut self, has_viewport: bool) -> Self {
        self.has_viewport = has_viewport;
        self
    }
}

/// Crawl-wide context established from the first successfully fetched URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlContext {
    /// Hostname the site prefers to serve from (www vs bare).
    pub preferred_hostname: String,
    /// "http" or "https".
    pub preferred_protocol: String,
    /// Registrable domain of the crawl target.
    pub root_domain: String,
}

impl CrawlContext {
    pub fn new(
        preferred_hostname: impl Into<String>,
        preferred_protocol: impl Into<String>,
        root_domain: impl Into<String>,
    ) -> Self {
        Self {
            preferred_hostname: preferred_hostname.into(),
            preferred_protocol: preferred_protocol.into(),
            root_domain: root_domain.into(),
        }
    }
}

/// Site-wide signals checked once per audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SiteFlags {
    pub robots_txt_exists: bool,
    pub sitemap_exists: bool,
}
