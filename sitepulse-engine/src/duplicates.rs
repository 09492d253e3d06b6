// Duplicate-URL auditing: variant grouping, canonical recommendations, and
// canonical-tag conflict classification.

use crate::canonical::Canonicalizer;
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use sitepulse_model::{CrawlContext, CrawledPage};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateType {
    Www,
    TrailingSlash,
    Protocol,
    QueryParams,
    Case,
    CanonicalConflict,
}

/// A set of literal URL variants serving the same resource, with the
/// representative the site should canonicalize to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub canonical_form: String,
    pub preferred_url: String,
    /// Non-preferred variants, in first-seen order.
    pub variant_urls: Vec<String>,
    pub duplicate_type: DuplicateType,
}

/// One page whose author-declared canonical disagrees with the computed
/// preferred URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalConflict {
    pub page_url: String,
    pub declared_canonical: String,
    pub recommended_url: String,
    /// True for the intentional-looking "variant page canonicalized to its
    /// parent category" pattern; tracked but low priority.
    pub related_category: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DuplicateAnalysis {
    pub groups: Vec<DuplicateGroup>,
    /// Non-preferred variants across all groups.
    pub total_duplicate_count: usize,
    /// Real canonical-tag conflicts only; related-category conflicts are
    /// counted separately via `related_conflicts`.
    pub canonical_conflict_count: usize,
    pub conflicts: Vec<CanonicalConflict>,
    pub related_conflicts: Vec<CanonicalConflict>,
    /// Page URL -> the URL it should canonicalize to.
    pub recommended_canonical: BTreeMap<String, String>,
    /// URLs excluded because they survived neither parse nor the https retry.
    pub skipped_invalid_urls: usize,
}

/// Heuristic knobs for the related-category conflict classification. The
/// path-shape rules are tunable, not a hard law.
#[derive(Debug, Clone)]
pub struct DuplicateConfig {
    /// Maximum path segments a page may have beyond its declared canonical
    /// for the prefix relation to count as related-category.
    pub related_max_extra_segments: usize,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            related_max_extra_segments: 2,
        }
    }
}

/// Groups URL variants across the deduplicated page set and audits
/// author-declared canonicals against the computed recommendation.
///
/// Each page URL is expanded into a fixed set of syntactic variants (slash
/// toggled, forced https, www toggled, query stripped, lower-cased); pages
/// whose canonicalized variant sets overlap are clustered together. Clusters
/// with more than one distinct literal URL become duplicate groups.
pub fn analyze_duplicates(
    canonicalizer: &Canonicalizer,
    config: &DuplicateConfig,
    pages: &[CrawledPage],
    ctx: Option<&CrawlContext>,
) -> DuplicateAnalysis {
    let mut analysis = DuplicateAnalysis::default();

    let mut parsed_pages: Vec<Option<Url>> = Vec::with_capacity(pages.len());
    for page in pages {
        let parsed = parse_with_fallback(&page.url);
        if parsed.is_none() {
            debug!("excluding unparseable URL from duplicate analysis: {}", page.url);
            analysis.skipped_invalid_urls += 1;
        }
        parsed_pages.push(parsed);
    }

    // Cluster pages whose canonical key sets intersect. Variants bridge pairs
    // the plain canonicalizer keeps apart (www mismatch, stripped queries).
    let mut key_owner: HashMap<String, usize> = HashMap::new();
    let mut clusters: UnionFind<usize> = UnionFind::new(pages.len());
    for (index, parsed) in parsed_pages.iter().enumerate() {
        let Some(parsed) = parsed else { continue };
        let mut keys: Vec<String> = Vec::new();
        if let Some(key) = canonicalizer.canonicalize_with_fallback(parsed.as_str(), None) {
            keys.push(key);
        }
        for variant in syntactic_variants(parsed) {
            if let Some(key) = canonicalizer.canonicalize_with_fallback(&variant, None) {
                keys.push(key);
            }
        }
        for key in keys {
            match key_owner.entry(key) {
                Entry::Occupied(slot) => {
                    clusters.union(*slot.get(), index);
                }
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
            }
        }
    }

    let mut members_by_root: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut root_order: Vec<usize> = Vec::new();
    for (index, parsed) in parsed_pages.iter().enumerate() {
        if parsed.is_none() {
            continue;
        }
        let root = clusters.find(index);
        let members = members_by_root.entry(root).or_default();
        if members.is_empty() {
            root_order.push(root);
        }
        members.push(index);
    }

    for root in root_order {
        let Some(member_indices) = members_by_root.get(&root) else { continue };

        let mut member_urls: Vec<String> = Vec::new();
        for &index in member_indices {
            if !member_urls.contains(&pages[index].url) {
                member_urls.push(pages[index].url.clone());
            }
        }

        if member_urls.len() < 2 {
            if let Some(url) = member_urls.into_iter().next() {
                analysis.recommended_canonical.insert(url.clone(), url);
            }
            continue;
        }

        let preferred = pick_preferred(&member_urls, ctx);
        let canonical_form = canonicalizer
            .canonicalize_with_fallback(&preferred, None)
            .unwrap_or_else(|| preferred.clone());
        let variant_urls: Vec<String> = member_urls
            .iter()
            .filter(|u| **u != preferred)
            .cloned()
            .collect();
        let duplicate_type = classify_group(&member_urls);

        debug!(
            "duplicate group {:?} ({} variants) -> {}",
            duplicate_type,
            variant_urls.len(),
            preferred
        );

        for url in &member_urls {
            analysis
                .recommended_canonical
                .insert(url.clone(), preferred.clone());
        }
        analysis.total_duplicate_count += variant_urls.len();
        analysis.groups.push(DuplicateGroup {
            canonical_form,
            preferred_url: preferred,
            variant_urls,
            duplicate_type,
        });
    }

    audit_canonical_tags(canonicalizer, config, pages, &mut analysis);

    analysis
}

/// Compares each author-declared canonical against the computed preferred
/// URL. Disagreements are real conflicts (cross-domain, or no shared path
/// segment) or the low-priority related-category pattern (declared canonical
/// is a parent or sibling of the page).
fn audit_canonical_tags(
    canonicalizer: &Canonicalizer,
    config: &DuplicateConfig,
    pages: &[CrawledPage],
    analysis: &mut DuplicateAnalysis,
) {
    for page in pages {
        let Some(declared) = page.canonical_declared.as_deref() else {
            continue;
        };
        let Some(declared_parsed) = parse_with_fallback(declared) else {
            analysis.skipped_invalid_urls += 1;
            continue;
        };
        let Some(page_parsed) = parse_with_fallback(&page.url) else {
            continue;
        };

        let recommended = analysis
            .recommended_canonical
            .get(&page.url)
            .cloned()
            .unwrap_or_else(|| page.url.clone());

        let declared_key = canonicalizer.canonicalize_with_fallback(declared, None);
        let recommended_key = canonicalizer.canonicalize_with_fallback(&recommended, None);
        if declared_key.is_some() && declared_key == recommended_key {
            continue;
        }

        let conflict = CanonicalConflict {
            page_url: page.url.clone(),
            declared_canonical: declared.to_string(),
            recommended_url: recommended,
            related_category: is_related_category(
                canonicalizer,
                config,
                &declared_parsed,
                &page_parsed,
            ),
        };

        if conflict.related_category {
            analysis.related_conflicts.push(conflict);
        } else {
            analysis.canonical_conflict_count += 1;
            analysis.conflicts.push(conflict);
        }
    }
}

fn is_related_category(
    canonicalizer: &Canonicalizer,
    config: &DuplicateConfig,
    declared: &Url,
    page: &Url,
) -> bool {
    let same_root = match (declared.host_str(), page.host_str()) {
        (Some(a), Some(b)) => canonicalizer.root_domain(a) == canonicalizer.root_domain(b),
        _ => false,
    };
    if !same_root {
        return false;
    }

    // An empty declared path, or one sharing no segment with the page path,
    // is a real conflict by definition, never related-category.
    let declared_segments = path_segments(declared);
    let page_segments = path_segments(page);
    if declared_segments.is_empty()
        || declared_segments
            .iter()
            .all(|segment| !page_segments.contains(segment))
    {
        return false;
    }

    // Prefix: the declared canonical is an ancestor of the page, within the
    // configured depth.
    let is_prefix = declared_segments.len() < page_segments.len()
        && page_segments.starts_with(&declared_segments)
        && page_segments.len() - declared_segments.len() <= config.related_max_extra_segments;

    // Sibling: same parent directory.
    let is_sibling = !declared_segments.is_empty()
        && declared_segments.len() == page_segments.len()
        && declared_segments[..declared_segments.len() - 1]
            == page_segments[..page_segments.len() - 1];

    is_prefix || is_sibling
}

fn path_segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Fixed variant set per URL: trailing slash toggled, forced https, www
/// toggled, query stripped, lower-cased.
fn syntactic_variants(parsed: &Url) -> Vec<String> {
    let mut variants = Vec::new();

    let path = parsed.path().to_string();
    if path != "/" {
        let mut toggled = parsed.clone();
        if path.ends_with('/') {
            let trimmed = path.trim_end_matches('/');
            toggled.set_path(if trimmed.is_empty() { "/" } else { trimmed });
        } else {
            toggled.set_path(&format!("{}/", path));
        }
        variants.push(toggled.to_string());
    }

    if parsed.scheme() == "http" {
        let mut https = parsed.clone();
        if https.set_scheme("https").is_ok() {
            variants.push(https.to_string());
        }
    }

    if let Some(host) = parsed.host_str() {
        let toggled_host = match host.strip_prefix("www.") {
            Some(bare) => bare.to_string(),
            None => format!("www.{}", host),
        };
        let mut toggled = parsed.clone();
        if toggled.set_host(Some(&toggled_host)).is_ok() {
            variants.push(toggled.to_string());
        }
    }

    if parsed.query().is_some() {
        let mut stripped = parsed.clone();
        stripped.set_query(None);
        variants.push(stripped.to_string());
    }

    let lowered = parsed.as_str().to_ascii_lowercase();
    if lowered != parsed.as_str() {
        variants.push(lowered);
    }

    variants
}

/// Classifies a group by the highest-priority mismatch present among its
/// members: www > trailing slash > protocol > case > query params.
fn classify_group(urls: &[String]) -> DuplicateType {
    let parsed: Vec<Url> = urls.iter().filter_map(|u| parse_with_fallback(u)).collect();

    let mut has_slash_mismatch = false;
    let mut has_protocol_mismatch = false;
    let mut has_case_mismatch = false;

    for (i, a) in parsed.iter().enumerate() {
        for b in parsed.iter().skip(i + 1) {
            if let (Some(host_a), Some(host_b)) = (a.host_str(), b.host_str()) {
                let bare_a = host_a.strip_prefix("www.").unwrap_or(host_a);
                let bare_b = host_b.strip_prefix("www.").unwrap_or(host_b);
                if bare_a.eq_ignore_ascii_case(bare_b) && !host_a.eq_ignore_ascii_case(host_b) {
                    return DuplicateType::Www;
                }
            }
            if a.path() != b.path()
                && a.path().trim_end_matches('/') == b.path().trim_end_matches('/')
            {
                has_slash_mismatch = true;
            }
            if a.scheme() != b.scheme() {
                has_protocol_mismatch = true;
            }
            if a.as_str() != b.as_str()
                && a.as_str().eq_ignore_ascii_case(b.as_str())
            {
                has_case_mismatch = true;
            }
        }
    }

    if has_slash_mismatch {
        DuplicateType::TrailingSlash
    } else if has_protocol_mismatch {
        DuplicateType::Protocol
    } else if has_case_mismatch {
        DuplicateType::Case
    } else {
        DuplicateType::QueryParams
    }
}

/// Preferred representative: https first, then the host style matching the
/// crawl preference, then shortest string, then lexicographic.
fn pick_preferred(urls: &[String], ctx: Option<&CrawlContext>) -> String {
    let mut pool: Vec<&String> = urls.iter().filter(|u| u.starts_with("https://")).collect();
    if pool.is_empty() {
        pool = urls.iter().collect();
    }

    if let Some(ctx) = ctx {
        let want_www = ctx.preferred_hostname.starts_with("www.");
        let styled: Vec<&String> = pool
            .iter()
            .copied()
            .filter(|u| {
                parse_with_fallback(u)
                    .and_then(|p| p.host_str().map(|h| h.starts_with("www.") == want_www))
                    .unwrap_or(false)
            })
            .collect();
        if !styled.is_empty() {
            pool = styled;
        }
    }

    pool.into_iter()
        .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
        .cloned()
        .unwrap_or_default()
}

fn parse_with_fallback(raw: &str) -> Option<Url> {
    Url::parse(raw.trim())
        .or_else(|_| Url::parse(&format!("https://{}", raw.trim())))
        .ok()
}
