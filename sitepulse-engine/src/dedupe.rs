// Page deduplication by canonical URL.

use crate::canonical::Canonicalizer;
use sitepulse_model::{CrawlContext, CrawledPage};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::debug;

/// Collapses pages sharing a canonical URL down to one record each.
///
/// Within a group the kept page is replaced only when the candidate is
/// strictly more informative: more words, fetched where the kept page was
/// not, or a non-error where the kept page errored. Ties keep the first-seen
/// page, and group order follows first appearance, so output order is
/// deterministic for a given input order. The input is never mutated.
pub fn deduplicate(
    canonicalizer: &Canonicalizer,
    pages: &[CrawledPage],
    ctx: Option<&CrawlContext>,
) -> Vec<CrawledPage> {
    let mut order: Vec<String> = Vec::new();
    let mut kept: HashMap<String, CrawledPage> = HashMap::new();

    for page in pages {
        // Pages whose URL survives neither parse nor the https retry still
        // take part in deduplication, keyed by their raw URL.
        let key = canonicalizer
            .canonicalize_with_fallback(&page.url, ctx)
            .unwrap_or_else(|| page.url.clone());

        match kept.entry(key) {
            Entry::Vacant(slot) => {
                order.push(slot.key().clone());
                slot.insert(page.clone());
            }
            Entry::Occupied(mut slot) => {
                if supersedes(slot.get(), page) {
                    debug!("superseding {} with {}", slot.get().url, page.url);
                    slot.insert(page.clone());
                }
            }
        }
    }

    order.into_iter().filter_map(|key| kept.remove(&key)).collect()
}

/// Splits pages into fetchable (2xx/3xx) and errored (4xx/5xx, plus status 0
/// for never-fetched discoveries).
pub fn filter_valid_pages(pages: &[CrawledPage]) -> (Vec<CrawledPage>, Vec<CrawledPage>) {
    pages
        .iter()
        .cloned()
        .partition(|page| (200..400).contains(&page.status_code))
}

fn supersedes(kept: &CrawledPage, candidate: &CrawledPage) -> bool {
    if candidate.word_count > kept.word_count {
        return true;
    }
    if kept.status_code == 0 && candidate.status_code > 0 {
        return true;
    }
    if kept.status_code >= 400 && candidate.status_code > 0 && candidate.status_code < 400 {
        return true;
    }
    false
}
