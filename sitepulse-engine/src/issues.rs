// Issue deduplication: one surviving issue per (category, normalized message).

use sitepulse_model::{Issue, IssueCategory};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::debug;

/// Synonym prefix table for message normalization, injected so tests can
/// substitute fixtures. Matched in order; longer prefixes first.
#[derive(Debug, Clone)]
pub struct IssueConfig {
    pub synonym_prefixes: Vec<(String, String)>,
}

impl Default for IssueConfig {
    fn default() -> Self {
        let synonym_prefixes = [
            ("page title", "title"),
            ("title tag", "title"),
            ("not found", "missing"),
            ("no", "missing"),
        ];
        Self {
            synonym_prefixes: synonym_prefixes
                .iter()
                .map(|(pattern, canonical)| (pattern.to_string(), canonical.to_string()))
                .collect(),
        }
    }
}

/// Merges issues referring to the same underlying defect.
///
/// Two issues collide when they share a category and a normalized message.
/// The higher-severity issue wins outright; on equal severity the first-seen
/// issue is kept, its affected pages are unioned with the newcomer's, and
/// missing fix instructions are backfilled.
pub fn dedupe_issues(config: &IssueConfig, issues: &[Issue]) -> Vec<Issue> {
    let mut order: Vec<(IssueCategory, String)> = Vec::new();
    let mut kept: HashMap<(IssueCategory, String), Issue> = HashMap::new();

    for issue in issues {
        let key = (issue.category, normalize_message(config, &issue.message));
        match kept.entry(key) {
            Entry::Vacant(slot) => {
                order.push(slot.key().clone());
                slot.insert(issue.clone());
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if issue.severity.rank() > existing.severity.rank() {
                    debug!(
                        "issue {:?} superseded by higher severity duplicate",
                        existing.message
                    );
                    *existing = issue.clone();
                } else if issue.severity.rank() == existing.severity.rank() {
                    for page in &issue.affected_pages {
                        if !existing.affected_pages.contains(page) {
                            existing.affected_pages.push(page.clone());
                        }
                    }
                    if existing.fix_instructions.is_none() {
                        existing.fix_instructions = issue.fix_instructions.clone();
                    }
                }
            }
        }
    }

    order.into_iter().filter_map(|key| kept.remove(&key)).collect()
}

/// Lower-cases, collapses whitespace, and rewrites a synonym prefix to its
/// canonical token ("page title too short" and "title tag too short" share a
/// key; "no meta description" matches "missing meta description").
pub fn normalize_message(config: &IssueConfig, message: &str) -> String {
    let lowered = message.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");

    for (pattern, canonical) in &config.synonym_prefixes {
        if let Some(rest) = collapsed.strip_prefix(pattern.as_str()) {
            if rest.is_empty() {
                return canonical.clone();
            }
            if let Some(rest) = rest.strip_prefix(' ') {
                return format!("{} {}", canonical, rest);
            }
            // Prefix ended mid-word ("noindex" vs "no"): not a synonym hit.
        }
    }

    collapsed
}
