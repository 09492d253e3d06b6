// Audit orchestration: wires the pipeline from raw crawler output to the
// score/graph/duplicate bundle handed back to report assembly.

use crate::canonical::{CanonicalConfig, Canonicalizer};
use crate::dedupe;
use crate::duplicates::{self, DuplicateAnalysis, DuplicateConfig};
use crate::graph::{GraphConfig, LinkGraphBuilder, PageGraph};
use crate::issues::{self, IssueConfig};
use crate::score::{CategoryScores, ScoreEngine, ScoringConfig};
use serde::{Deserialize, Serialize};
use sitepulse_model::{CrawlContext, CrawledPage, Issue, SiteFlags};
use tracing::info;

/// All engine lookup tables and thresholds, injected at construction.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub canonical: CanonicalConfig,
    pub duplicates: DuplicateConfig,
    pub graph: GraphConfig,
    pub issues: IssueConfig,
    pub scoring: ScoringConfig,
}

/// The immutable result bundle for one audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditOutcome {
    pub scores: CategoryScores,
    pub graph: PageGraph,
    pub duplicates: DuplicateAnalysis,
    /// Deduplicated issues, highest-severity survivor per defect.
    pub issues: Vec<Issue>,
    pub valid_page_count: usize,
    pub error_page_count: usize,
}

/// Stateless audit pipeline. `run` retains nothing between calls, so one
/// engine can serve concurrent audits.
pub struct AuditEngine {
    canonicalizer: Canonicalizer,
    graph_builder: LinkGraphBuilder,
    duplicate_config: DuplicateConfig,
    issue_config: IssueConfig,
    scorer: ScoreEngine,
}

impl AuditEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            canonicalizer: Canonicalizer::with_config(config.canonical),
            graph_builder: LinkGraphBuilder::with_config(config.graph),
            duplicate_config: config.duplicates,
            issue_config: config.issues,
            scorer: ScoreEngine::with_config(config.scoring),
        }
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    /// Runs a full audit over already-fetched crawler output.
    ///
    /// Pages are deduplicated first; the duplicate auditor and the link graph
    /// builder then each take one pass over the deduplicated set, issues are
    /// merged, and the scoring engine folds everything into category scores.
    pub fn run(
        &self,
        pages: &[CrawledPage],
        issues: &[Issue],
        ctx: Option<&CrawlContext>,
        site: &SiteFlags,
    ) -> AuditOutcome {
        let deduped = dedupe::deduplicate(&self.canonicalizer, pages, ctx);
        let (valid, errored) = dedupe::filter_valid_pages(&deduped);
        info!(
            "auditing {} pages ({} fetchable, {} errored) and {} raw issues",
            deduped.len(),
            valid.len(),
            errored.len(),
            issues.len()
        );

        let duplicates = duplicates::analyze_duplicates(
            &self.canonicalizer,
            &self.duplicate_config,
            &deduped,
            ctx,
        );
        let graph = self.graph_builder.build(&deduped);
        let issues = issues::dedupe_issues(&self.issue_config, issues);
        let scores = self.scorer.score(&issues, &deduped, site);

        AuditOutcome {
            scores,
            graph,
            duplicates,
            issues,
            valid_page_count: valid.len(),
            error_page_count: errored.len(),
        }
    }
}

impl Default for AuditEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
