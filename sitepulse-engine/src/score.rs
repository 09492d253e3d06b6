// Category scoring: bounded, non-linear, with severity ceilings.

use serde::{Deserialize, Serialize};
use sitepulse_model::{CrawledPage, Issue, IssueCategory, Severity, SiteFlags};
use tracing::debug;

// Page-attribute deduction weights, applied to the fraction of pages
// exhibiting each defect. These run independently of issue text so a silent
// analyzer cannot inflate a category.
const ERROR_PAGE_WEIGHT: f64 = 30.0;
const MISSING_ROBOTS_DEDUCTION: f64 = 10.0;
const MISSING_SITEMAP_DEDUCTION: f64 = 10.0;
const MISSING_TITLE_WEIGHT: f64 = 25.0;
const MISSING_META_WEIGHT: f64 = 20.0;
const MISSING_H1_WEIGHT: f64 = 15.0;
const THIN_CONTENT_WEIGHT: f64 = 30.0;
const THIN_CONTENT_WORDS: usize = 300;
const MISSING_ALT_WEIGHT: f64 = 30.0;
const MISSING_VIEWPORT_WEIGHT: f64 = 20.0;

/// Independent accessibility check families. Scoring caps the category when
/// too few of these produced any issue at all, so a shallow audit cannot
/// masquerade as a clean one.
const ACCESSIBILITY_CHECK_KEYWORDS: [&str; 5] = ["alt", "aria", "contrast", "keyboard", "label"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub technical: f64,
    pub on_page: f64,
    pub content: f64,
    pub accessibility: f64,
    /// Reported but excluded from the overall score.
    pub performance: f64,
    pub overall_score: f64,
}

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub high_deduction: f64,
    pub medium_deduction: f64,
    pub low_deduction: f64,
    /// Cap on the issue-derived deduction subtotal per category.
    pub issue_cap: f64,
    /// Cap on the security-header deduction bucket within Technical.
    pub security_header_cap: f64,
    /// Severity ceiling: with n High issues in a category, the score is
    /// clamped to max(ceiling_floor, ceiling_base - n * ceiling_step).
    pub ceiling_base: f64,
    pub ceiling_step: f64,
    pub ceiling_floor: f64,
    /// Accessibility breadth rule: fewer than this many check families with
    /// at least one issue caps the category at `breadth_cap`.
    pub breadth_threshold: usize,
    pub breadth_cap: f64,
    /// Compress category scores into [10, 90] before weighting the overall
    /// score. Disabled means identity.
    pub compress_categories: bool,
    pub technical_weight: f64,
    pub on_page_weight: f64,
    pub content_weight: f64,
    pub accessibility_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_deduction: 12.0,
            medium_deduction: 6.0,
            low_deduction: 3.0,
            issue_cap: 60.0,
            security_header_cap: 20.0,
            ceiling_base: 75.0,
            ceiling_step: 5.0,
            ceiling_floor: 30.0,
            breadth_threshold: 3,
            breadth_cap: 65.0,
            compress_categories: true,
            technical_weight: 0.35,
            on_page_weight: 0.25,
            content_weight: 0.25,
            accessibility_weight: 0.15,
        }
    }
}

pub struct ScoreEngine {
    config: ScoringConfig,
}

impl ScoreEngine {
    pub fn new() -> Self {
        Self::with_config(ScoringConfig::default())
    }

    pub fn with_config(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Scores the five categories plus the overall weighted score.
    ///
    /// Pure: identical input produces identical output. Empty collections
    /// yield neutral defaults rather than errors.
    pub fn score(&self, issues: &[Issue], pages: &[CrawledPage], site: &SiteFlags) -> CategoryScores {
        let technical = self.category_score(IssueCategory::Technical, issues, pages, site);
        let on_page = self.category_score(IssueCategory::OnPage, issues, pages, site);
        let content = self.category_score(IssueCategory::Content, issues, pages, site);
        let accessibility =
            self.category_score(IssueCategory::Accessibility, issues, pages, site);
        let performance =
            self.category_score(IssueCategory::Performance, issues, pages, site);

        let overall_score = (self.compress(technical) * self.config.technical_weight
            + self.compress(on_page) * self.config.on_page_weight
            + self.compress(content) * self.config.content_weight
            + self.compress(accessibility) * self.config.accessibility_weight)
            .clamp(5.0, 95.0);

        debug!(
            "scores: technical {:.1}, on-page {:.1}, content {:.1}, accessibility {:.1}, performance {:.1}, overall {:.1}",
            technical, on_page, content, accessibility, performance, overall_score
        );

        CategoryScores {
            technical,
            on_page,
            content,
            accessibility,
            performance,
            overall_score,
        }
    }

    fn category_score(
        &self,
        category: IssueCategory,
        issues: &[Issue],
        pages: &[CrawledPage],
        site: &SiteFlags,
    ) -> f64 {
        let category_issues: Vec<&Issue> =
            issues.iter().filter(|i| i.category == category).collect();

        let mut deduction = self.issue_deductions(category, &category_issues);
        deduction += self.attribute_deductions(category, pages, site);

        let mut score = (100.0 - deduction).max(0.0);

        let high_count = category_issues
            .iter()
            .filter(|i| i.severity == Severity::High)
            .count();
        if high_count > 0 {
            let ceiling = (self.config.ceiling_base
                - high_count as f64 * self.config.ceiling_step)
                .max(self.config.ceiling_floor);
            score = score.min(ceiling);
        }

        if category == IssueCategory::Accessibility {
            let breadth = ACCESSIBILITY_CHECK_KEYWORDS
                .iter()
                .filter(|keyword| {
                    category_issues
                        .iter()
                        .any(|i| i.message.to_lowercase().contains(*keyword))
                })
                .count();
            if breadth < self.config.breadth_threshold {
                score = score.min(self.config.breadth_cap);
            }
        }

        score.clamp(0.0, 100.0)
    }

    fn issue_deductions(&self, category: IssueCategory, issues: &[&Issue]) -> f64 {
        let mut header_bucket = 0.0;
        let mut general_bucket = 0.0;

        for issue in issues {
            let deduction = match issue.severity {
                Severity::High => self.config.high_deduction,
                Severity::Medium => self.config.medium_deduction,
                Severity::Low => self.config.low_deduction,
            };
            if category == IssueCategory::Technical
                && issue.message.to_lowercase().contains("header")
            {
                header_bucket += deduction;
            } else {
                general_bucket += deduction;
            }
        }

        header_bucket.min(self.config.security_header_cap)
            + general_bucket.min(self.config.issue_cap)
    }

    /// Deductions re-derived from page attributes, computed over fetchable
    /// pages (content attributes are meaningless on error pages). Absent
    /// optional data degrades to a zero contribution.
    fn attribute_deductions(
        &self,
        category: IssueCategory,
        pages: &[CrawledPage],
        site: &SiteFlags,
    ) -> f64 {
        let fetched: Vec<&CrawledPage> = pages
            .iter()
            .filter(|p| (200..400).contains(&p.status_code))
            .collect();

        match category {
            IssueCategory::Technical => {
                let mut deduction = error_fraction(pages) * ERROR_PAGE_WEIGHT;
                if !site.robots_txt_exists {
                    deduction += MISSING_ROBOTS_DEDUCTION;
                }
                if !site.sitemap_exists {
                    deduction += MISSING_SITEMAP_DEDUCTION;
                }
                deduction
            }
            IssueCategory::OnPage => {
                fraction(&fetched, |p| p.title.as_deref().unwrap_or("").is_empty())
                    * MISSING_TITLE_WEIGHT
                    + fraction(&fetched, |p| {
                        p.meta_description.as_deref().unwrap_or("").is_empty()
                    }) * MISSING_META_WEIGHT
                    + fraction(&fetched, |p| p.h1_count == 0) * MISSING_H1_WEIGHT
            }
            IssueCategory::Content => {
                fraction(&fetched, |p| p.word_count < THIN_CONTENT_WORDS) * THIN_CONTENT_WEIGHT
            }
            IssueCategory::Accessibility => {
                let images: usize = fetched.iter().map(|p| p.image_count).sum();
                let missing_alt: usize = fetched.iter().map(|p| p.missing_alt_count).sum();
                let alt_fraction = if images == 0 {
                    0.0
                } else {
                    missing_alt as f64 / images as f64
                };
                alt_fraction * MISSING_ALT_WEIGHT
                    + fraction(&fetched, |p| !p.has_viewport) * MISSING_VIEWPORT_WEIGHT
            }
            // Performance data comes from an external collector; without it
            // the category relies on issues alone.
            IssueCategory::Performance => 0.0,
        }
    }

    fn compress(&self, score: f64) -> f64 {
        if !self.config.compress_categories {
            return score;
        }
        (10.0 + score * 0.8).clamp(10.0, 90.0)
    }
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn fraction(pages: &[&CrawledPage], predicate: impl Fn(&CrawledPage) -> bool) -> f64 {
    if pages.is_empty() {
        return 0.0;
    }
    pages.iter().filter(|p| predicate(p)).count() as f64 / pages.len() as f64
}

fn error_fraction(pages: &[CrawledPage]) -> f64 {
    if pages.is_empty() {
        return 0.0;
    }
    let errored = pages
        .iter()
        .filter(|p| p.status_code >= 400 || p.status_code == 0)
        .count();
    errored as f64 / pages.len() as f64
}
