// End-to-end audit pipeline tests

use sitepulse_engine::AuditEngine;
use sitepulse_model::{CrawlContext, CrawledPage, Issue, IssueCategory, Severity, SiteFlags};

fn ctx() -> CrawlContext {
    CrawlContext::new("example.com", "https", "example.com")
}

fn site() -> SiteFlags {
    SiteFlags {
        robots_txt_exists: true,
        sitemap_exists: true,
    }
}

fn crawl_fixture() -> Vec<CrawledPage> {
    vec![
        CrawledPage::new("https://example.com/")
            .with_status(200)
            .with_word_count(500)
            .with_title("Home")
            .with_links(["https://example.com/about", "https://example.com/products"]),
        CrawledPage::new("https://example.com/about")
            .with_status(200)
            .with_word_count(400)
            .with_title("About")
            .with_links(["https://example.com/"]),
        // www variant of /about; the crawl context folds it away.
        CrawledPage::new("https://www.example.com/about")
            .with_status(200)
            .with_word_count(100),
        CrawledPage::new("https://example.com/products")
            .with_status(200)
            .with_word_count(350)
            .with_title("Products")
            .with_links(["https://example.com/"]),
        // Query variant of /products; survives deduplication but is flagged
        // by the duplicate auditor.
        CrawledPage::new("https://example.com/products?ref=nav")
            .with_status(200)
            .with_word_count(350)
            .with_title("Products"),
    ]
}

fn issue_fixture() -> Vec<Issue> {
    vec![
        Issue::new(IssueCategory::OnPage, Severity::Medium, "Missing meta description")
            .with_affected_pages(["https://example.com/about"]),
        Issue::new(IssueCategory::OnPage, Severity::High, "No meta description")
            .with_affected_pages(["https://example.com/products"]),
        Issue::new(IssueCategory::Technical, Severity::Low, "Missing X-Frame-Options header"),
    ]
}

#[test]
fn test_full_audit_pipeline() {
    let engine = AuditEngine::default();
    let outcome = engine.run(&crawl_fixture(), &issue_fixture(), Some(&ctx()), &site());

    // The www variant merged into /about.
    assert_eq!(outcome.valid_page_count, 4);
    assert_eq!(outcome.error_page_count, 0);

    // Root, /about, /products, and the query variant.
    assert_eq!(outcome.graph.nodes.len(), 4);
    assert_eq!(outcome.graph.edges.len(), 4);
    // The query variant has no inbound links and is not the crawl root.
    assert_eq!(
        outcome.graph.orphan_pages,
        vec!["https://example.com/products?ref=nav".to_string()]
    );

    // One duplicate group: /products vs /products?ref=nav.
    assert_eq!(outcome.duplicates.groups.len(), 1);
    assert_eq!(
        outcome.duplicates.groups[0].preferred_url,
        "https://example.com/products"
    );
    assert_eq!(outcome.duplicates.total_duplicate_count, 1);

    // The two meta-description issues collapsed to one High survivor.
    assert_eq!(outcome.issues.len(), 2);
    let meta = outcome
        .issues
        .iter()
        .find(|i| i.category == IssueCategory::OnPage)
        .unwrap();
    assert_eq!(meta.severity, Severity::High);

    // A High on-page issue caps the category below 100.
    assert!(outcome.scores.on_page < 100.0);
    assert!(outcome.scores.overall_score >= 5.0);
    assert!(outcome.scores.overall_score <= 95.0);
}

#[test]
fn test_repeated_runs_are_identical() {
    let engine = AuditEngine::default();
    let pages = crawl_fixture();
    let issues = issue_fixture();
    let context = ctx();
    let flags = site();

    let first = engine.run(&pages, &issues, Some(&context), &flags);
    let second = engine.run(&pages, &issues, Some(&context), &flags);

    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[test]
fn test_outcome_serializes_for_report_assembly() {
    let engine = AuditEngine::default();
    let outcome = engine.run(&crawl_fixture(), &issue_fixture(), Some(&ctx()), &site());
    let json = serde_json::to_value(&outcome).unwrap();

    for key in [
        "scores",
        "graph",
        "duplicates",
        "issues",
        "valid_page_count",
        "error_page_count",
    ] {
        assert!(json.get(key).is_some(), "missing outcome field {}", key);
    }
    assert!(json["scores"]["overall_score"].is_number());
    assert!(json["graph"]["nodes"].is_array());
}

#[test]
fn test_empty_audit_is_well_defined() {
    let engine = AuditEngine::default();
    let outcome = engine.run(&[], &[], None, &SiteFlags::default());
    assert_eq!(outcome.valid_page_count, 0);
    assert_eq!(outcome.error_page_count, 0);
    assert!(outcome.graph.nodes.is_empty());
    assert!(outcome.duplicates.groups.is_empty());
    assert!(outcome.issues.is_empty());
    assert!(outcome.scores.overall_score >= 5.0);
}
