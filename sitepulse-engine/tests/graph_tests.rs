// Tests for link graph construction, authority propagation, and
// page classification

use sitepulse_engine::graph::{GraphConfig, LinkGraphBuilder};
use sitepulse_model::CrawledPage;

fn page(url: &str, links: &[&str]) -> CrawledPage {
    CrawledPage::new(url).with_status(200).with_links(links.to_vec())
}

// ============================================================================
// Node and Edge Construction Tests
// ============================================================================

#[test]
fn test_nodes_and_edges_from_links() {
    let pages = vec![
        page("https://ex.com/", &["https://ex.com/a", "https://ex.com/b"]),
        page("https://ex.com/a", &["https://ex.com/"]),
        page("https://ex.com/b", &[]),
    ];
    let graph = LinkGraphBuilder::new().build(&pages);
    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.edges.len(), 3);
}

#[test]
fn test_links_to_unknown_targets_create_no_edges() {
    let pages = vec![page("https://ex.com/", &["https://ex.com/missing"])];
    let graph = LinkGraphBuilder::new().build(&pages);
    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.edges.is_empty());
}

#[test]
fn test_self_loops_are_discarded() {
    let pages = vec![page("https://ex.com/a", &["https://ex.com/a"])];
    let graph = LinkGraphBuilder::new().build(&pages);
    assert!(graph.edges.is_empty());
    assert_eq!(graph.nodes[0].outgoing_link_count, 0);
}

#[test]
fn test_link_matching_survives_www_and_slash_variants() {
    let pages = vec![
        page("https://www.ex.com/", &["https://ex.com/about/"]),
        page("https://ex.com/about", &[]),
    ];
    let graph = LinkGraphBuilder::new().build(&pages);
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].to, "https://ex.com/about");
}

#[test]
fn test_declared_count_only_page_has_no_edges() {
    let pages = vec![
        CrawledPage::new("https://ex.com/")
            .with_status(200)
            .with_link_count(7),
        page("https://ex.com/a", &[]),
    ];
    let graph = LinkGraphBuilder::new().build(&pages);
    assert_eq!(graph.nodes[0].outgoing_link_count, 7);
    assert!(graph.edges.is_empty());
}

#[test]
fn test_contextual_edges_share_first_path_segment() {
    let pages = vec![
        page(
            "https://ex.com/products/shoes",
            &["https://ex.com/products/boots", "https://ex.com/about"],
        ),
        page("https://ex.com/products/boots", &[]),
        page("https://ex.com/about", &[]),
    ];
    let graph = LinkGraphBuilder::new().build(&pages);
    let to_boots = graph
        .edges
        .iter()
        .find(|e| e.to.ends_with("/products/boots"))
        .unwrap();
    let to_about = graph.edges.iter().find(|e| e.to.ends_with("/about")).unwrap();
    assert!(to_boots.is_contextual);
    assert!(!to_about.is_contextual);
}

#[test]
fn test_unparseable_page_urls_are_counted() {
    let pages = vec![
        page("https://ex.com/", &[]),
        CrawledPage::new("ht tp://bad host").with_status(200),
    ];
    let graph = LinkGraphBuilder::new().build(&pages);
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.skipped_invalid_urls, 1);
}

// ============================================================================
// Authority Propagation Tests
// ============================================================================

#[test]
fn test_three_page_cycle_terminates_with_equal_authority() {
    let pages = vec![
        page("https://ex.com/a", &["https://ex.com/b"]),
        page("https://ex.com/b", &["https://ex.com/c"]),
        page("https://ex.com/c", &["https://ex.com/a"]),
    ];
    let graph = LinkGraphBuilder::new().build(&pages);
    assert_eq!(graph.nodes.len(), 3);
    let scores: Vec<f64> = graph.nodes.iter().map(|n| n.authority_score).collect();
    assert!((scores[0] - scores[1]).abs() < 1e-9);
    assert!((scores[1] - scores[2]).abs() < 1e-9);
    assert!((scores[0] - 3.0).abs() < 1e-9);
    // Every node has exactly one inbound link, so none is an orphan.
    assert!(graph.orphan_pages.is_empty());
}

#[test]
fn test_mutual_link_pair_terminates() {
    let pages = vec![
        page("https://ex.com/", &["https://ex.com/a", "https://ex.com/b"]),
        page("https://ex.com/a", &["https://ex.com/b"]),
        page("https://ex.com/b", &["https://ex.com/a"]),
    ];
    let graph = LinkGraphBuilder::new().build(&pages);
    for node in &graph.nodes {
        assert!(node.authority_score.is_finite());
        assert!(node.authority_score >= 0.0);
    }
}

#[test]
fn test_authority_counts_inbound_links() {
    let pages = vec![
        page("https://ex.com/", &["https://ex.com/popular"]),
        page("https://ex.com/a", &["https://ex.com/popular"]),
        page("https://ex.com/popular", &[]),
    ];
    let graph = LinkGraphBuilder::new().build(&pages);
    let popular = graph
        .nodes
        .iter()
        .find(|n| n.canonical_url.ends_with("/popular"))
        .unwrap();
    assert_eq!(popular.incoming_link_count, 2);
    // in-degree 2 plus two inbound neighbours, each with authority 0 over
    // one outgoing link.
    assert!((popular.authority_score - 2.0).abs() < 1e-9);
}

// ============================================================================
// Classification Tests
// ============================================================================

#[test]
fn test_crawl_root_is_never_an_orphan() {
    let pages = vec![
        page("https://ex.com/", &["https://ex.com/a"]),
        page("https://ex.com/a", &[]),
        page("https://ex.com/lonely", &[]),
    ];
    let graph = LinkGraphBuilder::new().build(&pages);
    assert_eq!(graph.orphan_pages, vec!["https://ex.com/lonely".to_string()]);
}

#[test]
fn test_isolated_pages_have_no_links_either_way() {
    let pages = vec![
        page("https://ex.com/", &["https://ex.com/a"]),
        page("https://ex.com/a", &["https://ex.com/"]),
        page("https://ex.com/lonely", &[]),
    ];
    let graph = LinkGraphBuilder::new().build(&pages);
    assert_eq!(
        graph.isolated_pages,
        vec!["https://ex.com/lonely".to_string()]
    );
}

#[test]
fn test_hub_and_authority_thresholds() {
    let targets: Vec<String> = (0..6).map(|i| format!("https://ex.com/t{}", i)).collect();
    let target_refs: Vec<&str> = targets.iter().map(String::as_str).collect();
    let mut pages = vec![page("https://ex.com/", &target_refs)];
    for target in &targets {
        pages.push(page(target, &["https://ex.com/"]));
    }
    let graph = LinkGraphBuilder::new().build(&pages);

    // Root links out to six pages and six pages link back.
    assert_eq!(graph.hub_pages, vec!["https://ex.com/".to_string()]);
    assert_eq!(graph.authority_pages, vec!["https://ex.com/".to_string()]);
}

#[test]
fn test_hub_list_is_bounded_and_ordered() {
    let config = GraphConfig {
        hub_min_outgoing: 1,
        hub_limit: 2,
        ..GraphConfig::default()
    };
    let pages = vec![
        page("https://ex.com/", &["https://ex.com/a", "https://ex.com/b"]),
        page("https://ex.com/a", &["https://ex.com/b"]),
        page("https://ex.com/b", &["https://ex.com/a"]),
    ];
    let graph = LinkGraphBuilder::with_config(config).build(&pages);
    assert_eq!(graph.hub_pages.len(), 2);
    // Root has the most outgoing links and sorts first.
    assert_eq!(graph.hub_pages[0], "https://ex.com/");
}

#[test]
fn test_empty_input_produces_empty_graph() {
    let graph = LinkGraphBuilder::new().build(&[]);
    assert!(graph.nodes.is_empty());
    assert!(graph.edges.is_empty());
    assert!(graph.orphan_pages.is_empty());
}
