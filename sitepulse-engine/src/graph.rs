// Internal link graph construction and authority propagation.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use sitepulse_model::CrawledPage;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};
use url::Url;

/// One node per canonical URL surviving deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNode {
    pub canonical_url: String,
    pub title: Option<String>,
    pub incoming_link_count: usize,
    pub outgoing_link_count: usize,
    pub authority_score: f64,
}

/// Directed edge between two known nodes. Contextual edges connect pages in
/// the same site section (shared first path segment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEdge {
    pub from: String,
    pub to: String,
    pub is_contextual: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageGraph {
    pub nodes: Vec<PageNode>,
    pub edges: Vec<PageEdge>,
    pub orphan_pages: Vec<String>,
    pub hub_pages: Vec<String>,
    pub authority_pages: Vec<String>,
    pub isolated_pages: Vec<String>,
    /// URLs excluded because they survived neither parse nor the https retry.
    pub skipped_invalid_urls: usize,
}

#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub hub_min_outgoing: usize,
    pub hub_limit: usize,
    pub authority_min_incoming: usize,
    pub authority_limit: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            hub_min_outgoing: 5,
            hub_limit: 10,
            authority_min_incoming: 3,
            authority_limit: 10,
        }
    }
}

pub struct LinkGraphBuilder {
    config: GraphConfig,
}

impl LinkGraphBuilder {
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Builds the internal link graph over the deduplicated page set.
    ///
    /// The first page in the collection is the crawl root (the crawl context
    /// is established from the first successfully fetched URL) and is exempt
    /// from orphan classification.
    pub fn build(&self, pages: &[CrawledPage]) -> PageGraph {
        let mut result = PageGraph::default();

        let mut graph: DiGraph<(), bool> = DiGraph::new();
        let mut node_of_key: HashMap<String, NodeIndex> = HashMap::new();
        // Parallel to NodeIndex: key, owning page index, section segment.
        let mut keys: Vec<String> = Vec::new();
        let mut owners: Vec<usize> = Vec::new();
        let mut sections: Vec<Option<String>> = Vec::new();

        for (page_index, page) in pages.iter().enumerate() {
            let Some(key) = graph_key(&page.url) else {
                debug!("excluding unparseable URL from link graph: {}", page.url);
                result.skipped_invalid_urls += 1;
                continue;
            };
            if node_of_key.contains_key(&key) {
                // Two deduplicated pages can still collapse under the
                // graph-specific key (www vs bare host); the first owner wins.
                debug!("graph key collision, skipping {}", page.url);
                continue;
            }
            let node = graph.add_node(());
            node_of_key.insert(key.clone(), node);
            sections.push(first_path_segment(&key));
            keys.push(key);
            owners.push(page_index);
        }

        let root_node: Option<NodeIndex> = owners.first().map(|_| NodeIndex::new(0));

        for (node_index, &owner) in owners.iter().enumerate() {
            let source = NodeIndex::new(node_index);
            let Some(links) = pages[owner].outbound_internal_links.as_ref() else {
                continue;
            };
            for link in links {
                let Some(target_key) = graph_key(link) else {
                    continue;
                };
                let Some(&target) = node_of_key.get(&target_key) else {
                    continue;
                };
                if target == source {
                    // Self-links carry no authority signal.
                    continue;
                }
                let contextual = match (&sections[source.index()], &sections[target.index()]) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                };
                graph.add_edge(source, target, contextual);
            }
        }

        // Outgoing counts are exact edge counts, except for pages that only
        // reported a link total: those contribute the count with zero edges.
        let outgoing_counts: Vec<usize> = owners
            .iter()
            .enumerate()
            .map(|(node_index, &owner)| {
                let page = &pages[owner];
                if page.outbound_internal_links.is_some() {
                    graph
                        .edges_directed(NodeIndex::new(node_index), Direction::Outgoing)
                        .count()
                } else {
                    page.outbound_link_count.unwrap_or(0)
                }
            })
            .collect();

        for node_index in 0..keys.len() {
            let node = NodeIndex::new(node_index);
            let incoming = graph.edges_directed(node, Direction::Incoming).count();
            let mut path = HashSet::new();
            let authority = authority_of(&graph, &outgoing_counts, node, &mut path);
            result.nodes.push(PageNode {
                canonical_url: keys[node_index].clone(),
                title: pages[owners[node_index]].title.clone(),
                incoming_link_count: incoming,
                outgoing_link_count: outgoing_counts[node_index],
                authority_score: authority,
            });
        }

        for edge in graph.edge_references() {
            result.edges.push(PageEdge {
                from: keys[edge.source().index()].clone(),
                to: keys[edge.target().index()].clone(),
                is_contextual: *edge.weight(),
            });
        }

        self.classify(&mut result, root_node);

        info!(
            "link graph built: {} nodes, {} edges, {} orphans",
            result.nodes.len(),
            result.edges.len(),
            result.orphan_pages.len()
        );

        result
    }

    fn classify(&self, result: &mut PageGraph, root_node: Option<NodeIndex>) {
        let root_index = root_node.map(|n| n.index());

        let mut orphans: Vec<&PageNode> = result
            .nodes
            .iter()
            .enumerate()
            .filter(|(index, node)| node.incoming_link_count == 0 && Some(*index) != root_index)
            .map(|(_, node)| node)
            .collect();
        orphans.sort_by(|a, b| a.canonical_url.cmp(&b.canonical_url));
        result.orphan_pages = orphans.iter().map(|n| n.canonical_url.clone()).collect();

        let mut isolated: Vec<&PageNode> = result
            .nodes
            .iter()
            .filter(|node| node.incoming_link_count == 0 && node.outgoing_link_count == 0)
            .collect();
        isolated.sort_by(|a, b| a.canonical_url.cmp(&b.canonical_url));
        result.isolated_pages = isolated.iter().map(|n| n.canonical_url.clone()).collect();

        let mut hubs: Vec<&PageNode> = result
            .nodes
            .iter()
            .filter(|node| node.outgoing_link_count >= self.config.hub_min_outgoing)
            .collect();
        hubs.sort_by(|a, b| {
            b.outgoing_link_count
                .cmp(&a.outgoing_link_count)
                .then_with(|| a.canonical_url.cmp(&b.canonical_url))
        });
        result.hub_pages = hubs
            .iter()
            .take(self.config.hub_limit)
            .map(|n| n.canonical_url.clone())
            .collect();

        let mut authorities: Vec<&PageNode> = result
            .nodes
            .iter()
            .filter(|node| node.incoming_link_count >= self.config.authority_min_incoming)
            .collect();
        authorities.sort_by(|a, b| {
            b.incoming_link_count
                .cmp(&a.incoming_link_count)
                .then_with(|| a.canonical_url.cmp(&b.canonical_url))
        });
        result.authority_pages = authorities
            .iter()
            .take(self.config.authority_limit)
            .map(|n| n.canonical_url.clone())
            .collect();
    }
}

impl Default for LinkGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Authority of `node`: its in-degree plus each inbound neighbour's authority
/// split across that neighbour's outgoing links. Nodes already on the current
/// recursion path contribute zero, which bounds the walk on any finite graph,
/// cycles included. Evaluated once per node; a bounded approximation, not
/// fixed-point PageRank.
fn authority_of(
    graph: &DiGraph<(), bool>,
    outgoing_counts: &[usize],
    node: NodeIndex,
    path: &mut HashSet<NodeIndex>,
) -> f64 {
    path.insert(node);
    let mut score = graph.edges_directed(node, Direction::Incoming).count() as f64;
    let sources: Vec<NodeIndex> = graph
        .edges_directed(node, Direction::Incoming)
        .map(|edge| edge.source())
        .collect();
    for source in sources {
        if path.contains(&source) {
            continue;
        }
        let out = outgoing_counts[source.index()].max(1) as f64;
        score += authority_of(graph, outgoing_counts, source, path) / out;
    }
    path.remove(&node);
    score
}

/// Graph-specific canonical key: fragment dropped, `www.` stripped, trailing
/// slash trimmed except at the root. Intentionally independent of the general
/// canonicalizer so link matching stays stable under crawl-context rules.
fn graph_key(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim())
        .or_else(|_| Url::parse(&format!("https://{}", raw.trim())))
        .ok()?;

    url.set_fragment(None);

    if let Some(host) = url.host_str() {
        let host = host.to_ascii_lowercase();
        if let Some(bare) = host.strip_prefix("www.") {
            let bare = bare.to_string();
            let _ = url.set_host(Some(&bare));
        }
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        url.set_path(if trimmed.is_empty() { "/" } else { trimmed });
    }

    Some(url.to_string())
}

fn first_path_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .find(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
}
