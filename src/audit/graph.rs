// src/audit/graph.rs
// =============================================================================
// Internal link graph of the crawled pages.
//
// Nodes are page URLs; an edge A -> B exists when page A links to B. Only
// successfully fetched pages contribute outgoing edges, and self-links are
// ignored: a page linking to itself does not make it discoverable. A URL that
// redirects to another audited page contributes nothing; its body is the
// target's, so its links would repeat the target's edges.
// =============================================================================

use std::collections::{BTreeMap, BTreeSet};

use super::page::{redirect_aliases, Page};

#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
    in_degree: BTreeMap<String, usize>,
}

impl LinkGraph {
    pub fn from_pages(pages: &[Page]) -> Self {
        let mut graph = LinkGraph::default();
        let aliases = redirect_aliases(pages);
        for page in pages.iter().filter(|p| p.is_ok() && !aliases.contains(p.url.as_str())) {
            for target in &page.internal_links {
                graph.add_edge(page.url.as_str(), target.as_str());
            }
        }
        graph
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        let targets = self.edges.entry(from.to_string()).or_default();
        if targets.insert(to.to_string()) {
            *self.in_degree.entry(to.to_string()).or_default() += 1;
        }
    }

    /// Number of distinct pages linking to `url`.
    pub fn in_degree(&self, url: &str) -> usize {
        self.in_degree.get(url).copied().unwrap_or(0)
    }

    pub fn outgoing(&self, url: &str) -> impl Iterator<Item = &str> {
        self.edges.get(url).into_iter().flat_map(|targets| targets.iter().map(String::as_str))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }
}
