// src/dedupe/cluster.rs
// =============================================================================
// Near-duplicate clustering with union-find.
//
// Every pair of fingerprinted pages within NEAR_DUPLICATE_DISTANCE bits is
// unioned. Clusters are the resulting connected components, so membership
// is transitive: A~B and B~C puts A and C together even when A and C are
// far apart.
//
// Known scaling limit: the pairwise pass is O(n^2). That is fine for a few
// thousand pages. Bucketing (banded LSH) would scale further but changes
// which pages end up clustered together.
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::simhash::hamming;

/// Maximum Hamming distance for two pages to count as near-duplicates.
pub const NEAR_DUPLICATE_DISTANCE: u32 = 6;

/// Smaller groups are incidental similarity, not a templating problem.
pub const MIN_CLUSTER_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCluster {
    /// Member URLs, sorted
    pub urls: Vec<String>,
}

/// Disjoint-set forest with path halving and union by size.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }
}

/// Clusters `(url, fingerprint)` entries; only clusters of MIN_CLUSTER_SIZE or more are returned.
///
/// Output is deterministic: URLs sorted within a cluster, clusters sorted by first URL.
pub fn detect_near_duplicates(entries: &[(String, u64)]) -> Vec<DuplicateCluster> {
    let mut sets = UnionFind::new(entries.len());

    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            if hamming(entries[i].1, entries[j].1) <= NEAR_DUPLICATE_DISTANCE {
                sets.union(i, j);
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for (i, (url, _)) in entries.iter().enumerate() {
        groups.entry(sets.find(i)).or_default().push(url.clone());
    }

    let mut clusters: Vec<DuplicateCluster> = groups
        .into_values()
        .filter(|urls| urls.len() >= MIN_CLUSTER_SIZE)
        .map(|mut urls| {
            urls.sort();
            urls.dedup();
            DuplicateCluster { urls }
        })
        .filter(|cluster| cluster.urls.len() >= MIN_CLUSTER_SIZE)
        .collect();
    clusters.sort_by(|a, b| a.urls.cmp(&b.urls));
    clusters
}
