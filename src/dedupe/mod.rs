// src/dedupe/mod.rs
// =============================================================================
// Near-duplicate detection.
//
// Submodules:
// - simhash: 64-bit locality-sensitive fingerprints of page text
// - cluster: union-find grouping of fingerprints within a Hamming threshold
// =============================================================================

mod cluster;
mod simhash;

pub use cluster::{detect_near_duplicates, DuplicateCluster, NEAR_DUPLICATE_DISTANCE};
pub use simhash::{fingerprint, to_hex};
