// src/fetch/mod.rs
// =============================================================================
// Fetching and URL canonicalization.
//
// Submodules:
// - normalize: turns any href into a canonical absolute URL (or None)
// - redirect: issues one logical fetch per URL, recording every redirect hop
// =============================================================================

mod normalize;
mod redirect;

pub use normalize::{is_same_site, normalize, normalize_str, NormalizedUrl};
pub use redirect::{build_client, fetch_chain, FetchOptions, FetchResult, RedirectHop};
