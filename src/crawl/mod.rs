// src/crawl/mod.rs
// =============================================================================
// URL discovery.
//
// Two independent sources of candidate URLs:
// - sitemap: everything the site declares in its sitemap index
// - queue: everything reachable by following internal links from the root
//
// The audit merges both sets before fetching pages.
// =============================================================================

mod queue;
mod sitemap;

pub use queue::{crawl_internal, CrawlOptions};
pub use sitemap::collect_from_sitemaps;
