// src/crawl/sitemap.rs
// =============================================================================
// Walks a sitemap index and collects every page URL it declares.
//
// How it works:
// 1. Start with the sitemap index URL in a work queue
// 2. Fetch the document and pull out every <loc> entry
// 3. Entries ending in ".xml" are nested sitemaps -> enqueue them
// 4. Everything else is a page URL -> collect it
//
// The seen-set is keyed by normalized URL, so sitemaps that reference each
// other (or themselves) cannot make the walk loop forever. A sitemap that
// fails to load is treated as empty; the walk carries on with the rest.
// =============================================================================

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::extract::decode_entities;
use crate::fetch::{fetch_chain, normalize, FetchOptions, NormalizedUrl};

static LOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<loc\b[^>]*>(.*?)</loc>").expect("valid regex"));

#[derive(Debug, Clone, Default)]
pub struct SitemapCollection {
    /// Every sitemap document visited, in walk order (index first)
    pub sitemap_urls: Vec<NormalizedUrl>,
    /// Leaf page URLs, deduplicated
    pub page_urls: BTreeSet<NormalizedUrl>,
}

/// Extracts the raw text of every <loc> entry, trimmed and entity-decoded.
pub fn parse_locs(xml: &str) -> Vec<String> {
    LOC_RE
        .captures_iter(xml)
        .map(|cap| decode_entities(cap[1].trim()))
        .filter(|loc| !loc.is_empty())
        .collect()
}

fn is_sitemap(url: &NormalizedUrl) -> bool {
    let path = url.path();
    path.to_ascii_lowercase().ends_with(".xml")
}

/// Breadth-first walk starting from `index_url`.
pub async fn collect_from_sitemaps(
    client: &Client,
    index_url: &Url,
    options: &FetchOptions,
) -> SitemapCollection {
    let mut collection = SitemapCollection::default();

    let Some(start) = normalize(index_url.as_str(), None) else {
        return collection;
    };

    let mut queue = VecDeque::new();
    let mut seen = HashSet::new();
    seen.insert(start.clone());
    queue.push_back(start);

    while let Some(sitemap) = queue.pop_front() {
        let result = fetch_chain(client, sitemap.as_str(), options).await;
        let body = if result.is_ok() {
            result.body
        } else {
            warn!(sitemap = %sitemap, status = result.status, "sitemap unavailable, treating as empty");
            String::new()
        };

        let base = Url::parse(sitemap.as_str()).ok();
        let mut pages = 0usize;
        for loc in parse_locs(&body) {
            let Some(url) = normalize(&loc, base.as_ref()) else {
                continue;
            };
            if is_sitemap(&url) {
                if seen.insert(url.clone()) {
                    queue.push_back(url);
                }
            } else {
                collection.page_urls.insert(url);
                pages += 1;
            }
        }

        debug!(sitemap = %sitemap, pages, "sitemap parsed");
        collection.sitemap_urls.push(sitemap);
    }

    collection
}
