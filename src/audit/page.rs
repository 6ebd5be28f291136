// src/audit/page.rs
// =============================================================================
// The Page record and the fetch -> extract pipeline that fills it in.
//
// A Page is built exactly once per URL, from one FetchResult, and is never
// modified afterwards. Everything later in the audit (clustering, issue
// rules, reports) reads Pages and nothing else.
//
// Fetching runs with bounded concurrency (buffer_unordered). Results arrive
// in completion order but each carries its input index, so the returned
// Vec is in input order no matter how the fetches interleave.
// =============================================================================

use std::collections::BTreeSet;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Serialize, Serializer};
use tracing::{debug, info};
use url::Url;

use crate::dedupe::{fingerprint, to_hex};
use crate::extract::{categorize, extract, Category, ContentSignals, Hreflang};
use crate::fetch::{fetch_chain, normalize, FetchOptions, FetchResult, NormalizedUrl, RedirectHop};

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub url: NormalizedUrl,
    pub final_url: NormalizedUrl,
    pub status: u16,
    pub redirect_chain: Vec<RedirectHop>,
    pub category: Category,
    pub title: Option<String>,
    pub description: Option<String>,
    pub robots: Option<String>,
    pub canonical_raw: Option<String>,
    pub canonical: Option<NormalizedUrl>,
    pub hreflang: Vec<Hreflang>,
    pub internal_links: Vec<NormalizedUrl>,
    pub schema_blocks: usize,
    pub schema_errors: Vec<String>,
    pub main_content_words: usize,
    pub main_unique_words: usize,
    #[serde(serialize_with = "serialize_fingerprint")]
    pub main_simhash64: Option<u64>,
}

fn serialize_fingerprint<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(fp) => serializer.serialize_str(&to_hex(*fp)),
        None => serializer.serialize_none(),
    }
}

impl Page {
    /// Builds the page for `url` from its fetch result. Pure: no I/O.
    pub fn from_fetch(url: NormalizedUrl, fetch: FetchResult, site: &Url) -> Self {
        let final_url = normalize(&fetch.final_url, None).unwrap_or_else(|| url.clone());
        let category = categorize(&final_url.path());

        let signals = if fetch.is_ok() && fetch.is_html() {
            extract(&fetch.body, final_url.as_str(), site, category)
        } else {
            ContentSignals::default()
        };

        let header_robots = fetch
            .headers
            .get("x-robots-tag")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let main_simhash64 = if fetch.is_ok() {
            fingerprint(&signals.content.unique_text)
        } else {
            None
        };

        Self {
            url,
            final_url,
            status: fetch.status,
            redirect_chain: fetch.chain,
            category,
            title: signals.title,
            description: signals.description,
            robots: signals.robots.or(header_robots),
            canonical_raw: signals.canonical_raw,
            canonical: signals.canonical,
            hreflang: signals.hreflang,
            internal_links: signals.internal_links,
            schema_blocks: signals.json_ld.blocks,
            schema_errors: signals.json_ld.errors,
            main_content_words: signals.content.main_words,
            main_unique_words: signals.content.unique_words,
            main_simhash64,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_noindex(&self) -> bool {
        self.robots
            .as_deref()
            .is_some_and(|robots| robots.to_ascii_lowercase().contains("noindex"))
    }
}

/// URLs of pages that redirect to another page of the same audit.
///
/// Such a page carries its target's signals under its own URL. Content rules,
/// the link graph and fingerprinting skip it; `redirect_chain` reports it.
pub fn redirect_aliases(pages: &[Page]) -> BTreeSet<&str> {
    let requested: BTreeSet<&str> = pages.iter().map(|page| page.url.as_str()).collect();
    pages
        .iter()
        .filter(|page| page.final_url != page.url && requested.contains(page.final_url.as_str()))
        .map(|page| page.url.as_str())
        .collect()
}

/// Fetches and extracts every URL with at most `concurrency` requests in flight.
pub async fn fetch_pages(
    client: &Client,
    urls: Vec<NormalizedUrl>,
    site: &Url,
    options: &FetchOptions,
    concurrency: usize,
) -> Vec<Page> {
    let total = urls.len();
    info!(total, concurrency, "fetching pages");

    let mut slots: Vec<(usize, Page)> = stream::iter(urls.into_iter().enumerate())
        .map(|(index, url)| async move {
            let fetch = fetch_chain(client, url.as_str(), options).await;
            debug!(url = %url, status = fetch.status, hops = fetch.chain.len(), "fetched");
            (index, Page::from_fetch(url, fetch, site))
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    slots.sort_by_key(|(index, _)| *index);
    slots.into_iter().map(|(_, page)| page).collect()
}
