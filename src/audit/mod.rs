// src/audit/mod.rs
// =============================================================================
// The audit pipeline, end to end.
//
// 1. Walk the sitemap index            -> declared page URLs
// 2. Crawl internal links from the root -> discovered page URLs
// 3. Merge and dedupe both sets, fetch + extract every URL -> Pages
// 4. Fingerprint and cluster near-duplicate pages
// 5. Run the issue rules, sort them, cut remediation batches
//
// Only steps 1-3 touch the network. Steps 4-5 run after every fetch has
// finished and only read the immutable Page list.
//
// Submodules:
// - page: the Page record and the bounded-concurrency fetch pipeline
// - graph: internal link graph (in-degree for orphan detection)
// - issues: issue taxonomy, rules and ordering
// - batches: grouping issues into fix-it batches
// =============================================================================

mod batches;
#[cfg(test)]
pub(crate) mod fixtures;
mod graph;
mod issues;
mod page;

pub use batches::{build_batches, Batch};
pub use graph::LinkGraph;
pub use issues::{count_by_type, detect_issues, find_duplicates, DuplicateGroups, Issue, IssueInput, IssueType};
pub use page::{fetch_pages, redirect_aliases, Page};

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::info;

use crate::config::AuditConfig;
use crate::crawl::{collect_from_sitemaps, crawl_internal, CrawlOptions};
use crate::dedupe::detect_near_duplicates;
use crate::error::AuditError;
use crate::fetch::{build_client, FetchOptions, NormalizedUrl};
use crate::report::{AuditReport, Summary};

/// Runs the full audit for `config.base_url`.
///
/// Crawl-time failures never abort the run; they show up as issues. The only
/// error is failing to construct the HTTP client.
pub async fn run_audit(config: &AuditConfig) -> Result<AuditReport, AuditError> {
    let client = build_client(&config.user_agent, config.timeout)?;
    let fetch = FetchOptions {
        max_redirects: config.max_redirects,
        timeout: config.timeout,
    };

    if config.is_local_host() {
        info!("local host, canonical_mismatch checks disabled");
    }

    info!(sitemap = %config.sitemap_url, "walking sitemaps");
    let sitemap = collect_from_sitemaps(&client, &config.sitemap_url, &fetch).await;
    info!(
        sitemaps = sitemap.sitemap_urls.len(),
        pages = sitemap.page_urls.len(),
        "sitemap walk finished"
    );

    let crawl_options = CrawlOptions {
        max_pages: config.max_pages,
        concurrency: config.concurrency,
        fetch: fetch.clone(),
    };
    info!(base = %config.base_url, max_pages = config.max_pages, "crawling internal links");
    let discovered = crawl_internal(&client, &config.base_url, &[config.base_url.to_string()], &crawl_options).await;

    let mut all_urls: BTreeSet<NormalizedUrl> = sitemap.page_urls.clone();
    all_urls.extend(discovered.iter().cloned());
    let urls_total = all_urls.len();

    let pages = fetch_pages(
        &client,
        all_urls.into_iter().collect(),
        &config.base_url,
        &fetch,
        config.concurrency,
    )
    .await;

    let aliases = redirect_aliases(&pages);
    let fingerprints: Vec<(String, u64)> = pages
        .iter()
        .filter(|page| page.is_ok() && !aliases.contains(page.url.as_str()))
        .filter_map(|page| page.main_simhash64.map(|fp| (page.url.to_string(), fp)))
        .collect();
    let clusters = detect_near_duplicates(&fingerprints);

    let graph = LinkGraph::from_pages(&pages);
    info!(edges = graph.edge_count(), clusters = clusters.len(), "analysing pages");

    let sitemap_urls: BTreeSet<String> = sitemap.page_urls.iter().map(ToString::to_string).collect();
    let duplicates = find_duplicates(&pages);
    let issues = detect_issues(
        &IssueInput {
            site: &config.base_url,
            pages: &pages,
            graph: &graph,
            sitemap_urls: &sitemap_urls,
            clusters: &clusters,
        },
        &duplicates,
    );
    let batches = build_batches(&issues);

    let summary = Summary {
        urls_total,
        urls_from_sitemap: sitemap.page_urls.len(),
        urls_discovered: discovered.len(),
        pages_fetched: pages.iter().filter(|page| page.is_ok()).count(),
        issues: issues.len(),
    };
    info!(issues = summary.issues, pages = summary.pages_fetched, "audit finished");

    Ok(AuditReport {
        base_url: config.base_url.to_string(),
        generated_at: Utc::now(),
        sitemap_urls: sitemap.sitemap_urls.iter().map(ToString::to_string).collect(),
        summary,
        issue_counts: count_by_type(&issues),
        batches,
        duplicates,
        clusters,
        pages,
        issues,
    })
}
