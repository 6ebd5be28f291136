// src/audit/issues.rs
// =============================================================================
// Issue taxonomy and detection rules.
//
// Every rule is "emit an issue of type X whenever condition C holds", and
// rules are independent: several can fire for the same page. Issues are pure
// derived data; running the rules twice over the same input gives the same
// issues in the same order.
//
// Priorities:
//   1 = crawl / canonical integrity (the page or link does not resolve cleanly)
//   2 = indexability and structure (metadata, robots, structured data)
//   3 = content quality and duplication
//   4 = discoverability
// =============================================================================

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::is_local_host;
use crate::dedupe::{DuplicateCluster, NEAR_DUPLICATE_DISTANCE};
use crate::extract::Category;

use super::graph::LinkGraph;
use super::page::{redirect_aliases, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Non200,
    RedirectChain,
    CanonicalMismatch,
    MissingTitle,
    MissingDescription,
    MissingCanonical,
    NoindexInSitemap,
    VeryShort,
    SchemaError,
    OrphanPage,
    BadLink,
    DuplicateTitle,
    DuplicateDescription,
    NearDuplicateCluster,
}

/// Remediation groups used for batching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueGroup {
    CrawlNormalize,
    Dedupe,
    Content,
    InternalLinks,
    Schema,
    Other,
}

impl IssueGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueGroup::CrawlNormalize => "crawl_normalize",
            IssueGroup::Dedupe => "dedupe",
            IssueGroup::Content => "content",
            IssueGroup::InternalLinks => "internal_links",
            IssueGroup::Schema => "schema",
            IssueGroup::Other => "other",
        }
    }
}

impl IssueType {
    pub const ALL: [IssueType; 14] = [
        IssueType::Non200,
        IssueType::RedirectChain,
        IssueType::CanonicalMismatch,
        IssueType::MissingTitle,
        IssueType::MissingDescription,
        IssueType::MissingCanonical,
        IssueType::NoindexInSitemap,
        IssueType::VeryShort,
        IssueType::SchemaError,
        IssueType::OrphanPage,
        IssueType::BadLink,
        IssueType::DuplicateTitle,
        IssueType::DuplicateDescription,
        IssueType::NearDuplicateCluster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Non200 => "non200",
            IssueType::RedirectChain => "redirect_chain",
            IssueType::CanonicalMismatch => "canonical_mismatch",
            IssueType::MissingTitle => "missing_title",
            IssueType::MissingDescription => "missing_description",
            IssueType::MissingCanonical => "missing_canonical",
            IssueType::NoindexInSitemap => "noindex_in_sitemap",
            IssueType::VeryShort => "very_short",
            IssueType::SchemaError => "schema_error",
            IssueType::OrphanPage => "orphan_page",
            IssueType::BadLink => "bad_link",
            IssueType::DuplicateTitle => "duplicate_title",
            IssueType::DuplicateDescription => "duplicate_description",
            IssueType::NearDuplicateCluster => "near_duplicate_cluster",
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            IssueType::Non200 | IssueType::RedirectChain | IssueType::CanonicalMismatch | IssueType::BadLink => 1,
            IssueType::MissingTitle
            | IssueType::MissingDescription
            | IssueType::MissingCanonical
            | IssueType::NoindexInSitemap
            | IssueType::SchemaError => 2,
            IssueType::VeryShort
            | IssueType::DuplicateTitle
            | IssueType::DuplicateDescription
            | IssueType::NearDuplicateCluster => 3,
            IssueType::OrphanPage => 4,
        }
    }

    pub fn group(&self) -> IssueGroup {
        match self {
            IssueType::Non200 | IssueType::RedirectChain | IssueType::CanonicalMismatch | IssueType::MissingCanonical => {
                IssueGroup::CrawlNormalize
            }
            IssueType::DuplicateTitle | IssueType::DuplicateDescription | IssueType::NearDuplicateCluster => {
                IssueGroup::Dedupe
            }
            IssueType::VeryShort | IssueType::MissingTitle | IssueType::MissingDescription => IssueGroup::Content,
            IssueType::BadLink | IssueType::OrphanPage => IssueGroup::InternalLinks,
            IssueType::SchemaError => IssueGroup::Schema,
            IssueType::NoindexInSitemap => IssueGroup::Other,
        }
    }

    /// Fix advice; `very_short` depends on the page category.
    pub fn fix(&self, category: Option<Category>) -> &'static str {
        match self {
            IssueType::Non200 => "Restore the page or remove it from the sitemap and internal links.",
            IssueType::RedirectChain => "Link and list the final URL directly so no redirect is needed.",
            IssueType::CanonicalMismatch => "Point rel=canonical at the page's own normalized URL.",
            IssueType::MissingTitle => "Add a unique, descriptive <title>.",
            IssueType::MissingDescription => "Add a meta description summarizing the page.",
            IssueType::MissingCanonical => "Add a self-referencing <link rel=\"canonical\">.",
            IssueType::NoindexInSitemap => "Remove noindex pages from the sitemap or drop the noindex directive.",
            IssueType::VeryShort => match category {
                Some(Category::Guide) => "Expand the guide with worked examples and deeper explanation.",
                Some(Category::CategoryHub) => "Add an introduction describing the calculators in this category.",
                _ => "Add an explanation of the formula, inputs and a worked example.",
            },
            IssueType::SchemaError => "Fix the JSON-LD block so it parses as valid JSON.",
            IssueType::OrphanPage => "Link to this page from at least one related page or hub.",
            IssueType::BadLink => "Update or remove the link; the target is neither crawled nor in the sitemap.",
            IssueType::DuplicateTitle => "Rewrite titles so each page has a unique one.",
            IssueType::DuplicateDescription => "Rewrite descriptions so each page has a unique one.",
            IssueType::NearDuplicateCluster => "Differentiate these pages' content or consolidate them.",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueType,
    pub url: String,
    pub evidence: String,
    pub fix: String,
    pub priority: u8,
}

impl Issue {
    fn new(kind: IssueType, url: impl Into<String>, evidence: impl Into<String>, category: Option<Category>) -> Self {
        Self {
            kind,
            url: url.into(),
            evidence: evidence.into(),
            fix: kind.fix(category).to_string(),
            priority: kind.priority(),
        }
    }
}

/// Pages sharing an identical title or description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub value: String,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateGroups {
    pub titles: Vec<DuplicateGroup>,
    pub descriptions: Vec<DuplicateGroup>,
}

/// Everything the rules look at.
pub struct IssueInput<'a> {
    pub site: &'a Url,
    pub pages: &'a [Page],
    pub graph: &'a LinkGraph,
    pub sitemap_urls: &'a BTreeSet<String>,
    pub clusters: &'a [DuplicateCluster],
}

/// Sorts by (priority, type name, url). Stable, so equal keys keep their order.
pub fn sort_issues(issues: &mut [Issue]) {
    issues.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
            .then_with(|| a.url.cmp(&b.url))
    });
}

/// Groups successfully fetched pages by an exact-match field; groups of 2+ only.
/// Redirect aliases are left out so a redirect does not duplicate its target.
pub fn duplicate_groups<F>(pages: &[Page], field: F) -> Vec<DuplicateGroup>
where
    F: Fn(&Page) -> Option<&String>,
{
    let aliases = redirect_aliases(pages);
    let mut by_value: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for page in pages.iter().filter(|p| p.is_ok() && !aliases.contains(p.url.as_str())) {
        if let Some(value) = field(page) {
            by_value.entry(value.as_str()).or_default().push(page.url.to_string());
        }
    }

    by_value
        .into_iter()
        .filter(|(_, urls)| urls.len() >= 2)
        .map(|(value, mut urls)| {
            urls.sort();
            DuplicateGroup {
                value: value.to_string(),
                urls,
            }
        })
        .collect()
}

pub fn find_duplicates(pages: &[Page]) -> DuplicateGroups {
    DuplicateGroups {
        titles: duplicate_groups(pages, |p| p.title.as_ref()),
        descriptions: duplicate_groups(pages, |p| p.description.as_ref()),
    }
}

fn page_rules(
    page: &Page,
    input: &IssueInput<'_>,
    known: &BTreeSet<&str>,
    aliases: &BTreeSet<&str>,
    issues: &mut Vec<Issue>,
) {
    let url = page.url.as_str();
    let category = Some(page.category);

    if page.status != 200 {
        let evidence = match page.redirect_chain.last().and_then(|hop| hop.error.as_deref()) {
            Some(error) => format!("status=0 error={}", error),
            None if page.status == 0 => format!("status=0 redirect limit after {} hops", page.redirect_chain.len()),
            None => format!("status={}", page.status),
        };
        issues.push(Issue::new(IssueType::Non200, url, evidence, category));
    }

    if page.redirect_chain.len() > 1 {
        let hops: Vec<String> = page
            .redirect_chain
            .iter()
            .map(|hop| format!("{} ({})", hop.url, hop.status))
            .collect();
        issues.push(Issue::new(IssueType::RedirectChain, url, hops.join(" -> "), category));
    }

    // The remaining rules read page content, which an alias shares with its target.
    if page.status != 200 || aliases.contains(url) {
        return;
    }

    if let Some(canonical) = &page.canonical {
        if canonical != &page.final_url && !is_local_host(input.site) {
            let evidence = format!("canonical={} final={}", canonical, page.final_url);
            issues.push(Issue::new(IssueType::CanonicalMismatch, url, evidence, category));
        }
    }

    if page.category.is_document() {
        if page.title.is_none() {
            issues.push(Issue::new(IssueType::MissingTitle, url, "no <title>", category));
        }
        if page.description.is_none() {
            issues.push(Issue::new(IssueType::MissingDescription, url, "no meta description", category));
        }
        if page.canonical_raw.is_none() {
            issues.push(Issue::new(IssueType::MissingCanonical, url, "no rel=canonical", category));
        }
    }

    if input.sitemap_urls.contains(url) && page.is_noindex() {
        let evidence = format!("robots={}", page.robots.as_deref().unwrap_or_default());
        issues.push(Issue::new(IssueType::NoindexInSitemap, url, evidence, category));
    }

    let threshold = page.category.thin_content_threshold();
    if page.main_unique_words > 0 && page.main_unique_words < threshold {
        let evidence = format!(
            "unique_words={} threshold={} category={}",
            page.main_unique_words, threshold, page.category
        );
        issues.push(Issue::new(IssueType::VeryShort, url, evidence, category));
    }

    if !page.schema_errors.is_empty() {
        let evidence = format!(
            "{} of {} JSON-LD blocks invalid: {}",
            page.schema_errors.len(),
            page.schema_blocks,
            page.schema_errors.join("; ")
        );
        issues.push(Issue::new(IssueType::SchemaError, url, evidence, category));
    }

    for target in input.graph.outgoing(url) {
        if !known.contains(target) {
            issues.push(Issue::new(IssueType::BadLink, url, format!("links to {}", target), category));
        }
    }
}

fn duplicate_rules(kind: IssueType, groups: &[DuplicateGroup], issues: &mut Vec<Issue>) {
    for group in groups {
        for url in &group.urls {
            let evidence = format!("\"{}\" shared by {} pages", group.value, group.urls.len());
            issues.push(Issue::new(kind, url.clone(), evidence, None));
        }
    }
}

/// Runs every rule and returns the issues in their final order.
pub fn detect_issues(input: &IssueInput<'_>, duplicates: &DuplicateGroups) -> Vec<Issue> {
    let mut issues = Vec::new();

    let crawled: BTreeSet<&str> = input
        .pages
        .iter()
        .flat_map(|p| [p.url.as_str(), p.final_url.as_str()])
        .collect();
    let known: BTreeSet<&str> = crawled
        .iter()
        .copied()
        .chain(input.sitemap_urls.iter().map(String::as_str))
        .collect();

    let aliases = redirect_aliases(input.pages);
    for page in input.pages {
        page_rules(page, input, &known, &aliases, &mut issues);
    }

    let root = crate::fetch::normalize("/", Some(input.site)).map(|u| u.into_string());
    for url in input.sitemap_urls {
        if Some(url) == root.as_ref() || !crawled.contains(url.as_str()) {
            continue;
        }
        if input.graph.in_degree(url) == 0 {
            issues.push(Issue::new(IssueType::OrphanPage, url.clone(), "in sitemap, no internal links point here", None));
        }
    }

    duplicate_rules(IssueType::DuplicateTitle, &duplicates.titles, &mut issues);
    duplicate_rules(IssueType::DuplicateDescription, &duplicates.descriptions, &mut issues);

    for cluster in input.clusters {
        let evidence = format!(
            "{} pages within Hamming distance {}: {}",
            cluster.urls.len(),
            NEAR_DUPLICATE_DISTANCE,
            cluster.urls.join(", ")
        );
        let first = cluster.urls.first().cloned().unwrap_or_default();
        issues.push(Issue::new(IssueType::NearDuplicateCluster, first, evidence, None));
    }

    sort_issues(&mut issues);
    issues
}

/// Count per issue type, with every type present (zero when absent).
pub fn count_by_type(issues: &[Issue]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = IssueType::ALL.iter().map(|t| (t.as_str().to_string(), 0)).collect();
    for issue in issues {
        *counts.entry(issue.kind.as_str().to_string()).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::fixtures::page;

    struct Fixture {
        site: Url,
        pages: Vec<Page>,
        sitemap: BTreeSet<String>,
        clusters: Vec<DuplicateCluster>,
    }

    impl Fixture {
        fn new(site: &str, pages: Vec<Page>, sitemap: &[&str]) -> Self {
            Self {
                site: Url::parse(site).unwrap(),
                pages,
                sitemap: sitemap.iter().map(|s| s.to_string()).collect(),
                clusters: Vec::new(),
            }
        }

        fn run(&self) -> Vec<Issue> {
            let graph = LinkGraph::from_pages(&self.pages);
            let input = IssueInput {
                site: &self.site,
                pages: &self.pages,
                graph: &graph,
                sitemap_urls: &self.sitemap,
                clusters: &self.clusters,
            };
            detect_issues(&input, &find_duplicates(&self.pages))
        }
    }

    fn of_type(issues: &[Issue], kind: IssueType) -> Vec<&Issue> {
        issues.iter().filter(|i| i.kind == kind).collect()
    }

    #[test]
    fn test_small_site_scenario() {
        let a = "https://example.com/";
        let b = "https://example.com/b/";
        let c = "https://example.com/c/";
        let d = "https://example.com/d/";
        let fixture = Fixture::new(
            "https://example.com/",
            vec![
                page(a).links(&[b, c]),
                page(b).title(Some("Home")).unique_words(500),
                page(c).redirected_to(b).title(Some("Home again")),
                page(d),
            ],
            &[a, b, d],
        );
        let issues = fixture.run();

        let redirects = of_type(&issues, IssueType::RedirectChain);
        assert_eq!(redirects.len(), 1);
        assert_eq!(redirects[0].url, c);
        assert!(redirects[0].evidence.contains(" -> "));

        assert!(of_type(&issues, IssueType::VeryShort).is_empty());

        let orphans = of_type(&issues, IssueType::OrphanPage);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].url, d);
        assert_eq!(orphans[0].priority, 4);

        assert!(of_type(&issues, IssueType::BadLink).is_empty());
    }

    #[test]
    fn test_redirect_to_crawled_page_reports_only_the_chain() {
        let b = "https://example.com/b/";
        let c = "https://example.com/c/";
        // c serves b's body, so it carries b's title, description and fingerprint
        let pages = vec![
            page(b).title(Some("Bee")).description(Some("About Bee")).fingerprint(7),
            page(c)
                .redirected_to(b)
                .title(Some("Bee"))
                .description(Some("About Bee"))
                .canonical(None)
                .fingerprint(7),
        ];
        let duplicates = find_duplicates(&pages);
        assert!(duplicates.titles.is_empty());
        assert!(duplicates.descriptions.is_empty());

        let issues = Fixture::new("https://example.com/", pages, &[]).run();
        let for_c: Vec<IssueType> = issues.iter().filter(|i| i.url == c).map(|i| i.kind).collect();
        assert_eq!(for_c, vec![IssueType::RedirectChain]);
        assert!(issues.iter().all(|i| i.url != b));
    }

    #[test]
    fn test_redirect_limit_is_non200_and_redirect_chain() {
        let url = "https://example.com/loop/";
        let issues = Fixture::new("https://example.com/", vec![page(url).redirect_loop(11)], &[]).run();

        let kinds: Vec<IssueType> = issues.iter().filter(|i| i.url == url).map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueType::Non200, IssueType::RedirectChain]);

        let non200 = of_type(&issues, IssueType::Non200);
        assert_eq!(non200[0].evidence, "status=0 redirect limit after 11 hops");
        assert_eq!(non200[0].priority, 1);
        // no content rules on a page that never produced a body
        assert!(of_type(&issues, IssueType::MissingTitle).is_empty());
    }

    #[test]
    fn test_duplicate_titles_grouped_once_with_issue_per_url() {
        let pages = vec![
            page("https://example.com/x/").title(Some("Same")),
            page("https://example.com/y/").title(Some("Same")),
            page("https://example.com/z/").title(Some("Same")).status(404),
        ];
        let duplicates = find_duplicates(&pages);
        assert_eq!(duplicates.titles.len(), 1);
        assert_eq!(duplicates.titles[0].urls, vec!["https://example.com/x/", "https://example.com/y/"]);

        let issues = Fixture::new("https://example.com/", pages, &[]).run();
        let dupes = of_type(&issues, IssueType::DuplicateTitle);
        assert_eq!(dupes.len(), 2);
        assert_eq!(dupes[0].url, "https://example.com/x/");
        assert_eq!(dupes[1].url, "https://example.com/y/");
    }

    #[test]
    fn test_near_duplicate_cluster_issue() {
        let mut fixture = Fixture::new("https://example.com/", vec![page("https://example.com/")], &[]);
        fixture.clusters = vec![DuplicateCluster {
            urls: (1..=4).map(|i| format!("https://example.com/p{}/", i)).collect(),
        }];
        let issues = fixture.run();
        let clusters = of_type(&issues, IssueType::NearDuplicateCluster);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].url, "https://example.com/p1/");
        assert!(clusters[0].evidence.contains("https://example.com/p4/"));
    }

    #[test]
    fn test_canonical_mismatch_skipped_on_localhost() {
        let mismatched = |base: &str| page(&format!("{}a/", base)).canonical(Some(format!("{}other/", base).as_str()));

        let remote = Fixture::new("https://example.com/", vec![mismatched("https://example.com/")], &[]).run();
        assert_eq!(of_type(&remote, IssueType::CanonicalMismatch).len(), 1);

        let local = Fixture::new("http://localhost:4321/", vec![mismatched("http://localhost:4321/")], &[]).run();
        assert!(of_type(&local, IssueType::CanonicalMismatch).is_empty());
    }

    #[test]
    fn test_thin_content_thresholds_by_category() {
        let pages = vec![
            page("https://example.com/guides/a/").unique_words(300),
            page("https://example.com/finance/loan/").unique_words(300),
            page("https://example.com/finance/rate/").unique_words(100),
            page("https://example.com/finance/empty/").unique_words(0),
        ];
        let issues = Fixture::new("https://example.com/", pages, &[]).run();
        let thin: Vec<&str> = of_type(&issues, IssueType::VeryShort).into_iter().map(|i| i.url.as_str()).collect();
        assert_eq!(thin, vec!["https://example.com/finance/rate/", "https://example.com/guides/a/"]);

        let guide = issues.iter().find(|i| i.url == "https://example.com/guides/a/").unwrap();
        assert_eq!(guide.fix, IssueType::VeryShort.fix(Some(Category::Guide)));
    }

    #[test]
    fn test_metadata_and_indexability_rules() {
        let pages = vec![
            page("https://example.com/bare/").title(None).description(None).canonical(None),
            page("https://example.com/hidden/").robots("noindex,follow"),
            page("https://example.com/broken-ld/").schema_error("block 1: EOF"),
            page("https://example.com/app.js").title(None).description(None).canonical(None),
        ];
        let issues = Fixture::new(
            "https://example.com/",
            pages,
            &["https://example.com/hidden/", "https://example.com/bare/"],
        )
        .run();

        for kind in [IssueType::MissingTitle, IssueType::MissingDescription, IssueType::MissingCanonical] {
            let found = of_type(&issues, kind);
            assert_eq!(found.len(), 1, "{}", kind);
            assert_eq!(found[0].url, "https://example.com/bare/");
        }
        assert_eq!(of_type(&issues, IssueType::NoindexInSitemap)[0].url, "https://example.com/hidden/");
        assert_eq!(of_type(&issues, IssueType::SchemaError)[0].priority, 2);
    }

    #[test]
    fn test_non200_and_bad_link() {
        let pages = vec![
            page("https://example.com/").links(&["https://example.com/gone/", "https://example.com/nowhere/"]),
            page("https://example.com/gone/").status(404),
        ];
        let issues = Fixture::new("https://example.com/", pages, &[]).run();

        let non200 = of_type(&issues, IssueType::Non200);
        assert_eq!(non200.len(), 1);
        assert_eq!(non200[0].evidence, "status=404");

        let bad = of_type(&issues, IssueType::BadLink);
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].url, "https://example.com/");
        assert_eq!(bad[0].evidence, "links to https://example.com/nowhere/");
    }

    #[test]
    fn test_issue_order_is_total_and_reproducible() {
        let mk = |kind: IssueType, url: &str| Issue::new(kind, url, "", None);
        let mut issues = vec![
            mk(IssueType::OrphanPage, "https://x.com/a/"),
            mk(IssueType::VeryShort, "https://x.com/b/"),
            mk(IssueType::Non200, "https://x.com/z/"),
            mk(IssueType::BadLink, "https://x.com/y/"),
            mk(IssueType::Non200, "https://x.com/a/"),
            mk(IssueType::DuplicateTitle, "https://x.com/a/"),
        ];
        sort_issues(&mut issues);
        let first = issues.clone();
        sort_issues(&mut issues);
        assert_eq!(issues, first);

        let keys: Vec<(u8, &str, &str)> = issues.iter().map(|i| (i.priority, i.kind.as_str(), i.url.as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (1, "bad_link", "https://x.com/y/"),
                (1, "non200", "https://x.com/a/"),
                (1, "non200", "https://x.com/z/"),
                (3, "duplicate_title", "https://x.com/a/"),
                (3, "very_short", "https://x.com/b/"),
                (4, "orphan_page", "https://x.com/a/"),
            ]
        );
    }

    #[test]
    fn test_counts_include_every_type() {
        let counts = count_by_type(&[Issue::new(IssueType::BadLink, "u", "", None)]);
        assert_eq!(counts.len(), IssueType::ALL.len());
        assert_eq!(counts["bad_link"], 1);
        assert_eq!(counts["non200"], 0);
    }
}
