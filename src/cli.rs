// src/cli.rs
// =============================================================================
// Command-line interface for the site audit, built with clap's derive API.
//
// There is a single entry point: one positional argument (the base URL) plus
// a handful of tuning flags. Every flag that an operator is likely to set in
// CI can also come from the environment, which is why the `env` feature of
// clap is enabled in Cargo.toml.
// =============================================================================

use clap::Parser;

/// Crawl a website and report broken links, redirect chains, duplicate and
/// thin content, missing metadata, malformed structured data and orphan pages.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "site-audit",
    version,
    about = "Crawl a website and produce a prioritized list of SEO defects",
    long_about = "site-audit walks the sitemap index and the internal link graph of a site, \
                  fetches every page it finds (recording each redirect hop) and writes \
                  report.json, pages.csv, issues.csv, batches.json and summary.md into a \
                  timestamped output directory."
)]
pub struct Cli {
    /// Base URL of the site to audit (e.g., https://example.com)
    ///
    /// Falls back to the SITE_URL environment variable.
    #[arg(env = "SITE_URL")]
    pub base_url: String,

    /// Number of concurrent fetch workers (minimum 2)
    #[arg(long, env = "AUDIT_CONCURRENCY", default_value_t = 10)]
    pub concurrency: usize,

    /// Maximum number of pages the link crawler discovers
    #[arg(long, env = "AUDIT_MAX_PAGES", default_value_t = 500)]
    pub max_pages: usize,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "AUDIT_TIMEOUT_MS", default_value_t = 20_000)]
    pub timeout_ms: u64,

    /// Maximum number of redirects followed for one URL
    #[arg(long, default_value_t = 10)]
    pub max_redirects: usize,

    /// Location of the sitemap index, resolved against the base URL
    #[arg(long, default_value = "/sitemap-index.xml")]
    pub sitemap_path: String,

    /// Directory under which the timestamped report directory is created
    #[arg(long, env = "AUDIT_OUT_DIR", default_value = "reports/seo-audit")]
    pub out_dir: String,

    /// User-Agent header sent with every request
    #[arg(long, default_value = concat!("site-audit/", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,

    /// Print the summary as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Exit with code 1 if any issue has this priority or a more urgent one (1-4)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub fail_on_priority: Option<u8>,
}
