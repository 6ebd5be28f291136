// src/main.rs
// =============================================================================
// Entry point of the site-audit CLI.
//
// What happens here:
// 1. Parse command-line arguments (and their env fallbacks) using clap
// 2. Validate them into an AuditConfig
// 3. Run the audit pipeline and write the report directory
// 4. Print a short table (or JSON summary) of what was found
// 5. Exit with proper code (0 = success, 1 = --fail-on-priority tripped, 2 = error)
//
// Progress logging goes to stderr through tracing; stdout carries only the
// final table or JSON so it can be piped.
// =============================================================================

mod audit;    // src/audit/ - pipeline, issue rules, batches
mod cli;      // src/cli.rs - command-line parsing
mod config;   // src/config.rs - validated run configuration
mod crawl;    // src/crawl/ - sitemap walk and link crawler
mod dedupe;   // src/dedupe/ - SimHash fingerprints and clustering
mod error;    // src/error.rs - AuditError
mod extract;  // src/extract/ - HTML signal extraction
mod fetch;    // src/fetch/ - URL normalization and redirect-tracking fetch
mod report;   // src/report/ - report.json, CSVs, summary.md

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use audit::{run_audit, Issue};
use cli::Cli;
use config::AuditConfig;
use report::{output_dir, write_outputs, AuditReport};

/// Rows shown in the terminal table.
const TABLE_ROWS: usize = 20;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("site_audit=info".parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

// Returns:
//   Ok(0) = audit written, nothing at or above --fail-on-priority
//   Ok(1) = audit written, --fail-on-priority tripped
//   Err   = invalid input or the report could not be written
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing()?;

    let config = AuditConfig::from_cli(&cli)?;
    if !cli.json {
        println!("🔍 Auditing {}", config.base_url);
    }

    let report = run_audit(&config).await?;
    let dir = output_dir(&config.out_dir, &report.generated_at);
    write_outputs(&dir, &report).with_context(|| format!("writing reports to {}", dir.display()))?;

    if cli.json {
        let summary = json!({
            "base_url": report.base_url,
            "out_dir": dir.display().to_string(),
            "summary": report.summary,
            "issue_counts": report.issue_counts,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_table(&report);
        println!("📁 Reports written to {}", dir.display());
    }

    Ok(exit_code(&report.issues, cli.fail_on_priority))
}

// Priority 1 is the most urgent, so "at or above" means numerically <=.
fn exit_code(issues: &[Issue], fail_on_priority: Option<u8>) -> i32 {
    match fail_on_priority {
        Some(threshold) if issues.iter().any(|issue| issue.priority <= threshold) => 1,
        _ => 0,
    }
}

fn print_table(report: &AuditReport) {
    println!("{:<8} {:<24} {:<60}", "PRIO", "TYPE", "URL");
    println!("{}", "=".repeat(92));

    for issue in report.issues.iter().take(TABLE_ROWS) {
        println!(
            "{:<8} {:<24} {:<60}",
            format_priority(issue.priority),
            issue.kind.as_str(),
            truncate(&issue.url, 57)
        );
    }
    if report.issues.len() > TABLE_ROWS {
        println!("... and {} more (see issues.csv)", report.issues.len() - TABLE_ROWS);
    }

    println!();

    let s = &report.summary;
    println!("📊 Summary:");
    println!("   🌐 URLs: {} ({} from sitemap, {} crawled)", s.urls_total, s.urls_from_sitemap, s.urls_discovered);
    println!("   ✅ Pages OK: {}", s.pages_fetched);
    println!("   ⚠️  Issues: {}", s.issues);
    println!("   📦 Batches: {}", report.batches.len());
}

fn truncate(url: &str, max: usize) -> String {
    if url.chars().count() > max {
        format!("{}...", url.chars().take(max).collect::<String>())
    } else {
        url.to_string()
    }
}

fn format_priority(priority: u8) -> String {
    match priority {
        1 => "🔴 P1".to_string(),
        2 => "🟠 P2".to_string(),
        3 => "🟡 P3".to_string(),
        p => format!("⚪ P{}", p),
    }
}
