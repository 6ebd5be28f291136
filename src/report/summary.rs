// src/report/summary.rs
// summary.md: counts, issue types, batches and the first issues as a table.

use super::AuditReport;

/// How many issues summary.md lists in full.
pub const SUMMARY_ISSUE_LIMIT: usize = 40;

// Pipes and newlines would break a Markdown table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

pub fn render_summary(report: &AuditReport) -> String {
    let s = &report.summary;
    let mut md = format!(
        "# SEO audit: {}\n\nGenerated {}\n\n## Summary\n\n\
         - URLs total: {}\n\
         - URLs from sitemap: {}\n\
         - URLs discovered by crawling: {}\n\
         - Pages fetched (200): {}\n\
         - Issues: {}\n\n",
        report.base_url,
        report.generated_at.to_rfc3339(),
        s.urls_total,
        s.urls_from_sitemap,
        s.urls_discovered,
        s.pages_fetched,
        s.issues,
    );

    md.push_str("## Issues by type\n\n| Type | Count |\n|------|-------|\n");
    for (kind, count) in report.issue_counts.iter().filter(|(_, count)| **count > 0) {
        md.push_str(&format!("| {} | {} |\n", kind, count));
    }

    md.push_str("\n## Batches\n\n");
    if report.batches.is_empty() {
        md.push_str("No batches.\n");
    }
    for batch in &report.batches {
        md.push_str(&format!("- {} #{}: {} URL(s)\n", batch.group.as_str(), batch.seq, batch.urls.len()));
    }

    let shown = report.issues.len().min(SUMMARY_ISSUE_LIMIT);
    md.push_str(&format!("\n## First {} issues\n\n", shown));
    md.push_str("| Priority | Type | URL | Evidence |\n|----------|------|-----|----------|\n");
    for issue in report.issues.iter().take(SUMMARY_ISSUE_LIMIT) {
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            issue.priority,
            issue.kind,
            cell(&issue.url),
            cell(&issue.evidence)
        ));
    }

    md
}
