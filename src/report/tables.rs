// src/report/tables.rs
// =============================================================================
// pages.csv and issues.csv.
//
// The csv crate's default quoting (QuoteStyle::Necessary) wraps any field
// containing a comma, a double quote or a newline in quotes and doubles the
// quotes inside it, so evidence strings survive a round trip unchanged.
// =============================================================================

use std::io::Write;

use crate::audit::{Issue, Page};
use crate::dedupe::to_hex;

const PAGE_HEADERS: [&str; 14] = [
    "url",
    "status",
    "final_url",
    "category",
    "title",
    "description",
    "canonical",
    "robots",
    "main_content_words",
    "main_unique_words",
    "main_simhash64",
    "internal_links_count",
    "schema_blocks_count",
    "schema_errors_count",
];

const ISSUE_HEADERS: [&str; 5] = ["priority", "type", "url", "evidence", "fix"];

pub fn write_pages_csv<W: Write>(out: W, pages: &[Page]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(PAGE_HEADERS)?;

    for page in pages {
        writer.write_record([
            page.url.to_string(),
            page.status.to_string(),
            page.final_url.to_string(),
            page.category.to_string(),
            page.title.clone().unwrap_or_default(),
            page.description.clone().unwrap_or_default(),
            page.canonical_raw.clone().unwrap_or_default(),
            page.robots.clone().unwrap_or_default(),
            page.main_content_words.to_string(),
            page.main_unique_words.to_string(),
            page.main_simhash64.map(to_hex).unwrap_or_default(),
            page.internal_links.len().to_string(),
            page.schema_blocks.to_string(),
            page.schema_errors.len().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_issues_csv<W: Write>(out: W, issues: &[Issue]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(ISSUE_HEADERS)?;

    for issue in issues {
        writer.write_record([
            issue.priority.to_string().as_str(),
            issue.kind.as_str(),
            issue.url.as_str(),
            issue.evidence.as_str(),
            issue.fix.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
