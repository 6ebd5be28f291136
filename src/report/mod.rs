// src/report/mod.rs
// =============================================================================
// Report artifacts.
//
// One run writes five files into a fresh timestamped directory:
// - report.json   everything: summary, counts, batches, pages, issues
// - pages.csv     one row per page
// - issues.csv    one row per issue
// - batches.json  the batch list alone
// - summary.md    human-readable counts plus the first 40 issues
//
// Failing to write any of them is the one error that ends the run.
// =============================================================================

mod summary;
mod tables;

pub use summary::render_summary;
pub use tables::{write_issues_csv, write_pages_csv};

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::audit::{Batch, DuplicateGroups, Issue, Page};
use crate::dedupe::DuplicateCluster;
use crate::error::AuditError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub urls_total: usize,
    pub urls_from_sitemap: usize,
    pub urls_discovered: usize,
    pub pages_fetched: usize,
    pub issues: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub base_url: String,
    pub generated_at: DateTime<Utc>,
    pub sitemap_urls: Vec<String>,
    pub summary: Summary,
    pub issue_counts: BTreeMap<String, usize>,
    pub batches: Vec<Batch>,
    pub duplicates: DuplicateGroups,
    pub clusters: Vec<DuplicateCluster>,
    pub pages: Vec<Page>,
    pub issues: Vec<Issue>,
}

/// `<root>/<YYYYMMDD-HHMMSS>` for the report's generation time.
pub fn output_dir(root: &Path, generated_at: &DateTime<Utc>) -> PathBuf {
    root.join(generated_at.format("%Y%m%d-%H%M%S").to_string())
}

fn create(path: &Path) -> Result<BufWriter<File>, AuditError> {
    File::create(path).map(BufWriter::new).map_err(|source| AuditError::Write {
        path: path.to_path_buf(),
        source,
    })
}

// BufWriter only reports a failed final write through flush, never on drop.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AuditError> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|source| AuditError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes every artifact into `dir` (created if missing).
pub fn write_outputs(dir: &Path, report: &AuditReport) -> Result<(), AuditError> {
    fs::create_dir_all(dir).map_err(|source| AuditError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })?;

    write_json(&dir.join("report.json"), report)?;
    write_json(&dir.join("batches.json"), &report.batches)?;
    write_pages_csv(create(&dir.join("pages.csv"))?, &report.pages)?;
    write_issues_csv(create(&dir.join("issues.csv"))?, &report.issues)?;

    let summary_path = dir.join("summary.md");
    fs::write(&summary_path, render_summary(report)).map_err(|source| AuditError::Write {
        path: summary_path.clone(),
        source,
    })?;

    info!(dir = %dir.display(), "reports written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::fixtures::page;
    use crate::audit::{build_batches, Issue, IssueType};
    use chrono::TimeZone;

    fn report() -> AuditReport {
        let issues: Vec<Issue> = (0..45)
            .map(|i| Issue {
                kind: IssueType::BadLink,
                url: format!("https://x.com/p{:02}/", i),
                evidence: "links to | somewhere".to_string(),
                fix: IssueType::BadLink.fix(None).to_string(),
                priority: 1,
            })
            .collect();
        AuditReport {
            base_url: "https://x.com/".to_string(),
            generated_at: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap(),
            sitemap_urls: vec!["https://x.com/sitemap-index.xml".to_string()],
            summary: Summary {
                urls_total: 1,
                urls_from_sitemap: 1,
                urls_discovered: 1,
                pages_fetched: 1,
                issues: issues.len(),
            },
            issue_counts: crate::audit::count_by_type(&issues),
            batches: build_batches(&issues),
            duplicates: DuplicateGroups::default(),
            clusters: Vec::new(),
            pages: vec![page("https://x.com/")],
            issues,
        }
    }

    #[test]
    fn test_output_dir_is_timestamped() {
        let report = report();
        let dir = output_dir(Path::new("reports"), &report.generated_at);
        assert_eq!(dir, Path::new("reports").join("20240506-070809"));
    }

    #[test]
    fn test_write_outputs_creates_all_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("run");
        let report = report();
        write_outputs(&dir, &report).unwrap();

        for name in ["report.json", "pages.csv", "issues.csv", "batches.json", "summary.md"] {
            assert!(dir.join(name).is_file(), "{} missing", name);
        }

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(dir.join("report.json")).unwrap()).unwrap();
        assert_eq!(json["summary"]["issues"], 45);
        assert_eq!(json["issue_counts"]["bad_link"], 45);
        assert_eq!(json["issues"][0]["type"], "bad_link");
        assert_eq!(json["batches"].as_array().unwrap().len(), 5);

        let batches: serde_json::Value = serde_json::from_str(&fs::read_to_string(dir.join("batches.json")).unwrap()).unwrap();
        assert_eq!(batches[0]["group"], "internal_links");
        assert_eq!(batches[0]["seq"], 1);
    }

    #[test]
    fn test_summary_lists_first_forty_issues() {
        let md = render_summary(&report());
        assert!(md.contains("## First 40 issues"));
        assert!(md.contains("https://x.com/p39/"));
        assert!(!md.contains("https://x.com/p40/"));
        assert!(md.contains("| bad_link | 45 |"));
        assert!(md.contains("links to \\| somewhere"));
        assert!(md.contains("\n- URLs total: 1\n- URLs from sitemap: 1\n"));
        assert!(md.contains("- internal_links #5: 5 URL(s)\n"));
    }

    #[test]
    fn test_write_outputs_fails_on_unwritable_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let err = write_outputs(&blocker.join("run"), &report()).unwrap_err();
        assert!(matches!(err, AuditError::OutputDir { .. }));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_outputs_reports_failed_flush() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("run");
        fs::create_dir_all(&dir).unwrap();
        // writes to /dev/full succeed into the buffer and fail with ENOSPC on flush
        std::os::unix::fs::symlink("/dev/full", dir.join("batches.json")).unwrap();

        let err = write_outputs(&dir, &report()).unwrap_err();
        match err {
            AuditError::Write { path, .. } => assert!(path.ends_with("batches.json")),
            other => panic!("unexpected error: {}", other),
        }
    }
}
