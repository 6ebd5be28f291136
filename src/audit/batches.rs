// src/audit/batches.rs
// =============================================================================
// Fix-it batches: issues grouped by remediation category, URLs deduplicated
// within a group (in issue order), then chunked into batches of 10.
// =============================================================================

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::issues::{Issue, IssueGroup};

pub const BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub group: IssueGroup,
    /// 1-based position within the group
    pub seq: usize,
    pub urls: Vec<String>,
}

/// Builds batches from already-sorted issues. Groups come out in IssueGroup order.
pub fn build_batches(issues: &[Issue]) -> Vec<Batch> {
    let mut by_group: BTreeMap<IssueGroup, Vec<String>> = BTreeMap::new();
    let mut seen: HashSet<(IssueGroup, &str)> = HashSet::new();

    for issue in issues {
        let group = issue.kind.group();
        if seen.insert((group, issue.url.as_str())) {
            by_group.entry(group).or_default().push(issue.url.clone());
        }
    }

    by_group
        .into_iter()
        .flat_map(|(group, urls)| {
            urls.chunks(BATCH_SIZE)
                .enumerate()
                .map(|(i, chunk)| Batch {
                    group,
                    seq: i + 1,
                    urls: chunk.to_vec(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::issues::IssueType;

    fn issue(kind: IssueType, url: &str) -> Issue {
        Issue {
            kind,
            url: url.to_string(),
            evidence: String::new(),
            fix: String::new(),
            priority: kind.priority(),
        }
    }

    #[test]
    fn test_urls_deduplicated_within_group() {
        let issues = vec![
            issue(IssueType::Non200, "https://x.com/a/"),
            issue(IssueType::RedirectChain, "https://x.com/a/"),
            issue(IssueType::DuplicateTitle, "https://x.com/a/"),
        ];
        let batches = build_batches(&issues);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].group, IssueGroup::CrawlNormalize);
        assert_eq!(batches[0].urls, vec!["https://x.com/a/"]);
        assert_eq!(batches[1].group, IssueGroup::Dedupe);
    }

    #[test]
    fn test_chunks_of_ten() {
        let issues: Vec<Issue> = (0..23)
            .map(|i| issue(IssueType::BadLink, &format!("https://x.com/{:02}/", i)))
            .collect();
        let batches = build_batches(&issues);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches.iter().map(|b| b.urls.len()).collect::<Vec<_>>(), vec![10, 10, 3]);
        assert_eq!(batches.iter().map(|b| b.seq).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(batches[1].urls[0], "https://x.com/10/");
    }

    #[test]
    fn test_group_serialization() {
        let batch = Batch {
            group: IssueGroup::InternalLinks,
            seq: 1,
            urls: vec![],
        };
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["group"], "internal_links");
    }
}
