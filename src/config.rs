// src/config.rs
// =============================================================================
// Validated audit configuration.
//
// `Cli` holds whatever the user typed; `AuditConfig` is what the rest of the
// program works with: a parsed base URL, a concurrency level that respects
// the minimum, and real Durations instead of millisecond counts.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::cli::Cli;
use crate::error::AuditError;

/// Fewer than two workers would serialize the crawl entirely.
pub const MIN_CONCURRENCY: usize = 2;

#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub base_url: Url,
    pub concurrency: usize,
    pub max_pages: usize,
    pub max_redirects: usize,
    pub timeout: Duration,
    pub sitemap_url: Url,
    pub out_dir: PathBuf,
    pub user_agent: String,
}

impl AuditConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, AuditError> {
        let base_url = Url::parse(&cli.base_url).map_err(|e| AuditError::InvalidBaseUrl {
            url: cli.base_url.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.host_str().is_none() {
            return Err(AuditError::InvalidBaseUrl {
                url: cli.base_url.clone(),
                reason: "expected an http(s) URL with a host".to_string(),
            });
        }

        let sitemap_url = base_url
            .join(&cli.sitemap_path)
            .map_err(|e| AuditError::InvalidBaseUrl {
                url: cli.sitemap_path.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            base_url,
            concurrency: cli.concurrency.max(MIN_CONCURRENCY),
            max_pages: cli.max_pages.max(1),
            max_redirects: cli.max_redirects,
            timeout: Duration::from_millis(cli.timeout_ms),
            sitemap_url,
            out_dir: PathBuf::from(&cli.out_dir),
            user_agent: cli.user_agent.clone(),
        })
    }

    /// Local development hosts get a few checks relaxed (see canonical_mismatch).
    pub fn is_local_host(&self) -> bool {
        is_local_host(&self.base_url)
    }
}

pub fn is_local_host(url: &Url) -> bool {
    matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["site-audit"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_concurrency_is_clamped() {
        let config = AuditConfig::from_cli(&cli(&["https://example.com", "--concurrency", "1"])).unwrap();
        assert_eq!(config.concurrency, MIN_CONCURRENCY);
    }

    #[test]
    fn test_sitemap_url_resolved_against_base() {
        let config = AuditConfig::from_cli(&cli(&["https://example.com/"])).unwrap();
        assert_eq!(config.sitemap_url.as_str(), "https://example.com/sitemap-index.xml");
        assert_eq!(config.timeout, Duration::from_millis(20_000));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = AuditConfig::from_cli(&cli(&["not a url"])).unwrap_err();
        assert!(matches!(err, AuditError::InvalidBaseUrl { .. }));

        let err = AuditConfig::from_cli(&cli(&["mailto:someone@example.com"])).unwrap_err();
        assert!(matches!(err, AuditError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_local_host_detection() {
        assert!(is_local_host(&Url::parse("http://localhost:4321/").unwrap()));
        assert!(is_local_host(&Url::parse("http://127.0.0.1:8080/").unwrap()));
        assert!(!is_local_host(&Url::parse("https://example.com/").unwrap()));
    }
}
