// src/fetch/normalize.rs
// =============================================================================
// URL canonicalization.
//
// Two hrefs that point at the same resource must end up as the same string,
// otherwise the seen-sets, the link graph and the sitemap comparison all
// disagree. The rules:
// 1. Resolve relative URLs against the page they were found on
// 2. Drop the #fragment
// 3. Give every directory-like path a trailing slash ("/a" -> "/a/"),
//    but leave file-like paths ("/a.xml") and the root alone
//
// Malformed input yields None. Callers skip the URL, nothing is thrown.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// An absolute URL that has been through `normalize`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Path component, e.g. "/guides/budgeting/".
    pub fn path(&self) -> String {
        Url::parse(&self.0)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| "/".to_string())
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolves `raw` against `base` (when given) and canonicalizes the result.
pub fn normalize(raw: &str, base: Option<&Url>) -> Option<NormalizedUrl> {
    let raw = raw.trim();
    let mut url = match base {
        Some(base) => base.join(raw).ok()?,
        None => Url::parse(raw).ok()?,
    };

    url.set_fragment(None);

    if needs_trailing_slash(url.path()) && !url.cannot_be_a_base() {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Some(NormalizedUrl(url.to_string()))
}

/// Convenience for callers holding a base as a string.
pub fn normalize_str(raw: &str, base: &str) -> Option<NormalizedUrl> {
    let base = Url::parse(base).ok()?;
    normalize(raw, Some(&base))
}

// "/a" and "/a/b" get a slash; "/", "/a/" and "/a.xml" do not.
fn needs_trailing_slash(path: &str) -> bool {
    if path.is_empty() || path == "/" || path.ends_with('/') {
        return false;
    }
    let last_segment = path.rsplit('/').next().unwrap_or("");
    !last_segment.contains('.')
}

/// Hostname without a leading "www.", lowercased.
pub fn site_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// True when `url` lives on the same site as `base` (www. and case ignored).
pub fn is_same_site(url: &str, base: &Url) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    match (site_host(&parsed), site_host(base)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
