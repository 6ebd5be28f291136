// src/extract/mod.rs
// =============================================================================
// Content extraction: everything the audit learns from a page's HTML.
//
// Submodules:
// - category: page category from the URL path
// - html: one small pattern-matching function per signal
// - content: main-content region, boilerplate removal, word counts
//
// `extract` ties them together for a single fetched page.
// =============================================================================

mod category;
mod content;
mod html;

pub use category::{categorize, Category};
pub use content::{measure, ContentMetrics};
pub use html::{
    decode_entities, extract_canonical, extract_hreflang, extract_internal_links, extract_json_ld, extract_meta,
    extract_title, Hreflang, JsonLdSummary,
};

use url::Url;

use crate::fetch::{normalize_str, NormalizedUrl};

/// Every signal pulled out of one HTML document.
#[derive(Debug, Clone, Default)]
pub struct ContentSignals {
    pub title: Option<String>,
    pub description: Option<String>,
    pub robots: Option<String>,
    pub canonical_raw: Option<String>,
    /// Canonical href resolved against the page URL and normalized
    pub canonical: Option<NormalizedUrl>,
    pub hreflang: Vec<Hreflang>,
    pub internal_links: Vec<NormalizedUrl>,
    pub json_ld: JsonLdSummary,
    pub content: ContentMetrics,
}

/// Extracts all signals from `html`, fetched from `url` on the site rooted at `site`.
pub fn extract(html: &str, url: &str, site: &Url, category: Category) -> ContentSignals {
    let canonical_raw = extract_canonical(html);
    let canonical = canonical_raw.as_deref().and_then(|raw| normalize_str(raw, url));

    ContentSignals {
        title: extract_title(html),
        description: extract_meta(html, "description"),
        robots: extract_meta(html, "robots"),
        canonical,
        canonical_raw,
        hreflang: extract_hreflang(html),
        internal_links: extract_internal_links(html, url, site),
        json_ld: extract_json_ld(html),
        content: measure(html, category),
    }
}
