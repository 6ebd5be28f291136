// src/extract/html.rs
// =============================================================================
// Targeted extraction of SEO signals from raw HTML.
//
// This is deliberately NOT an HTML parser. Each function below is a small,
// pure pattern match over the document text that pulls out one signal:
// - <title>
// - <meta name=...> / <meta property=...> content
// - <link rel="canonical">
// - <link rel="alternate" hreflang=...>
// - <script type="application/ld+json"> blocks (each parsed independently)
// - <a href> links
//
// Markup that these patterns do not understand is simply not found; nothing
// here can fail.
// =============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::{is_same_site, normalize, NormalizedUrl};

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("valid regex"));
static META_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<meta\b([^>]*)>").expect("valid regex"));
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<link\b([^>]*)>").expect("valid regex"));
static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>").expect("valid regex"));
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script>").expect("valid regex"));
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid regex")
});
static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// One `<link rel="alternate" hreflang>` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hreflang {
    pub lang: String,
    pub href: String,
}

/// Outcome of parsing every JSON-LD block on a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonLdSummary {
    pub blocks: usize,
    /// One message per block that is not valid JSON
    pub errors: Vec<String>,
}

/// Decodes the handful of entities that show up in titles and body copy.
pub fn decode_entities(text: &str) -> String {
    let decoded = NUMERIC_ENTITY_RE.replace_all(text, |caps: &regex::Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (_, Some(dec)) => dec.as_str().parse().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    decoded
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Collapses runs of whitespace into single spaces and trims.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

// Attribute map of a tag's attribute text. Keys are lowercased; the first
// occurrence of a repeated attribute wins, like in a browser.
fn parse_attrs(attrs: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for cap in ATTR_RE.captures_iter(attrs) {
        let name = cap[1].to_ascii_lowercase();
        let value = cap
            .get(2)
            .or_else(|| cap.get(3))
            .or_else(|| cap.get(4))
            .map(|m| decode_entities(m.as_str()))
            .unwrap_or_default();
        map.entry(name).or_insert(value);
    }
    map
}

fn tag_attrs<'a>(re: &'a Regex, html: &'a str) -> impl Iterator<Item = HashMap<String, String>> + 'a {
    re.captures_iter(html).map(|cap| parse_attrs(&cap[1]))
}

// rel="alternate canonical" style lists are space separated.
fn has_rel(attrs: &HashMap<String, String>, rel: &str) -> bool {
    attrs
        .get("rel")
        .is_some_and(|value| value.split_ascii_whitespace().any(|r| r.eq_ignore_ascii_case(rel)))
}

fn non_empty(value: String) -> Option<String> {
    let value = collapse_whitespace(&value);
    (!value.is_empty()).then_some(value)
}

pub fn extract_title(html: &str) -> Option<String> {
    let cap = TITLE_RE.captures(html)?;
    non_empty(decode_entities(&cap[1]))
}

/// Content of the first `<meta name=...>` (or `property=...`) matching `name`.
pub fn extract_meta(html: &str, name: &str) -> Option<String> {
    tag_attrs(&META_RE, html)
        .find(|attrs| {
            attrs
                .get("name")
                .or_else(|| attrs.get("property"))
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
        .and_then(|mut attrs| attrs.remove("content"))
        .and_then(non_empty)
}

/// Raw href of the first `<link rel="canonical">`.
pub fn extract_canonical(html: &str) -> Option<String> {
    tag_attrs(&LINK_RE, html)
        .find(|attrs| has_rel(attrs, "canonical"))
        .and_then(|mut attrs| attrs.remove("href"))
        .and_then(non_empty)
}

pub fn extract_hreflang(html: &str) -> Vec<Hreflang> {
    tag_attrs(&LINK_RE, html)
        .filter(|attrs| has_rel(attrs, "alternate"))
        .filter_map(|mut attrs| {
            let lang = attrs.remove("hreflang")?;
            let href = attrs.remove("href")?;
            Some(Hreflang { lang, href })
        })
        .collect()
}

/// Parses every JSON-LD block on its own; a broken block does not hide the others.
pub fn extract_json_ld(html: &str) -> JsonLdSummary {
    let mut summary = JsonLdSummary::default();
    for cap in SCRIPT_RE.captures_iter(html) {
        let attrs = parse_attrs(&cap[1]);
        let is_json_ld = attrs
            .get("type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"));
        if !is_json_ld {
            continue;
        }

        summary.blocks += 1;
        if let Err(e) = serde_json::from_str::<serde_json::Value>(cap[2].trim()) {
            summary.errors.push(format!("block {}: {}", summary.blocks, e));
        }
    }
    summary
}

/// Absolute http(s) URLs of every `<a href>` on the page, in document order.
pub fn extract_links(html: &str, page_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };

    tag_attrs(&ANCHOR_RE, html)
        .filter_map(|mut attrs| attrs.remove("href"))
        .filter_map(|href| resolve_url(&base, &href))
        .filter(|url| is_checkable_link(url))
        .collect()
}

/// Same-site links of a page, normalized and deduplicated (first occurrence wins).
pub fn extract_internal_links(html: &str, page_url: &str, site: &Url) -> Vec<NormalizedUrl> {
    let mut seen = HashSet::new();
    extract_links(html, page_url)
        .into_iter()
        .filter(|url| is_same_site(url, site))
        .filter_map(|url| normalize(&url, None))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

// Resolves a possibly-relative href. Anchors and script/mail/phone links are skipped.
fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if href.is_empty()
        || href.starts_with('#')
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("javascript:")
    {
        return None;
    }

    base.join(href).ok().map(|url| url.to_string())
}

fn is_checkable_link(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
