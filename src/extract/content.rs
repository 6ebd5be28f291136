// src/extract/content.rs
// =============================================================================
// Main-content boundaries, boilerplate removal and word counting.
//
// The "main content" is a heuristic span: the first <main>...</main>, else
// <body>...</body>, else the whole document. From that span we remove the
// sections every page of a category repeats (related links, FAQ blocks,
// "Last updated" stamps). Whatever is left is the page's unique content,
// and its word count drives thin-content detection.
// =============================================================================

use std::sync::LazyLock;

use regex::Regex;

use super::category::Category;
use super::html::{collapse_whitespace, decode_entities};

static MAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<main\b[^>]*>(.*?)</main>").expect("valid regex"));
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*?)</body>").expect("valid regex"));
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>").expect("valid regex"));
static LAST_UPDATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)last\s+updated\b[^<\n]*").expect("valid regex"));
static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<noscript\b[^>]*>.*?</noscript\s*>")
        .expect("valid regex")
});
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

// Headings (lowercased prefixes) that open a recurring section.
const SHARED_SECTIONS: &[&str] = &["related guides", "related calculators", "related articles"];
const FAQ_SECTIONS: &[&str] = &["frequently asked questions", "faq"];

/// Word counts for a page's main content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentMetrics {
    /// Words in the main-content region
    pub main_words: usize,
    /// Words left after boilerplate removal
    pub unique_words: usize,
    /// The boilerplate-free text itself, used for fingerprinting
    pub unique_text: String,
}

/// First <main> span, else <body>, else the whole document.
pub fn main_region(html: &str) -> &str {
    MAIN_RE
        .captures(html)
        .or_else(|| BODY_RE.captures(html))
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
        .unwrap_or(html)
}

fn boilerplate_headings(category: Category) -> Vec<&'static str> {
    match category {
        Category::Guide | Category::Calculator => SHARED_SECTIONS.iter().chain(FAQ_SECTIONS).copied().collect(),
        Category::CategoryHub => SHARED_SECTIONS.to_vec(),
        Category::StaticResource => Vec::new(),
    }
}

/// Removes the category's recurring sections from `region`.
///
/// A section starts at a heading whose text begins with a known label and
/// runs until the next heading of the same or a higher level.
pub fn strip_boilerplate(region: &str, category: Category) -> String {
    let labels = boilerplate_headings(category);

    let headings: Vec<(usize, usize, String)> = HEADING_RE
        .captures_iter(region)
        .filter_map(|cap| {
            let start = cap.get(0)?.start();
            let level = cap[1].parse::<usize>().ok()?;
            let text = visible_text(&cap[2]).to_lowercase();
            Some((start, level, text))
        })
        .collect();

    let mut cuts: Vec<(usize, usize)> = Vec::new();
    for (i, (start, level, text)) in headings.iter().enumerate() {
        if !labels.iter().any(|label| text.starts_with(label)) {
            continue;
        }
        let end = headings[i + 1..]
            .iter()
            .find(|(_, next_level, _)| next_level <= level)
            .map(|(next_start, _, _)| *next_start)
            .unwrap_or(region.len());
        match cuts.last_mut() {
            // A nested boilerplate heading inside a section already being cut
            Some((_, prev_end)) if *start < *prev_end => *prev_end = (*prev_end).max(end),
            _ => cuts.push((*start, end)),
        }
    }

    let mut kept = String::with_capacity(region.len());
    let mut cursor = 0;
    for (start, end) in cuts {
        kept.push_str(&region[cursor..start]);
        cursor = end;
    }
    kept.push_str(&region[cursor..]);

    LAST_UPDATED_RE.replace_all(&kept, " ").into_owned()
}

/// Text content of an HTML fragment: no tags, scripts, styles or comments.
pub fn visible_text(html: &str) -> String {
    let text = SCRIPT_STYLE_RE.replace_all(html, " ");
    let text = COMMENT_RE.replace_all(&text, " ");
    let text = TAG_RE.replace_all(&text, " ");
    collapse_whitespace(&decode_entities(&text))
}

pub fn count_words(html: &str) -> usize {
    visible_text(html).split_whitespace().count()
}

/// Main-content and unique-content word counts for a page.
pub fn measure(html: &str, category: Category) -> ContentMetrics {
    let region = main_region(html);
    let unique_text = visible_text(&strip_boilerplate(region, category));
    ContentMetrics {
        main_words: count_words(region),
        unique_words: unique_text.split_whitespace().count(),
        unique_text,
    }
}
