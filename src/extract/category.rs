// src/extract/category.rs
// =============================================================================
// Page category, inferred from the shape of the URL path.
//
// Precedence (first match wins):
// 1. static-resource: the last path segment is a file name ("app.js"), or
//    the path lives under a known asset directory
// 2. guide: any "guides" segment ("/guides/budgeting/", "/en/guides/x/")
// 3. category-hub: the root or a single-segment path ("/finance/")
// 4. calculator: everything deeper ("/finance/loan-payment/")
//
// New path shapes belong here; crawl and extraction code never look at paths.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

const ASSET_DIRS: &[&str] = &["assets", "_astro", "images", "img", "fonts", "static"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    CategoryHub,
    Calculator,
    Guide,
    StaticResource,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CategoryHub => "category-hub",
            Category::Calculator => "calculator",
            Category::Guide => "guide",
            Category::StaticResource => "static-resource",
        }
    }

    /// Unique words below this count make a page thin.
    pub fn thin_content_threshold(&self) -> usize {
        match self {
            Category::Guide => 350,
            Category::CategoryHub | Category::Calculator | Category::StaticResource => 160,
        }
    }

    /// Static assets are not documents; metadata checks skip them.
    pub fn is_document(&self) -> bool {
        !matches!(self, Category::StaticResource)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn categorize(path: &str) -> Category {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let is_file = !path.ends_with('/') && segments.last().is_some_and(|s| s.contains('.'));
    let in_asset_dir = segments
        .first()
        .is_some_and(|first| ASSET_DIRS.contains(&first.to_ascii_lowercase().as_str()));
    if is_file || in_asset_dir {
        return Category::StaticResource;
    }

    if segments.iter().any(|s| s.eq_ignore_ascii_case("guides")) {
        return Category::Guide;
    }

    if segments.len() <= 1 {
        Category::CategoryHub
    } else {
        Category::Calculator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_resources() {
        assert_eq!(categorize("/favicon.ico"), Category::StaticResource);
        assert_eq!(categorize("/guides/chart.png"), Category::StaticResource);
        assert_eq!(categorize("/_astro/"), Category::StaticResource);
        assert_eq!(categorize("/assets/fonts/"), Category::StaticResource);
    }

    #[test]
    fn test_guides() {
        assert_eq!(categorize("/guides/"), Category::Guide);
        assert_eq!(categorize("/guides/budgeting-basics/"), Category::Guide);
        assert_eq!(categorize("/en/guides/tax/"), Category::Guide);
    }

    #[test]
    fn test_hubs_and_calculators() {
        assert_eq!(categorize("/"), Category::CategoryHub);
        assert_eq!(categorize("/finance/"), Category::CategoryHub);
        assert_eq!(categorize("/finance/loan-payment/"), Category::Calculator);
        assert_eq!(categorize("/health/bmi/metric/"), Category::Calculator);
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(Category::Guide.thin_content_threshold(), 350);
        assert_eq!(Category::Calculator.thin_content_threshold(), 160);
        assert_eq!(Category::StaticResource.thin_content_threshold(), 160);
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_string(&Category::CategoryHub).unwrap(), "\"category-hub\"");
        assert_eq!(Category::StaticResource.to_string(), "static-resource");
    }
}
