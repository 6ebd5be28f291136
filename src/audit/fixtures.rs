// src/audit/fixtures.rs
// Page builders for rule and report tests.

use crate::extract::categorize;
use crate::fetch::{normalize, NormalizedUrl, RedirectHop};

use super::page::Page;

fn norm(url: &str) -> NormalizedUrl {
    normalize(url, None).expect("fixture URL must be valid")
}

/// A 200 page with a title, description, self-canonical and no content.
pub fn page(url: &str) -> Page {
    let url = norm(url);
    Page {
        final_url: url.clone(),
        status: 200,
        redirect_chain: vec![RedirectHop {
            url: url.to_string(),
            status: 200,
            location: None,
            error: None,
        }],
        category: categorize(&url.path()),
        title: Some(format!("Title of {}", url)),
        description: Some(format!("Description of {}", url)),
        robots: None,
        canonical_raw: Some(url.to_string()),
        canonical: Some(url.clone()),
        hreflang: Vec::new(),
        internal_links: Vec::new(),
        schema_blocks: 0,
        schema_errors: Vec::new(),
        main_content_words: 0,
        main_unique_words: 0,
        main_simhash64: None,
        url,
    }
}

impl Page {
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        if let Some(last) = self.redirect_chain.last_mut() {
            last.status = status;
        }
        self
    }

    pub fn links(mut self, links: &[&str]) -> Self {
        self.internal_links = links.iter().map(|l| norm(l)).collect();
        self
    }

    pub fn title(mut self, title: Option<&str>) -> Self {
        self.title = title.map(str::to_string);
        self
    }

    pub fn description(mut self, description: Option<&str>) -> Self {
        self.description = description.map(str::to_string);
        self
    }

    pub fn canonical(mut self, canonical: Option<&str>) -> Self {
        self.canonical_raw = canonical.map(str::to_string);
        self.canonical = canonical.map(norm);
        self
    }

    pub fn robots(mut self, robots: &str) -> Self {
        self.robots = Some(robots.to_string());
        self
    }

    pub fn unique_words(mut self, words: usize) -> Self {
        self.main_unique_words = words;
        self.main_content_words = words;
        self
    }

    pub fn fingerprint(mut self, fingerprint: u64) -> Self {
        self.main_simhash64 = Some(fingerprint);
        self
    }

    pub fn schema_error(mut self, error: &str) -> Self {
        self.schema_blocks += 1;
        self.schema_errors.push(error.to_string());
        self
    }

    /// Replaces the chain with a redirect from this page to `target`.
    pub fn redirected_to(mut self, target: &str) -> Self {
        let target = norm(target);
        self.redirect_chain = vec![
            RedirectHop {
                url: self.url.to_string(),
                status: 301,
                location: Some(target.to_string()),
                error: None,
            },
            RedirectHop {
                url: target.to_string(),
                status: self.status,
                location: None,
                error: None,
            },
        ];
        self.canonical_raw = Some(target.to_string());
        self.canonical = Some(target.clone());
        self.final_url = target;
        self
    }

    /// A page that redirects to itself until the hop budget runs out.
    pub fn redirect_loop(mut self, hops: usize) -> Self {
        let url = self.url.to_string();
        self.redirect_chain = (0..hops)
            .map(|_| RedirectHop {
                url: url.clone(),
                status: 301,
                location: Some(url.clone()),
                error: None,
            })
            .collect();
        self.status = 0;
        self.title = None;
        self.description = None;
        self.canonical_raw = None;
        self.canonical = None;
        self
    }
}
