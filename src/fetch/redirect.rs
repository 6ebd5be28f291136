// src/fetch/redirect.rs
// =============================================================================
// One logical "fetch" per URL, following redirects by hand.
//
// The HTTP client is built with redirects disabled. Each hop is issued as a
// plain GET and recorded, so the whole chain is available later for the
// redirect_chain issue.
//
// The loop itself is a small state machine (`RedirectTracker`) that knows
// nothing about networking:
//
//   Following(url) --3xx + Location--> Following(next)
//   Following(url) --other status----> Terminated(status)
//   Following(url) --transport error-> Failed(error)
//   Following(url) --hop budget gone-> LimitExceeded
//
// A URL that redirects to itself therefore stops after max_redirects + 1
// hops with status 0.
// =============================================================================

use std::time::Duration;

use reqwest::header::{HeaderMap, CONTENT_TYPE, LOCATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::normalize::normalize;

/// One response in a redirect chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectHop {
    pub url: String,
    /// HTTP status, or 0 when the request never produced a response
    pub status: u16,
    pub location: Option<String>,
    pub error: Option<String>,
}

/// Where the redirect loop currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainState {
    Following(String),
    Terminated(u16),
    Failed(String),
    LimitExceeded,
}

#[derive(Debug, Clone)]
pub struct RedirectTracker {
    max_redirects: usize,
    chain: Vec<RedirectHop>,
    state: ChainState,
}

impl RedirectTracker {
    pub fn new(start_url: &str, max_redirects: usize) -> Self {
        Self {
            max_redirects,
            chain: Vec::new(),
            state: ChainState::Following(start_url.to_string()),
        }
    }

    /// URL to request next, or None once the chain has terminated.
    pub fn current(&self) -> Option<&str> {
        match &self.state {
            ChainState::Following(url) => Some(url),
            _ => None,
        }
    }

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    pub fn chain(&self) -> &[RedirectHop] {
        &self.chain
    }

    pub fn into_chain(self) -> Vec<RedirectHop> {
        self.chain
    }

    /// Records a response for the current URL and advances the state.
    pub fn record_response(&mut self, status: u16, location: Option<&str>) -> &ChainState {
        let Some(current) = self.current().map(str::to_string) else {
            return &self.state;
        };

        self.chain.push(RedirectHop {
            url: current.clone(),
            status,
            location: location.map(str::to_string),
            error: None,
        });

        let next = if (300..400).contains(&status) {
            let base = Url::parse(&current).ok();
            location.and_then(|loc| normalize(loc, base.as_ref()))
        } else {
            None
        };

        self.state = match next {
            Some(_) if self.chain.len() > self.max_redirects => ChainState::LimitExceeded,
            Some(next) => ChainState::Following(next.into_string()),
            None => ChainState::Terminated(status),
        };
        &self.state
    }

    /// Records a transport failure (DNS, connect, timeout) for the current URL.
    pub fn record_failure(&mut self, error: impl Into<String>) -> &ChainState {
        let Some(current) = self.current().map(str::to_string) else {
            return &self.state;
        };
        let error = error.into();
        self.chain.push(RedirectHop {
            url: current,
            status: 0,
            location: None,
            error: Some(error.clone()),
        });
        self.state = ChainState::Failed(error);
        &self.state
    }

    /// Status reported for the whole fetch: the terminal status, or 0.
    pub fn final_status(&self) -> u16 {
        match self.state {
            ChainState::Terminated(status) => status,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub max_redirects: usize,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_redirects: 10,
            timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Last URL requested (the redirect target that produced the body)
    pub final_url: String,
    pub status: u16,
    pub headers: HeaderMap,
    pub content_type: String,
    pub body: String,
    pub chain: Vec<RedirectHop>,
}

impl FetchResult {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_html(&self) -> bool {
        self.content_type.is_empty() || self.content_type.contains("html")
    }
}

/// Builds the shared client. Redirects are never followed automatically.
pub fn build_client(user_agent: &str, timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(user_agent)
        .build()
}

/// Fetches `url`, following up to `options.max_redirects` redirects by hand.
///
/// Never fails: transport errors and exhausted redirect budgets come back as
/// status 0 with the chain preserved.
pub async fn fetch_chain(client: &Client, url: &str, options: &FetchOptions) -> FetchResult {
    let mut tracker = RedirectTracker::new(url, options.max_redirects);
    let mut headers = HeaderMap::new();
    let mut body = String::new();

    while let Some(current) = tracker.current().map(str::to_string) {
        let response = match client.get(&current).timeout(options.timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %current, error = %e, "transport failure");
                tracker.record_failure(categorize_error(&e));
                break;
            }
        };

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if (300..400).contains(&status) && location.is_some() {
            tracker.record_response(status, location.as_deref());
            continue;
        }

        headers = response.headers().clone();
        match response.text().await {
            Ok(text) => {
                body = text;
                tracker.record_response(status, location.as_deref());
            }
            Err(e) => {
                tracker.record_failure(categorize_error(&e));
            }
        }
    }

    let status = tracker.final_status();
    if status == 0 {
        body.clear();
    }
    let final_url = tracker
        .chain()
        .last()
        .map(|hop| hop.url.clone())
        .unwrap_or_else(|| url.to_string());
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    FetchResult {
        final_url,
        status,
        headers,
        content_type,
        body,
        chain: tracker.into_chain(),
    }
}

// Turns a reqwest error into a short, stable message for the hop's error field.
fn categorize_error(error: &reqwest::Error) -> String {
    let error_string = error.to_string();

    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        if error_string.contains("dns") {
            "could not resolve hostname".to_string()
        } else {
            "connection failed".to_string()
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        "SSL certificate error".to_string()
    } else if error.is_body() || error.is_decode() {
        format!("failed to read body: {}", error_string)
    } else {
        error_string
    }
}
