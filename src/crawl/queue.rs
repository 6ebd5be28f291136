// src/crawl/queue.rs
// =============================================================================
// Concurrent breadth-first crawl of a site's internal links.
//
// How it works:
// 1. Seed a shared FIFO queue with the normalized, same-site entry points
// 2. A fixed pool of workers pulls URLs off the queue
// 3. Each worker fetches its URL; on HTTP 200 it extracts same-site links
//    and enqueues every link nobody has seen yet
// 4. Stop when the queue is empty and nobody is working, or when
//    max_pages URLs have been discovered
//
// Shared state (queue, seen-set, discovered list) lives in one Mutex owned
// by the crawl and handed to the workers. A URL is claimed by exactly one
// worker: it moves from the queue to `discovered` under the lock.
//
// Backpressure: once queue + discovered reaches 3 * max_pages, new links are
// no longer enqueued. Huge fan-out pages cannot blow up memory that way.
//
// Discovery order is breadth-first-ish but NOT deterministic across runs.
// =============================================================================

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use reqwest::Client;
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use url::Url;

use crate::extract::extract_internal_links;
use crate::fetch::{fetch_chain, is_same_site, normalize, FetchOptions, NormalizedUrl};

/// Queue growth stops at this multiple of the page budget.
const BACKPRESSURE_FACTOR: usize = 3;

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub max_pages: usize,
    pub concurrency: usize,
    pub fetch: FetchOptions,
}

#[derive(Debug, Default)]
struct CrawlState {
    queue: VecDeque<NormalizedUrl>,
    seen: HashSet<NormalizedUrl>,
    discovered: Vec<NormalizedUrl>,
    in_flight: usize,
}

impl CrawlState {
    fn budget_reached(&self, max_pages: usize) -> bool {
        self.discovered.len() >= max_pages
    }

    fn can_enqueue(&self, max_pages: usize) -> bool {
        self.queue.len() + self.discovered.len() < BACKPRESSURE_FACTOR * max_pages
    }

    fn enqueue_links(&mut self, links: Vec<NormalizedUrl>, max_pages: usize) -> usize {
        let mut added = 0;
        for link in links {
            if !self.can_enqueue(max_pages) {
                break;
            }
            if self.seen.insert(link.clone()) {
                self.queue.push_back(link);
                added += 1;
            }
        }
        added
    }
}

struct Shared {
    state: Mutex<CrawlState>,
    notify: Notify,
}

enum Step {
    Work(NormalizedUrl),
    Wait,
    Done,
}

/// Crawls `base` from `seeds`, returning the discovered URLs in discovery order.
pub async fn crawl_internal(
    client: &Client,
    base: &Url,
    seeds: &[String],
    options: &CrawlOptions,
) -> Vec<NormalizedUrl> {
    let max_pages = options.max_pages.max(1);

    let mut initial = CrawlState::default();
    let seeds: Vec<NormalizedUrl> = seeds
        .iter()
        .filter_map(|seed| normalize(seed, Some(base)))
        .filter(|seed| is_same_site(seed.as_str(), base))
        .collect();
    initial.enqueue_links(seeds, max_pages);

    if initial.queue.is_empty() {
        warn!(base = %base, "no same-site seeds to crawl");
        return Vec::new();
    }

    let shared = Arc::new(Shared {
        state: Mutex::new(initial),
        notify: Notify::new(),
    });

    let workers = (0..options.concurrency.max(1)).map(|id| {
        let shared = Arc::clone(&shared);
        let client = client.clone();
        let base = base.clone();
        let options = options.clone();
        tokio::spawn(async move { worker(id, shared, client, base, options, max_pages).await })
    });

    for joined in join_all(workers).await {
        if let Err(e) = joined {
            warn!(error = %e, "crawl worker panicked");
        }
    }

    let discovered = {
        let mut state = shared.state.lock().unwrap_or_else(|p| p.into_inner());
        std::mem::take(&mut state.discovered)
    };

    info!(discovered = discovered.len(), "internal crawl finished");
    discovered
}

async fn worker(
    id: usize,
    shared: Arc<Shared>,
    client: Client,
    base: Url,
    options: CrawlOptions,
    max_pages: usize,
) {
    loop {
        // Register interest before inspecting the state, so a wake-up that
        // lands between the check and the await is not lost.
        let notified = shared.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let step = {
            let mut state = shared.state.lock().unwrap_or_else(|p| p.into_inner());
            if state.budget_reached(max_pages) {
                Step::Done
            } else if let Some(url) = state.queue.pop_front() {
                state.discovered.push(url.clone());
                state.in_flight += 1;
                Step::Work(url)
            } else if state.in_flight == 0 {
                Step::Done
            } else {
                Step::Wait
            }
        };

        match step {
            Step::Done => {
                shared.notify.notify_waiters();
                break;
            }
            Step::Wait => notified.await,
            Step::Work(url) => {
                let links = fetch_links(&client, &url, &base, &options.fetch).await;

                let mut state = shared.state.lock().unwrap_or_else(|p| p.into_inner());
                state.in_flight -= 1;
                let added = state.enqueue_links(links, max_pages);
                debug!(worker = id, url = %url, added, queued = state.queue.len(), "crawled");
                drop(state);

                shared.notify.notify_waiters();
            }
        }
    }
}

// Fetches one page and returns its same-site links. Non-200 pages are not expanded.
async fn fetch_links(client: &Client, url: &NormalizedUrl, base: &Url, options: &FetchOptions) -> Vec<NormalizedUrl> {
    let result = fetch_chain(client, url.as_str(), options).await;
    if !result.is_ok() || !result.is_html() {
        debug!(url = %url, status = result.status, "not expanding");
        return Vec::new();
    }
    extract_internal_links(&result.body, &result.final_url, base)
}
