//! Crawl controller.
//!
//! Frontier-driven traversal of the wiki page graph:
//! 1. Fetch the current target (waiting out HTTP 429s)
//! 2. Store the page under its title and mark it visited
//! 3. Append newly discovered article links to the frontier
//! 4. Select the next unvisited frontier entry
//! 5. Checkpoint every N collected pages, then pause politely
//!
//! Per-page failures skip the page; storage failures abort the crawl.

pub mod frontier;
pub mod links;

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use scraper::Selector;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CrawlSettings;
use crate::document::Document;
use crate::fetch::{FetchError, FetchedPage, PageFetcher};
use crate::storage::{Checkpoint, CheckpointStore, PageStore, StorageError};

pub use frontier::Frontier;
pub use links::extract_article_links;

/// Errors that stop a crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    #[error("Invalid selector {name}: {css}")]
    InvalidSelector { name: &'static str, css: String },
}

/// Everything the crawler knows about its progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlState {
    /// Identifiers fetched, skipped, or selected for fetching. Never shrinks.
    pub visited: HashSet<String>,

    /// Pages successfully stored
    pub collected: usize,

    pub frontier: Frontier,

    /// The page to fetch next
    pub next_link: Option<String>,
}

impl CrawlState {
    /// Start from the seed with nothing visited.
    pub fn fresh(seed: impl Into<String>) -> Self {
        Self {
            next_link: Some(seed.into()),
            ..Default::default()
        }
    }

    pub fn from_checkpoint(checkpoint: Checkpoint) -> Self {
        Self {
            visited: checkpoint.visited.into_iter().collect(),
            collected: checkpoint.collected,
            frontier: Frontier::from_entries(checkpoint.frontier),
            next_link: checkpoint.next_link,
        }
    }

    pub fn to_checkpoint(&self) -> Checkpoint {
        let mut visited: Vec<String> = self.visited.iter().cloned().collect();
        visited.sort();

        Checkpoint {
            visited,
            collected: self.collected,
            frontier: self.frontier.iter().cloned().collect(),
            next_link: self.next_link.clone(),
            saved_at: Utc::now(),
        }
    }

    /// Pick the next unvisited frontier entry as the fetch target.
    fn advance(&mut self) {
        self.next_link = self.frontier.select_next(&mut self.visited);
    }
}

/// Why a crawl ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Collected the configured number of pages
    MaxPages,
    /// Nothing left to visit
    Exhausted,
}

/// Result of a crawl run.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub state: CrawlState,
    pub stop: StopReason,
    /// Pages skipped in this run (non-200, transport or URL errors)
    pub skipped: usize,
    /// Whether the run started from a checkpoint
    pub resumed: bool,
}

/// Crawl tuning, resolved from [`CrawlSettings`].
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub max_pages: usize,
    pub article_prefix: String,
    pub content_selector: Selector,
    pub title_selector: Selector,
    pub checkpoint_every: usize,
    pub frontier_limit: usize,
    pub politeness: (Duration, Duration),
    pub rate_limit_delay: Duration,
    pub max_rate_limit_retries: Option<u32>,
}

impl CrawlOptions {
    pub fn from_settings(settings: &CrawlSettings) -> Result<Self, CrawlError> {
        let parse = |name: &'static str, css: &str| {
            Selector::parse(css).map_err(|_| CrawlError::InvalidSelector {
                name,
                css: css.to_string(),
            })
        };

        Ok(Self {
            max_pages: settings.max_pages,
            article_prefix: settings.article_prefix.clone(),
            content_selector: parse("content_selector", &settings.content_selector)?,
            title_selector: parse("title_selector", &settings.title_selector)?,
            checkpoint_every: settings.checkpoint_every.max(1),
            frontier_limit: settings.frontier_limit,
            politeness: settings.politeness_range(),
            rate_limit_delay: settings.rate_limit_delay(),
            max_rate_limit_retries: settings.max_rate_limit_retries,
        })
    }
}

/// Split a seed into the base URL identifiers are resolved against and the
/// seed's own identifier.
///
/// A full URL supplies its own origin; a path (`/wiki/Foo`) uses `base_url`.
pub fn resolve_seed(seed: &str, base_url: &str) -> Result<(Url, String), CrawlError> {
    if let Ok(url) = Url::parse(seed) {
        if url.host_str().is_none() {
            return Err(CrawlError::InvalidSeed(seed.to_string()));
        }

        let mut id = url.path().to_string();
        if let Some(query) = url.query() {
            id.push('?');
            id.push_str(query);
        }

        let mut base = url;
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);
        return Ok((base, id));
    }

    if !seed.starts_with('/') {
        return Err(CrawlError::InvalidSeed(seed.to_string()));
    }

    let base = Url::parse(base_url).map_err(|e| CrawlError::InvalidSeed(format!("{}: {}", base_url, e)))?;
    Ok((base, seed.to_string()))
}

/// Drives one crawl session.
pub struct CrawlController<F> {
    fetcher: F,
    options: CrawlOptions,
    base_url: Url,
    pages: PageStore,
    checkpoints: CheckpointStore,
}

impl<F: PageFetcher> CrawlController<F> {
    pub fn new(
        fetcher: F,
        options: CrawlOptions,
        base_url: Url,
        pages: PageStore,
        checkpoints: CheckpointStore,
    ) -> Self {
        Self {
            fetcher,
            options,
            base_url,
            pages,
            checkpoints,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Resume from the checkpoint if one exists, else start from `seed`.
    pub fn initial_state(&self, seed: &str) -> Result<(CrawlState, bool), CrawlError> {
        match self.checkpoints.load()? {
            Some(checkpoint) => {
                info!(
                    "Resuming from checkpoint: {} pages collected",
                    checkpoint.collected
                );
                Ok((CrawlState::from_checkpoint(checkpoint), true))
            }
            None => {
                info!("Starting fresh crawl from {}", seed);
                Ok((CrawlState::fresh(seed), false))
            }
        }
    }

    /// Crawl until `max_pages` pages are stored or the frontier runs dry.
    pub async fn run(&self, seed: &str) -> Result<CrawlReport, CrawlError> {
        let (mut state, resumed) = self.initial_state(seed)?;
        let mut skipped = 0;

        let stop = loop {
            if state.collected >= self.options.max_pages {
                break StopReason::MaxPages;
            }
            let Some(target) = state.next_link.clone() else {
                info!("All links have been visited");
                break StopReason::Exhausted;
            };

            let recorded = match self.fetch_target(&target).await {
                Ok(page) => {
                    self.record(&mut state, &target, &page)?;
                    true
                }
                Err(e) => {
                    warn!("Skipping {}: {}", target, e);
                    state.visited.insert(target);
                    skipped += 1;
                    false
                }
            };

            state.advance();
            if let Some(next) = &state.next_link {
                debug!("Next link: {}", next);
            }

            if recorded && state.collected % self.options.checkpoint_every == 0 {
                self.checkpoints.save(&state.to_checkpoint())?;
            }

            if state.next_link.is_some() && state.collected < self.options.max_pages {
                self.politeness_pause().await;
            }
        };

        info!(
            "Crawl finished: {} pages collected, {} skipped ({:?})",
            state.collected, skipped, stop
        );

        Ok(CrawlReport {
            state,
            stop,
            skipped,
            resumed,
        })
    }

    /// GET the target, waiting and retrying while the server rate-limits.
    async fn fetch_target(&self, target: &str) -> Result<FetchedPage, FetchError> {
        let url = self
            .base_url
            .join(target)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", target, e)))?;

        let mut rate_limited = 0u32;
        loop {
            match self.fetcher.fetch(&url).await {
                Err(FetchError::RateLimited {
                    host,
                    retry_after_secs,
                }) => {
                    rate_limited += 1;
                    if self
                        .options
                        .max_rate_limit_retries
                        .is_some_and(|max| rate_limited > max)
                    {
                        return Err(FetchError::RateLimited {
                            host,
                            retry_after_secs,
                        });
                    }

                    info!(
                        "Too many requests to {}. Waiting {:?} before retrying {}",
                        host, self.options.rate_limit_delay, target
                    );
                    tokio::time::sleep(self.options.rate_limit_delay).await;
                }
                other => return other,
            }
        }
    }

    /// Store a fetched page and queue its links.
    fn record(
        &self,
        state: &mut CrawlState,
        target: &str,
        page: &FetchedPage,
    ) -> Result<(), StorageError> {
        let doc = Document::parse(&page.body);

        let title = doc
            .title(&self.options.title_selector)
            .unwrap_or_else(|| format!("pagina_{}", state.collected));
        self.pages.save(&title, &page.body)?;

        state.visited.insert(target.to_string());
        state.collected += 1;
        info!("Pages collected: {}", state.collected);

        let links = extract_article_links(
            &doc,
            &self.options.article_prefix,
            &self.options.content_selector,
        );
        let added = state
            .frontier
            .extend(links, &state.visited, self.options.frontier_limit);
        info!(
            "Frontier: {} pending ({} new from {})",
            state.frontier.len(),
            added,
            target
        );

        Ok(())
    }

    async fn politeness_pause(&self) {
        let (min, max) = self.options.politeness;
        let delay = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };

        if !delay.is_zero() {
            debug!("Waiting {:?} before next request", delay);
            tokio::time::sleep(delay).await;
        }
    }
}
