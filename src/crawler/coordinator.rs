//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the other parts together:
//! - Popping URLs from the frontier in FIFO order
//! - Fetching pages and skipping not-found ones
//! - Resolving the main-content selector and writing the artifact
//! - Admitting discovered links into the frontier
//! - Pacing between fetches

use crate::crawler::fetcher::{FetchedPage, PageFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::pacing::Pacer;
use crate::crawler::parser::parse_document;
use crate::output::{content_to_markdown, ArtifactWriter, CrawlStats};
use crate::selector::{SelectorCache, SelectorOracle, SelectorResolver, SelectorSource};
use crate::url::is_admissible;
use crate::DocsError;
use scraper::Html;
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

/// Per-session crawl switches taken from the command line
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Marker after which converted Markdown is dropped
    pub ignore_after: Option<String>,

    /// Use the slow pacing range
    pub slow: bool,

    /// Visible browser, a pause after the first page, and a single oracle
    /// attempt per page
    pub debug: bool,
}

/// What happened to one fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page is a not-found page; nothing was written or discovered
    NotFound,

    /// No selector matched, not even one from the oracle
    NoSelector,

    /// The artifact was written
    Written {
        learned_selector: bool,
        links_admitted: usize,
    },

    /// Converting or writing the artifact failed; links were still
    /// discovered
    WriteFailed { links_admitted: usize },
}

/// Sequential breadth-first crawler
///
/// Generic over the page fetcher and the selector oracle so either can be
/// replaced (a rendering browser, a fake in tests).
pub struct Crawler<F, O> {
    fetcher: F,
    resolver: SelectorResolver<O>,
    writer: ArtifactWriter,
    pacer: Pacer,
    options: CrawlOptions,
    cache: SelectorCache,
    paused: bool,
}

impl<F: PageFetcher, O: SelectorOracle> Crawler<F, O> {
    /// Creates a crawler whose selector cache starts with the built-ins
    pub fn new(
        fetcher: F,
        resolver: SelectorResolver<O>,
        writer: ArtifactWriter,
        pacer: Pacer,
        options: CrawlOptions,
    ) -> Self {
        Self::with_cache(fetcher, resolver, writer, pacer, options, SelectorCache::new())
    }

    /// Creates a crawler that starts from an explicit selector cache
    pub fn with_cache(
        fetcher: F,
        resolver: SelectorResolver<O>,
        writer: ArtifactWriter,
        pacer: Pacer,
        options: CrawlOptions,
        cache: SelectorCache,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            writer,
            pacer,
            options,
            cache,
            paused: false,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn resolver(&self) -> &SelectorResolver<O> {
        &self.resolver
    }

    /// The session's selectors, built-ins first
    pub fn selector_cache(&self) -> &SelectorCache {
        &self.cache
    }

    pub fn writer(&self) -> &ArtifactWriter {
        &self.writer
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Crawls everything reachable from `root` that stays under it
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStats)` - The frontier drained
    /// * `Err(DocsError)` - The root itself could not be fetched
    pub async fn run(&mut self, root: &Url) -> Result<CrawlStats, DocsError> {
        tracing::info!("Starting crawl at {}", root);

        let mut frontier = Frontier::new(root.clone());
        let mut stats = CrawlStats::new();

        self.drain(&mut frontier, root, &mut stats).await?;

        stats.frontier_remaining = frontier.len();
        stats.finish();

        tracing::info!(
            "Crawl completed: {} pages fetched, {} artifacts written, {} skipped",
            stats.pages_fetched,
            stats.pages_written,
            stats.pages_skipped()
        );

        Ok(stats)
    }

    /// Processes URLs until `frontier` is empty
    pub async fn drain(
        &mut self,
        frontier: &mut Frontier,
        root: &Url,
        stats: &mut CrawlStats,
    ) -> Result<(), DocsError> {
        while let Some(url) = frontier.next_url() {
            tracing::info!("Scraping {}", url);

            match self.fetcher.fetch(&url).await {
                Ok(page) => {
                    stats.pages_fetched += 1;

                    if self.options.debug && !self.paused {
                        self.paused = true;
                        pause_for_inspection(&url).await;
                    }

                    let outcome = self.process_page(&url, &page, frontier, root).await;
                    record_outcome(stats, &outcome);
                }
                Err(e) if url == *root => {
                    return Err(DocsError::StartUnreachable {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch {}: {}", url, e);
                    stats.fetch_failures += 1;
                }
            }

            if !frontier.is_empty() {
                self.pacer.delay(self.options.slow).await;
            }

            if frontier.visited_count() % 10 == 0 {
                tracing::info!(
                    "Progress: {} pages visited, {} in frontier",
                    frontier.visited_count(),
                    frontier.len()
                );
            }
        }

        tracing::info!("Frontier is empty, crawl complete");
        Ok(())
    }

    /// Extracts, writes and mines one fetched page
    async fn process_page(
        &mut self,
        url: &Url,
        page: &FetchedPage,
        frontier: &mut Frontier,
        root: &Url,
    ) -> PageOutcome {
        if page.is_not_found() {
            tracing::info!(
                "Page not found: {} (status {}, title {:?})",
                url,
                page.status_code,
                page.title
            );
            return PageOutcome::NotFound;
        }

        let document = Html::parse_document(&page.html);

        let Some(resolved) = self
            .resolver
            .resolve(&mut self.cache, url, &document)
            .await
        else {
            tracing::warn!("No valid selector found for {}, skipping", url);
            return PageOutcome::NoSelector;
        };

        let written = match content_to_markdown(
            &document,
            &resolved.selector,
            &page.final_url,
            self.options.ignore_after.as_deref(),
        ) {
            Ok(Some(markdown)) => self.writer.write(url.as_str(), &markdown),
            Ok(None) => {
                tracing::warn!(
                    "Selector '{}' selected nothing on {}, skipping",
                    resolved.selector,
                    url
                );
                return PageOutcome::NoSelector;
            }
            Err(e) => Err(e),
        };

        let links_admitted = discover_links(&document, &page.final_url, frontier, root);

        match written {
            Ok(path) => {
                tracing::info!("Saved {} to {}", url, path.display());
                PageOutcome::Written {
                    learned_selector: resolved.source == SelectorSource::Oracle,
                    links_admitted,
                }
            }
            Err(e) => {
                tracing::error!("Failed to save artifact for {}: {}", url, e);
                PageOutcome::WriteFailed { links_admitted }
            }
        }
    }
}

/// Admits the page's in-scope links into the frontier
///
/// Returns the number of newly queued URLs.
fn discover_links(document: &Html, base: &Url, frontier: &mut Frontier, root: &Url) -> usize {
    let parsed = parse_document(document, base);
    let mut admitted = 0;

    for link in parsed.links {
        if !is_admissible(&link, root) {
            tracing::trace!("Link out of scope: {}", link);
            continue;
        }

        if frontier.offer(link.clone()) {
            tracing::debug!("Queued {}", link);
            admitted += 1;
        }
    }

    admitted
}

fn record_outcome(stats: &mut CrawlStats, outcome: &PageOutcome) {
    match outcome {
        PageOutcome::NotFound => stats.not_found += 1,
        PageOutcome::NoSelector => stats.selector_failures += 1,
        PageOutcome::Written {
            learned_selector,
            links_admitted,
        } => {
            stats.pages_written += 1;
            stats.links_queued += *links_admitted as u64;
            if *learned_selector {
                stats.selectors_learned += 1;
            }
        }
        PageOutcome::WriteFailed { links_admitted } => {
            stats.write_failures += 1;
            stats.links_queued += *links_admitted as u64;
        }
    }
}

/// Blocks until the operator presses Enter
async fn pause_for_inspection(url: &Url) {
    tracing::info!(
        "Debug mode: fetched {}. Inspect it, then press Enter to continue",
        url
    );

    let mut line = String::new();
    let mut stdin = BufReader::new(tokio::io::stdin());
    if let Err(e) = stdin.read_line(&mut line).await {
        tracing::warn!("Could not read from stdin, continuing: {}", e);
    }
}
