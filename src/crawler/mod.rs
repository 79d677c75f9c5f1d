//! Crawler module for page fetching and crawl coordination
//!
//! This module contains the core crawling logic, including:
//! - The FIFO frontier with duplicate suppression
//! - Page fetching (plain HTTP, or Chrome with the `browser` feature) and
//!   link extraction
//! - Randomized pacing between fetches
//! - Overall crawl coordination

#[cfg(feature = "browser")]
mod browser;
mod coordinator;
mod fetcher;
mod frontier;
mod pacing;
mod parser;

#[cfg(feature = "browser")]
pub use browser::{launch_options, BrowserFetcher};
pub use coordinator::{CrawlOptions, Crawler, PageOutcome};
pub use fetcher::{
    build_http_client, is_not_found_title, rendered_page, FetchError, FetchedPage, HttpFetcher,
    PageFetcher,
};
pub use frontier::Frontier;
pub use pacing::Pacer;
pub use parser::{extract_title, parse_document, parse_html, ParsedPage};

use crate::config::{Config, Renderer};
use crate::output::{compile, ArtifactWriter, CompileReport, CrawlStats, SiteLayout};
use crate::selector::{OpenAiOracle, PromptBudget, RetryPolicy, SelectorResolver};
use std::path::Path;
use url::Url;

/// Runs a complete crawl operation
///
/// This is the main entry point for a crawl. It will:
/// 1. Build the page fetcher (per `config.fetcher.renderer`) and the
///    selector oracle
/// 2. Crawl breadth-first from `root`, writing one artifact per page
/// 3. Compile the artifacts into the root's compiled document
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `root` - The crawl root
/// * `options` - Command-line switches
///
/// # Returns
///
/// * `Ok((CrawlStats, CompileReport))` - Crawl and compile completed
/// * `Err(DocsError)` - A fatal setup error, or the root could not be fetched
///
/// # Example
///
/// ```no_run
/// use docs_to_markdown::config::Config;
/// use docs_to_markdown::crawler::{run_crawl, CrawlOptions};
/// use docs_to_markdown::url::parse_start_url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let root = parse_start_url("https://example.com/docs")?;
/// let (stats, report) = run_crawl(&Config::default(), &root, CrawlOptions::default()).await?;
/// println!("{} pages, compiled to {}", stats.pages_written, report.output_path.display());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    root: &Url,
    options: CrawlOptions,
) -> crate::Result<(CrawlStats, CompileReport)> {
    match config.fetcher.renderer {
        Renderer::Browser => crawl_rendered(config, root, options).await,
        Renderer::Http => crawl_with(HttpFetcher::new(&config.fetcher)?, config, root, options).await,
    }
}

#[cfg(feature = "browser")]
async fn crawl_rendered(
    config: &Config,
    root: &Url,
    options: CrawlOptions,
) -> crate::Result<(CrawlStats, CompileReport)> {
    // Debug mode shows the browser window
    let fetcher = BrowserFetcher::launch(&config.fetcher, !options.debug)?;
    crawl_with(fetcher, config, root, options).await
}

#[cfg(not(feature = "browser"))]
async fn crawl_rendered(
    config: &Config,
    root: &Url,
    options: CrawlOptions,
) -> crate::Result<(CrawlStats, CompileReport)> {
    tracing::warn!("Built without the `browser` feature, fetching pages over plain HTTP");
    crawl_with(HttpFetcher::new(&config.fetcher)?, config, root, options).await
}

async fn crawl_with<F: PageFetcher>(
    fetcher: F,
    config: &Config,
    root: &Url,
    options: CrawlOptions,
) -> crate::Result<(CrawlStats, CompileReport)> {
    let oracle = OpenAiOracle::new(&config.oracle)?;
    if oracle.has_api_key() {
        tracing::debug!("Selector oracle uses model {}", oracle.model());
    } else {
        tracing::warn!(
            "No oracle API key configured; pages without a known content selector will be skipped"
        );
    }

    let policy = if options.debug {
        RetryPolicy::single_attempt()
    } else {
        RetryPolicy::from_config(&config.oracle)
    };
    let resolver = SelectorResolver::new(oracle, policy, PromptBudget::from_config(&config.oracle));

    let output_dir = Path::new(&config.output.directory);
    let mut crawler = Crawler::new(
        fetcher,
        resolver,
        ArtifactWriter::new(output_dir),
        Pacer::new(&config.pacing),
        options,
    );

    let stats = crawler.run(root).await?;
    let report = compile_root(output_dir, root)?;

    Ok((stats, report))
}

/// Compiles already written artifacts of `root` without crawling
pub fn run_compile_only(config: &Config, root: &Url) -> crate::Result<CompileReport> {
    compile_root(Path::new(&config.output.directory), root)
}

fn compile_root(output_dir: &Path, root: &Url) -> crate::Result<CompileReport> {
    let layout = SiteLayout::for_root(output_dir, root.as_str());
    tracing::info!(
        "Compiling artifacts under {} into {}",
        layout.base_dir.display(),
        layout.compiled_path.display()
    );

    Ok(compile(&layout.base_dir, &layout.compiled_path)?)
}
