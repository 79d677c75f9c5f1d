//! docs-to-markdown main entry point
//!
//! This is the command-line interface for the docs-to-markdown crawler.

use anyhow::Context;
use clap::Parser;
use docs_to_markdown::config::{resolve_config, Config};
use docs_to_markdown::crawler::{run_compile_only, run_crawl, CrawlOptions};
use docs_to_markdown::output::print_statistics;
use docs_to_markdown::url::parse_start_url;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// docs-to-markdown: turn a documentation site into one Markdown file
///
/// Crawls every page under the start URL, extracts the main content of
/// each page, saves it as Markdown and compiles the pages into a single
/// document.
#[derive(Parser, Debug)]
#[command(name = "docs-to-markdown")]
#[command(version)]
#[command(about = "Crawl a documentation site into Markdown", long_about = None)]
struct Cli {
    /// Crawl root; only pages under this URL are followed
    #[arg(long, value_name = "URL")]
    start: String,

    /// Drop converted Markdown from the first occurrence of this text on
    #[arg(long = "ignore_after", value_name = "TEXT")]
    ignore_after: Option<String>,

    /// Show the browser window, pause after the first page and ask the
    /// oracle only once per page
    #[arg(long)]
    debug: bool,

    /// Wait 20-35 seconds between pages instead of 1-5
    #[arg(long)]
    slow: bool,

    /// Compile previously downloaded pages and exit without crawling
    #[arg(long = "compile-only")]
    compile_only: bool,

    /// Path to TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Debug mode raises the default level by one step
    let verbose = if cli.debug {
        cli.verbose.max(1)
    } else {
        cli.verbose
    };
    setup_logging(verbose, cli.quiet);

    // Load and validate configuration
    let (config, config_hash) = match resolve_config(cli.config.as_deref()) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    match (&cli.config, &config_hash) {
        (Some(path), Some(hash)) => tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        ),
        _ => tracing::info!("Using default configuration"),
    }

    let root = parse_start_url(&cli.start)
        .with_context(|| format!("Invalid start URL: {}", cli.start))?;

    if cli.compile_only {
        handle_compile_only(&config, &root)?;
    } else {
        let options = CrawlOptions {
            ignore_after: cli.ignore_after.filter(|marker| !marker.is_empty()),
            slow: cli.slow,
            debug: cli.debug,
        };
        handle_crawl(&config, &root, options).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docs_to_markdown=info,warn"),
            1 => EnvFilter::new("docs_to_markdown=debug,info"),
            2 => EnvFilter::new("docs_to_markdown=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --compile-only mode: compiles existing artifacts
fn handle_compile_only(config: &Config, root: &url::Url) -> anyhow::Result<()> {
    let report = run_compile_only(config, root).context("Failed to compile artifacts")?;

    println!(
        "✓ Compiled {} pages into {}",
        report.artifacts.len(),
        report.output_path.display()
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, root: &url::Url, options: CrawlOptions) -> anyhow::Result<()> {
    if options.slow {
        tracing::info!(
            "Slow mode: waiting {}-{} seconds between pages",
            config.pacing.slow_min_delay_secs,
            config.pacing.slow_max_delay_secs
        );
    }

    let (stats, report) = match run_crawl(config, root, options).await {
        Ok(result) => {
            tracing::info!("Crawl completed successfully");
            result
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e).context(format!("Crawl of {} failed", root));
        }
    };

    print_statistics(&stats);
    println!(
        "\n✓ Compiled {} pages into {}",
        report.artifacts.len(),
        report.output_path.display()
    );

    Ok(())
}
