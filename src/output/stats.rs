//! Statistics of one crawl session
//!
//! The crawl loop updates a [`CrawlStats`] as it goes; the binary prints it
//! once the crawl and the compile step are done.

use chrono::{DateTime, Utc};

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Pages fetched successfully, not-found pages included
    pub pages_fetched: u64,

    /// Artifacts written
    pub pages_written: u64,

    /// Pages skipped as not-found
    pub not_found: u64,

    /// Pages skipped because no selector matched
    pub selector_failures: u64,

    /// Pages that could not be fetched
    pub fetch_failures: u64,

    /// Artifacts that could not be written
    pub write_failures: u64,

    /// Selectors learned from the oracle this session
    pub selectors_learned: u64,

    /// Discovered links that entered the frontier
    pub links_queued: u64,

    /// URLs still queued when the crawl stopped
    pub frontier_remaining: usize,
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlStats {
    /// Starts a new statistics record stamped with the current time
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            pages_fetched: 0,
            pages_written: 0,
            not_found: 0,
            selector_failures: 0,
            fetch_failures: 0,
            write_failures: 0,
            selectors_learned: 0,
            links_queued: 0,
            frontier_remaining: 0,
        }
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Duration of the crawl in seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Pages skipped for any reason
    pub fn pages_skipped(&self) -> u64 {
        self.not_found + self.selector_failures + self.fetch_failures + self.write_failures
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Started: {}", stats.started_at.to_rfc3339());
    if let Some(finished) = stats.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(duration) = stats.duration_seconds() {
        println!("  Duration: {}s", duration);
    }
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Artifacts written: {}", stats.pages_written);
    println!("  Selectors learned: {}", stats.selectors_learned);
    println!("  Links queued: {}", stats.links_queued);
    println!();

    if stats.pages_skipped() > 0 {
        println!("Skipped Pages:");
        println!("  Not found: {}", stats.not_found);
        println!("  No content selector: {}", stats.selector_failures);
        println!("  Fetch failed: {}", stats.fetch_failures);
        println!("  Write failed: {}", stats.write_failures);
        println!();
    }

    if stats.frontier_remaining > 0 {
        println!("URLs left in frontier: {}", stats.frontier_remaining);
        println!();
    }

    let attempted = stats.pages_fetched + stats.fetch_failures;
    let success_rate = if attempted > 0 {
        (stats.pages_written as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages written)",
        success_rate, stats.pages_written, attempted
    );
}
