//! Crawl frontier: FIFO work queue plus the visited set
//!
//! A URL enters the queue at most once. Admission checks both the visited
//! set and the set of URLs currently waiting, so a page linked from many
//! places is still fetched once.

use std::collections::{HashSet, VecDeque};
use url::Url;

/// Frontier manages the queue of URLs to crawl
pub struct Frontier {
    /// URLs waiting to be fetched, in discovery order
    queue: VecDeque<Url>,

    /// Serialized URLs currently in `queue`
    queued: HashSet<String>,

    /// Serialized URLs already popped for processing
    visited: HashSet<String>,
}

impl Frontier {
    /// Creates a frontier seeded with the crawl root
    pub fn new(root: Url) -> Self {
        let mut frontier = Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
        };
        frontier.offer(root);
        frontier
    }

    /// Pops the next unvisited URL and marks it visited
    ///
    /// # Returns
    ///
    /// * `Some(Url)` - The next URL to process
    /// * `None` - The frontier is drained
    pub fn next_url(&mut self) -> Option<Url> {
        while let Some(url) = self.queue.pop_front() {
            self.queued.remove(url.as_str());

            if self.visited.contains(url.as_str()) {
                tracing::trace!("Skipping already visited URL: {}", url);
                continue;
            }

            self.visited.insert(url.as_str().to_string());
            return Some(url);
        }

        None
    }

    /// Adds a URL to the back of the queue if it was never seen
    ///
    /// Returns true if the URL was enqueued.
    pub fn offer(&mut self, url: Url) -> bool {
        if self.visited.contains(url.as_str()) || self.queued.contains(url.as_str()) {
            return false;
        }

        self.queued.insert(url.as_str().to_string());
        self.queue.push_back(url);
        true
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    pub fn is_queued(&self, url: &Url) -> bool {
        self.queued.contains(url.as_str())
    }

    /// Returns the number of URLs waiting in the queue
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of URLs popped so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
