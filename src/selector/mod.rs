//! Main-content selector resolution
//!
//! This module decides which sub-tree of a rendered page is its main
//! content:
//! - A session-scoped [`SelectorCache`] of candidate selectors, seeded with
//!   the built-ins and extended with oracle answers
//! - The non-empty match rule every candidate is tested with
//! - [`SelectorResolver`], which falls back to a [`SelectorOracle`] with a
//!   bounded [`RetryPolicy`]

mod oracle;

pub use oracle::{
    clean_selector, OpenAiOracle, OracleError, OracleRequest, PromptBudget, RetryPolicy,
    SelectorOracle,
};

use scraper::{Html, Selector};
use url::Url;

/// Built-in candidates, highest priority first
pub const BUILTIN_SELECTORS: &[&str] = &[
    "main",
    "article",
    "div#content",
    "div.content",
    "div.main-content",
    "div.post",
    "section.content",
    "section.main-content",
    "section.post",
    "#markdown-page",
];

/// Ordered candidate selectors for one crawl session
///
/// Starts with [`BUILTIN_SELECTORS`]; selectors learned from the oracle are
/// appended so later pages of the same site match them statically.
#[derive(Debug, Clone)]
pub struct SelectorCache {
    candidates: Vec<String>,
}

impl Default for SelectorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectorCache {
    /// Creates a cache holding the built-in candidates
    pub fn new() -> Self {
        Self::with_candidates(BUILTIN_SELECTORS.iter().map(|s| s.to_string()).collect())
    }

    /// Creates a cache from an explicit candidate list
    pub fn with_candidates(candidates: Vec<String>) -> Self {
        Self { candidates }
    }

    /// Candidates in priority order
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.candidates.iter().any(|c| c == selector)
    }

    /// Appends a selector unless already present
    ///
    /// Returns true if the selector was added.
    pub fn learn(&mut self, selector: &str) -> bool {
        if self.contains(selector) {
            return false;
        }
        self.candidates.push(selector.to_string());
        true
    }

    /// The first candidate that matches `document`
    pub fn first_match(&self, document: &Html) -> Option<&str> {
        self.candidates
            .iter()
            .map(String::as_str)
            .find(|candidate| matches_non_empty(document, candidate))
    }
}

/// Tests a selector with the non-empty match rule
///
/// The selector matches when it parses, selects at least one element, and
/// every selected element has non-empty trimmed text.
pub fn matches_non_empty(document: &Html, selector: &str) -> bool {
    let Ok(parsed) = Selector::parse(selector) else {
        tracing::trace!("Selector '{}' does not parse", selector);
        return false;
    };

    let mut matched = false;
    for element in document.select(&parsed) {
        if element.text().all(|text| text.trim().is_empty()) {
            return false;
        }
        matched = true;
    }

    matched
}

/// Where a resolved selector came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorSource {
    /// A built-in or previously learned candidate
    Cache,
    /// A fresh, validated oracle answer
    Oracle,
}

/// A selector that matched the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelector {
    pub selector: String,
    pub source: SelectorSource,
}

/// Resolves main-content selectors, asking the oracle when the cache fails
pub struct SelectorResolver<O> {
    oracle: O,
    policy: RetryPolicy,
    budget: PromptBudget,
}

impl<O: SelectorOracle> SelectorResolver<O> {
    pub fn new(oracle: O, policy: RetryPolicy, budget: PromptBudget) -> Self {
        Self {
            oracle,
            policy,
            budget,
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Replaces the retry policy (debug mode uses a single attempt)
    pub fn set_policy(&mut self, policy: RetryPolicy) {
        self.policy = policy;
    }

    /// Determines the main-content selector of a page
    ///
    /// Candidates are tried in cache order and the first match wins. When
    /// none matches the oracle is consulted, and a validated answer is
    /// appended to `cache` before being returned.
    ///
    /// # Returns
    ///
    /// * `Some(ResolvedSelector)` - A selector that matches non-empty content
    /// * `None` - Neither the cache nor the oracle produced one
    pub async fn resolve(
        &self,
        cache: &mut SelectorCache,
        url: &Url,
        document: &Html,
    ) -> Option<ResolvedSelector> {
        if let Some(selector) = cache.first_match(document) {
            tracing::debug!("Selector '{}' matched {}", selector, url);
            return Some(ResolvedSelector {
                selector: selector.to_string(),
                source: SelectorSource::Cache,
            });
        }

        tracing::debug!(
            "No cached selector matched {}, falling back to the oracle",
            url
        );

        let selector = self.oracle_resolve(url, document).await?;
        cache.learn(&selector);

        Some(ResolvedSelector {
            selector,
            source: SelectorSource::Oracle,
        })
    }

    /// Asks the oracle for a selector, retrying per the policy
    ///
    /// Every attempt counts: transport errors, HTTP errors, empty answers
    /// and answers that fail the non-empty match rule. Between attempts the
    /// current delay is slept and then multiplied by the decay factor.
    /// Errors that cannot succeed on retry end the loop at once.
    pub async fn oracle_resolve(&self, url: &Url, document: &Html) -> Option<String> {
        let request = OracleRequest::new(url.as_str(), &document.html(), &self.budget);
        if let Some(original) = request.truncated_from {
            tracing::debug!(
                "DOM of {} truncated from {} to {} characters for the oracle",
                url,
                original,
                request.dom.chars().count()
            );
        }

        let max_attempts = self.policy.max_attempts;
        let mut delay = self.policy.base_delay;

        for attempt in 1..=max_attempts {
            match self.oracle.suggest_selector(&request).await {
                Ok(Some(answer)) => {
                    let selector = clean_selector(&answer);
                    if matches_non_empty(document, &selector) {
                        tracing::info!("Generated selector '{}' for URL: {}", selector, url);
                        return Some(selector);
                    }
                    tracing::warn!(
                        "Oracle selector '{}' matched no content on {} (attempt {}/{})",
                        selector,
                        url,
                        attempt,
                        max_attempts
                    );
                }
                Ok(None) => {
                    tracing::warn!(
                        "Oracle gave no selector for {} (attempt {}/{})",
                        url,
                        attempt,
                        max_attempts
                    );
                }
                Err(e) if !e.is_retryable() => {
                    tracing::warn!("Oracle unavailable for {}: {}", url, e);
                    return None;
                }
                Err(e) => {
                    tracing::warn!(
                        "Oracle request failed for {} (attempt {}/{}): {}",
                        url,
                        attempt,
                        max_attempts,
                        e
                    );
                }
            }

            if attempt < max_attempts {
                // The delay shrinks with every retry
                tracing::debug!("Retrying oracle in {:?}", delay);
                tokio::time::sleep(delay).await;
                delay = self.policy.next_delay(delay);
            }
        }

        None
    }
}
