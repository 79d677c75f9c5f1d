//! Selector oracle client and retry policy
//!
//! The oracle is a remote text-classification call: it receives the
//! serialized DOM of a page and answers with a CSS selector for the page's
//! main content. The shipped implementation talks to an OpenAI-compatible
//! `/chat/completions` endpoint.

use crate::config::OracleConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// System message sent with every oracle request
const SYSTEM_PROMPT: &str = "You are a web scraping assistant inside an automated pipeline. \
Given the DOM of a web page, you identify the CSS selector of its main content.";

/// Instruction sent after the DOM
const SELECTOR_INSTRUCTION: &str = "Analyze the DOM above and return the CSS selector for the \
main content body. Exclude headers, footers, navigation bars, sidebars and other UI elements; \
select only the main article or content. Return ONLY the CSS selector and nothing else: your \
answer is consumed by a program.";

/// Errors that can occur while asking the oracle
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Oracle transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Oracle API key is not configured")]
    MissingApiKey,

    #[error("Invalid oracle configuration: {0}")]
    InvalidConfig(String),
}

impl OracleError {
    /// Returns true if asking again may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::MissingApiKey | Self::InvalidConfig(_))
    }
}

/// What the oracle is asked about
#[derive(Debug, Clone)]
pub struct OracleRequest {
    /// The page URL (for logging and context)
    pub url: String,

    /// Serialized DOM, already bounded by a [`PromptBudget`]
    pub dom: String,

    /// Length of the DOM in characters before truncation, if it was truncated
    pub truncated_from: Option<usize>,
}

impl OracleRequest {
    /// Builds a request, bounding `dom` with `budget`
    pub fn new(url: impl Into<String>, dom: &str, budget: &PromptBudget) -> Self {
        let (dom, truncated_from) = budget.bound(dom);
        Self {
            url: url.into(),
            dom,
            truncated_from,
        }
    }

    /// The DOM as sent to the oracle, annotated when truncated
    pub fn dom_message(&self) -> String {
        match self.truncated_from {
            Some(original) => format!(
                "{}\n\n[Note: the DOM was truncated to its first {} of {} characters to fit the request size limit.]",
                self.dom,
                self.dom.chars().count(),
                original
            ),
            None => self.dom.clone(),
        }
    }
}

/// A remote capability that infers a main-content selector from a DOM
///
/// `Ok(None)` means the oracle answered but gave no selector; transport
/// and HTTP failures are reported as [`OracleError`].
#[allow(async_fn_in_trait)]
pub trait SelectorOracle {
    async fn suggest_selector(&self, request: &OracleRequest)
        -> Result<Option<String>, OracleError>;
}

/// Bounded retry with a multiplicative delay change between attempts
///
/// With the defaults (5 attempts, 30 s, factor 0.5) the delays between
/// attempts are 30, 15, 7.5 and 3.75 seconds: the delay shrinks.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub decay_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(30),
            decay_factor: 0.5,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries once and never sleeps
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            decay_factor: 1.0,
        }
    }

    /// Builds the policy from oracle configuration
    pub fn from_config(config: &OracleConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_secs_f64(config.base_delay_secs),
            decay_factor: config.decay_factor,
        }
    }

    /// The delay that follows `delay`
    pub fn next_delay(&self, delay: Duration) -> Duration {
        delay.mul_f64(self.decay_factor)
    }

    /// Delays slept between consecutive attempts, in order
    pub fn delays(&self) -> Vec<Duration> {
        let count = self.max_attempts.saturating_sub(1) as usize;
        std::iter::successors(Some(self.base_delay), |d| Some(self.next_delay(*d)))
            .take(count)
            .collect()
    }
}

/// Size limit for the DOM sent to the oracle
#[derive(Debug, Clone, PartialEq)]
pub struct PromptBudget {
    /// Maximum DOM length in characters
    pub max_chars: usize,

    /// Factor applied repeatedly to the length until it fits
    pub shrink_ratio: f64,
}

impl Default for PromptBudget {
    fn default() -> Self {
        Self {
            max_chars: 48_000,
            shrink_ratio: 0.8,
        }
    }
}

impl PromptBudget {
    /// Builds the budget from oracle configuration
    pub fn from_config(config: &OracleConfig) -> Self {
        Self {
            max_chars: config.max_prompt_chars,
            shrink_ratio: config.shrink_ratio,
        }
    }

    /// Shrinks `dom` by `shrink_ratio` until it is at most `max_chars` long
    ///
    /// Returns the bounded text and, when it was cut, the original length
    /// in characters. Cuts always fall on a character boundary.
    pub fn bound(&self, dom: &str) -> (String, Option<usize>) {
        let original = dom.chars().count();
        if original <= self.max_chars {
            return (dom.to_string(), None);
        }

        let mut target = original;
        while target > self.max_chars {
            let shrunk = (target as f64 * self.shrink_ratio) as usize;
            // A ratio close to 1 must still make progress
            target = shrunk.min(target - 1);
        }

        let end = dom
            .char_indices()
            .nth(target)
            .map(|(index, _)| index)
            .unwrap_or(dom.len());

        (dom[..end].to_string(), Some(original))
    }
}

/// Strips the decoration models like to wrap selectors in
///
/// Handles surrounding whitespace, Markdown code fences (with an optional
/// `css` tag), inline backticks and quotes.
pub fn clean_selector(raw: &str) -> String {
    let mut selector = raw.trim();

    if let Some(fenced) = selector.strip_prefix("```") {
        selector = fenced.strip_suffix("```").unwrap_or(fenced);
        selector = selector.strip_prefix("css").unwrap_or(selector);
    }

    selector
        .trim()
        .trim_matches('`')
        .trim_matches('"')
        .trim_matches('\'')
        .trim()
        .to_string()
}

/// Selector oracle backed by an OpenAI-compatible chat completions API
pub struct OpenAiOracle {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiOracle {
    /// Builds the client from configuration
    ///
    /// A missing API key is not an error here: every request then fails
    /// with [`OracleError::MissingApiKey`], which the resolver does not retry.
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .default_headers(headers)
            .build()?;

        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Whether requests can be sent at all
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The model identifier used for requests
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl SelectorOracle for OpenAiOracle {
    async fn suggest_selector(
        &self,
        request: &OracleRequest,
    ) -> Result<Option<String>, OracleError> {
        let api_key = self.api_key.as_deref().ok_or(OracleError::MissingApiKey)?;
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| OracleError::InvalidConfig("API key is not a valid header value".to_string()))?;

        let dom = request.dom_message();
        let body = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &dom,
                },
                ChatMessage {
                    role: "user",
                    content: SELECTOR_INSTRUCTION,
                },
            ],
        };

        tracing::debug!(
            "Asking oracle ({}) for a selector for {}",
            self.model,
            request.url
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| clean_selector(&content))
            .filter(|selector| !selector.is_empty());

        Ok(content)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_delays_shrink() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delays(),
            vec![
                Duration::from_secs(30),
                Duration::from_secs(15),
                Duration::from_millis(7500),
                Duration::from_millis(3750),
            ]
        );
    }

    #[test]
    fn test_single_attempt_has_no_delays() {
        assert!(RetryPolicy::single_attempt().delays().is_empty());
    }

    #[test]
    fn test_policy_from_config() {
        let config = OracleConfig {
            max_attempts: 3,
            base_delay_secs: 2.0,
            decay_factor: 0.25,
            ..OracleConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);

        assert_eq!(policy.max_attempts, 3);
        assert_eq!(
            policy.delays(),
            vec![Duration::from_secs(2), Duration::from_millis(500)]
        );
    }

    #[test]
    fn test_budget_keeps_short_dom() {
        let budget = PromptBudget {
            max_chars: 100,
            shrink_ratio: 0.5,
        };
        let (dom, truncated) = budget.bound("<main>short</main>");
        assert_eq!(dom, "<main>short</main>");
        assert_eq!(truncated, None);
    }

    #[test]
    fn test_budget_shrinks_by_ratio() {
        let budget = PromptBudget {
            max_chars: 30,
            shrink_ratio: 0.5,
        };
        let input = "x".repeat(100);
        let (dom, truncated) = budget.bound(&input);

        // 100 -> 50 -> 25
        assert_eq!(dom.len(), 25);
        assert_eq!(truncated, Some(100));
    }

    #[test]
    fn test_budget_respects_char_boundaries() {
        let budget = PromptBudget {
            max_chars: 3,
            shrink_ratio: 0.5,
        };
        let (dom, truncated) = budget.bound("ééééé");
        // 5 -> 2 characters
        assert_eq!(dom, "éé");
        assert_eq!(truncated, Some(5));
    }

    #[test]
    fn test_request_annotates_truncation() {
        let budget = PromptBudget {
            max_chars: 10,
            shrink_ratio: 0.5,
        };
        let request = OracleRequest::new("https://ex.com/docs", &"y".repeat(40), &budget);

        assert_eq!(request.truncated_from, Some(40));
        let message = request.dom_message();
        assert!(message.starts_with("yyyyyyyyyy"));
        assert!(message.contains("truncated"));
        assert!(message.contains("40"));
    }

    #[test]
    fn test_request_without_truncation_has_no_note() {
        let request = OracleRequest::new("https://ex.com", "<main>x</main>", &PromptBudget::default());
        assert_eq!(request.dom_message(), "<main>x</main>");
    }

    #[test]
    fn test_clean_selector_plain() {
        assert_eq!(clean_selector("  div.docs-content \n"), "div.docs-content");
    }

    #[test]
    fn test_clean_selector_fenced() {
        assert_eq!(clean_selector("```css\ndiv#main\n```"), "div#main");
        assert_eq!(clean_selector("```\narticle.post\n```"), "article.post");
    }

    #[test]
    fn test_clean_selector_backticks_and_quotes() {
        assert_eq!(clean_selector("`main > .content`"), "main > .content");
        assert_eq!(clean_selector("\"#page\""), "#page");
    }

    #[test]
    fn test_missing_api_key_not_retryable() {
        assert!(!OracleError::MissingApiKey.is_retryable());
        assert!(OracleError::Status {
            status: 500,
            body: String::new()
        }
        .is_retryable());
    }

    #[tokio::test]
    async fn test_openai_oracle_without_key() {
        let oracle = OpenAiOracle::new(&OracleConfig::default()).unwrap();
        assert!(!oracle.has_api_key());

        let request = OracleRequest::new("https://ex.com", "<main>x</main>", &PromptBudget::default());
        let result = oracle.suggest_selector(&request).await;
        assert!(matches!(result, Err(OracleError::MissingApiKey)));
    }
}
