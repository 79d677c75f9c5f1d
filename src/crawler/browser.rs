//! Browser-backed page fetcher
//!
//! Renders every page in Chrome over the DevTools protocol so that docs
//! built client-side come back with their content. Headless unless the
//! crawl runs in debug mode.

use crate::config::FetcherConfig;
use crate::crawler::fetcher::{rendered_page, FetchError, FetchedPage, PageFetcher};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Slow pacing and the debug pause leave the browser idle for long stretches
const IDLE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// [`PageFetcher`] that renders pages in one reused Chrome tab
pub struct BrowserFetcher {
    // Chrome shuts down when this is dropped
    _browser: Browser,
    tab: Arc<Tab>,
    settle: Duration,
}

impl BrowserFetcher {
    /// Starts Chrome and opens the tab used for the whole crawl
    ///
    /// # Arguments
    ///
    /// * `config` - The fetcher configuration
    /// * `headless` - Hide the browser window
    pub fn launch(config: &FetcherConfig, headless: bool) -> Result<Self, FetchError> {
        let browser = Browser::new(launch_options(config, headless)?)
            .map_err(|e| FetchError::Launch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| FetchError::Launch(e.to_string()))?;
        tab.set_default_timeout(Duration::from_secs(config.timeout_secs));

        tracing::debug!(
            "Chrome started ({})",
            if headless { "headless" } else { "visible" }
        );

        Ok(Self {
            _browser: browser,
            tab,
            settle: Duration::from_millis(config.settle_millis),
        })
    }
}

impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let tab = Arc::clone(&self.tab);
        let target = url.clone();
        let settle = self.settle;

        // The DevTools client blocks
        let rendered = tokio::task::spawn_blocking(move || render(&tab, &target, settle))
            .await
            .map_err(|e| FetchError::Render {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let (location, html) = rendered.map_err(|e| FetchError::Render {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(rendered_page(url, &location, html))
    }
}

fn render(tab: &Tab, url: &Url, settle: Duration) -> anyhow::Result<(String, String)> {
    tab.navigate_to(url.as_str())?.wait_until_navigated()?;

    if !settle.is_zero() {
        std::thread::sleep(settle);
    }

    Ok((tab.get_url(), tab.get_content()?))
}

/// Chrome launch options for a crawl session
pub fn launch_options(
    config: &FetcherConfig,
    headless: bool,
) -> Result<LaunchOptions<'static>, FetchError> {
    LaunchOptions::default_builder()
        .headless(headless)
        .sandbox(false)
        .idle_browser_timeout(IDLE_TIMEOUT)
        .args(launch_args(config))
        .build()
        .map_err(|e| FetchError::Launch(e.to_string()))
}

fn launch_args(config: &FetcherConfig) -> Vec<&'static OsStr> {
    let mut args = vec![
        OsStr::new("--no-first-run"),
        OsStr::new("--no-default-browser-check"),
        OsStr::new("--disable-extensions"),
    ];

    if config.accept_invalid_certs {
        args.push(OsStr::new("--ignore-certificate-errors"));
    }

    args
}
