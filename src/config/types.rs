use serde::Deserialize;

/// Main configuration structure for docs-to-markdown
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub pacing: PacingConfig,
    pub fetcher: FetcherConfig,
    pub oracle: OracleConfig,
}

/// Where artifacts and compiled documents are written
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory holding one subdirectory per crawled host
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "downloaded".to_string(),
        }
    }
}

/// Randomized delay between page fetches (seconds, inclusive ranges)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PacingConfig {
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,

    /// Range used when `--slow` is given
    pub slow_min_delay_secs: u64,
    pub slow_max_delay_secs: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: 1,
            max_delay_secs: 5,
            slow_min_delay_secs: 20,
            slow_max_delay_secs: 35,
        }
    }
}

/// How pages are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Renderer {
    /// Server-rendered HTML over plain HTTP
    Http,

    /// Pages rendered in Chrome; needs the `browser` feature
    Browser,
}

impl Default for Renderer {
    fn default() -> Self {
        if cfg!(feature = "browser") {
            Renderer::Browser
        } else {
            Renderer::Http
        }
    }
}

/// Page fetcher settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetcherConfig {
    pub renderer: Renderer,

    pub user_agent: String,

    /// Whole-request (or navigation) timeout in seconds
    pub timeout_secs: u64,

    /// Tolerate invalid or self-signed TLS certificates
    pub accept_invalid_certs: bool,

    /// Time given to client-side scripts after a rendered page loads
    pub settle_millis: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            renderer: Renderer::default(),
            user_agent: format!("docs-to-markdown/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            accept_invalid_certs: true,
            settle_millis: 1000,
        }
    }
}

/// Selector oracle settings (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OracleConfig {
    /// API base URL, `/chat/completions` is appended
    pub base_url: String,

    /// Model identifier, overridden by `OPENAI_MODEL`
    pub model: String,

    pub max_tokens: u32,
    pub temperature: f32,

    /// Upper bound on the serialized DOM sent with a request (characters)
    pub max_prompt_chars: usize,

    /// Factor applied repeatedly to the DOM length until it fits the budget
    pub shrink_ratio: f64,

    pub max_attempts: u32,
    pub base_delay_secs: f64,

    /// Multiplier applied to the delay after each failed attempt
    pub decay_factor: f64,

    /// Only ever read from `OPENAI_API_KEY`
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            max_tokens: 50,
            temperature: 0.3,
            max_prompt_chars: 48_000,
            shrink_ratio: 0.8,
            max_attempts: 5,
            base_delay_secs: 30.0,
            decay_factor: 0.5,
            api_key: None,
        }
    }
}
