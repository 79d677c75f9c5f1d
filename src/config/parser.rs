use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;

/// Environment variable holding the oracle API key
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Environment variable overriding the oracle model
pub const MODEL_VAR: &str = "OPENAI_MODEL";

/// Environment variable overriding the oracle base URL
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use docs_to_markdown::config::load_config;
///
/// let config = load_config(Path::new("docs-to-markdown.toml")).unwrap();
/// println!("Oracle model: {}", config.oracle.model);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let config: Config = toml::from_str(&content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so that runs can be matched to the settings they used.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok((Config, String))` - Successfully loaded configuration and its hash
/// * `Err(ConfigError)` - Failed to load or parse the configuration
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Layers environment overrides onto a configuration
///
/// `lookup` is consulted for [`API_KEY_VAR`], [`MODEL_VAR`] and
/// [`BASE_URL_VAR`]; empty values are ignored. Pass
/// `|name| std::env::var(name).ok()` to read the process environment.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(key) = non_empty(API_KEY_VAR) {
        config.oracle.api_key = Some(key.trim().to_string());
    }

    if let Some(model) = non_empty(MODEL_VAR) {
        config.oracle.model = model.trim().to_string();
    }

    if let Some(base_url) = non_empty(BASE_URL_VAR) {
        config.oracle.base_url = base_url.trim().to_string();
    }
}

/// Reads the variables of a `.env` file without touching the process
/// environment
pub fn read_dotenv(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    Ok(dotenvy::from_path_iter(path)?.collect::<Result<_, _>>()?)
}

/// Variables of the nearest `.env` file (current directory or an ancestor)
///
/// A missing file yields no variables; a malformed one is logged and
/// ignored.
fn discover_dotenv() -> HashMap<String, String> {
    let values = dotenvy::dotenv_iter().and_then(|iter| iter.collect::<Result<_, _>>());

    match values {
        Ok(values) => values,
        Err(e) if e.not_found() => HashMap::new(),
        Err(e) => {
            tracing::warn!("Ignoring .env file: {}", e);
            HashMap::new()
        }
    }
}

/// Looks a variable up in `primary` first, then in `dotenv`
///
/// Values already in the environment win over the `.env` file.
pub fn layered_lookup<'a, P>(
    primary: P,
    dotenv: &'a HashMap<String, String>,
) -> impl Fn(&str) -> Option<String> + 'a
where
    P: Fn(&str) -> Option<String> + 'a,
{
    move |name| primary(name).or_else(|| dotenv.get(name).cloned())
}

/// Builds the effective configuration for a run
///
/// Loads the file when one is given (defaults otherwise), applies the
/// process environment and any `.env` file, and validates the result.
///
/// # Returns
///
/// * `Ok((Config, Option<String>))` - The configuration and, when loaded
///   from a file, the file's hash
/// * `Err(ConfigError)` - Failed to load or validate
pub fn resolve_config(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    let (mut config, hash) = match path {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    let dotenv = discover_dotenv();
    apply_env_overrides(
        &mut config,
        layered_lookup(|name| std::env::var(name).ok(), &dotenv),
    );
    validate(&config)?;

    Ok((config, hash))
}
