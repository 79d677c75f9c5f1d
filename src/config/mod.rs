//! Configuration module for docs-to-markdown
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and layering environment overrides on top.
//!
//! # Example
//!
//! ```no_run
//! use docs_to_markdown::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("docs-to-markdown.toml")).unwrap();
//! println!("Artifacts go to: {}", config.output.directory);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetcherConfig, OracleConfig, OutputConfig, PacingConfig, Renderer};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, layered_lookup, load_config, load_config_with_hash,
    read_dotenv, resolve_config,
};
pub use validation::validate;
