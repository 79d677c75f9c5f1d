use crate::config::types::{Config, FetcherConfig, OracleConfig, OutputConfig, PacingConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_output_config(&config.output)?;
    validate_pacing_config(&config.pacing)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_oracle_config(&config.oracle)?;
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates both pacing ranges
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.min_delay_secs > config.max_delay_secs {
        return Err(ConfigError::Validation(format!(
            "min-delay-secs ({}) must not exceed max-delay-secs ({})",
            config.min_delay_secs, config.max_delay_secs
        )));
    }

    if config.slow_min_delay_secs > config.slow_max_delay_secs {
        return Err(ConfigError::Validation(format!(
            "slow-min-delay-secs ({}) must not exceed slow-max-delay-secs ({})",
            config.slow_min_delay_secs, config.slow_max_delay_secs
        )));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates oracle configuration
fn validate_oracle_config(config: &OracleConfig) -> Result<(), ConfigError> {
    Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid oracle base-url: {}", e)))?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "oracle model cannot be empty".to_string(),
        ));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if !config.base_delay_secs.is_finite() || config.base_delay_secs < 0.0 {
        return Err(ConfigError::Validation(format!(
            "base-delay-secs must be a non-negative number, got {}",
            config.base_delay_secs
        )));
    }

    if !(config.decay_factor > 0.0 && config.decay_factor <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "decay-factor must be in (0, 1], got {}",
            config.decay_factor
        )));
    }

    if config.max_prompt_chars == 0 {
        return Err(ConfigError::Validation(
            "max-prompt-chars must be >= 1".to_string(),
        ));
    }

    if !(config.shrink_ratio > 0.0 && config.shrink_ratio < 1.0) {
        return Err(ConfigError::Validation(format!(
            "shrink-ratio must be in (0, 1), got {}",
            config.shrink_ratio
        )));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "temperature must be between 0 and 2, got {}",
            config.temperature
        )));
    }

    Ok(())
}
