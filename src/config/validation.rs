use crate::config::types::{Config, ConversionConfig, DiscoveryConfig, RetryConfig, StoreConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_store_config(&config.store)?;
    validate_retry_config(&config.retry)?;
    validate_discovery_config(&config.discovery)?;
    validate_conversion_config(&config.conversion)?;
    Ok(())
}

/// Validates store connection settings
fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    let api = Url::parse(&config.api_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api-base: {}", e)))?;
    if api.scheme() != "http" && api.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "api-base must use http or https, got '{}'",
            api.scheme()
        )));
    }

    if config.token_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "token-env cannot be empty".to_string(),
        ));
    }

    if config.allowed_hosts.is_empty() {
        return Err(ConfigError::Validation(
            "allowed-hosts must list at least one host".to_string(),
        ));
    }
    for pattern in &config.allowed_hosts {
        validate_host_pattern(pattern)?;
    }

    if config.page_size < 1 || config.page_size > 1000 {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and 1000, got {}",
            config.page_size
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    // 2^10 * base delay is already far past any sensible rate-limit window
    if config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be <= 10, got {}",
            config.max_attempts
        )));
    }
    Ok(())
}

fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.max_depth > 64 {
        return Err(ConfigError::Validation(format!(
            "max-depth must be <= 64, got {}",
            config.max_depth
        )));
    }
    Ok(())
}

fn validate_conversion_config(config: &ConversionConfig) -> Result<(), ConfigError> {
    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if let Some(folder) = &config.scratch_folder {
        if folder.trim().is_empty() {
            return Err(ConfigError::Validation(
                "scratch-folder cannot be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates a host pattern (supports a leading "*." wildcard)
fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host pattern cannot be empty".to_string(),
        ));
    }

    let host = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_host_string(host)
}

/// Validates a host string (without wildcard prefix)
fn validate_host_string(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::InvalidPattern("Host cannot be empty".to_string()));
    }

    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    if !host.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' must contain at least one dot (e.g., 'docs.example.com')",
            host
        )));
    }

    if host.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' must be lowercase",
            host
        )));
    }

    Ok(())
}
