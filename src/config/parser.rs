use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Prefix marking a credential that is read from the environment
const ENV_PREFIX: &str = "env:";

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
/// use price_watch::config::load_config;
///
/// let config = load_config(Path::new("price-watch.toml")).unwrap();
/// println!("Workers: {}", config.job.workers);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses configuration text, resolves `env:` credentials and validates the result
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(content)?;

    resolve_secrets(&mut config)?;

    validate(&config)?;

    Ok(config)
}

/// Replaces every `env:NAME` credential with the value of `NAME`
fn resolve_secrets(config: &mut Config) -> Result<(), ConfigError> {
    for provider in &mut config.providers {
        resolve_optional(&mut provider.api_key)?;
    }

    if let Some(pricing) = config.pricing.as_mut() {
        resolve_secret(&mut pricing.username)?;
        resolve_secret(&mut pricing.password)?;
    }

    resolve_optional(&mut config.workbook.access_token)?;

    Ok(())
}

fn resolve_optional(value: &mut Option<String>) -> Result<(), ConfigError> {
    match value {
        Some(v) => resolve_secret(v),
        None => Ok(()),
    }
}

fn resolve_secret(value: &mut String) -> Result<(), ConfigError> {
    if let Some(name) = value.strip_prefix(ENV_PREFIX) {
        let name = name.trim().to_string();
        *value = std::env::var(&name).map_err(|_| ConfigError::MissingSecret(name))?;
    }
    Ok(())
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the configuration they used.
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
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
