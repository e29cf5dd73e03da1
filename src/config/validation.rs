use crate::config::types::{
    Config, JobConfig, PricingConfig, ProviderEntry, WorkbookBackend, WorkbookConfig,
};
use crate::provider::ProviderKind;
use crate::ConfigError;
use chrono_tz::Tz;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_job_config(&config.job)?;
    validate_workbook_config(&config.workbook)?;
    if let Some(pricing) = &config.pricing {
        validate_pricing_config(pricing)?;
    }
    validate_providers(&config.providers)?;
    Ok(())
}

/// Validates job configuration
fn validate_job_config(config: &JobConfig) -> Result<(), ConfigError> {
    if config.attempts < 1 || config.attempts > 20 {
        return Err(ConfigError::Validation(format!(
            "attempts must be between 1 and 20, got {}",
            config.attempts
        )));
    }

    if config.workers < 1 || config.workers > 16 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 16, got {}",
            config.workers
        )));
    }

    if config.append_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "append-attempts must be >= 1, got {}",
            config.append_attempts
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if let Some(timezone) = &config.timezone {
        parse_timezone(timezone)?;
    }

    Ok(())
}

/// Validates workbook configuration
fn validate_workbook_config(config: &WorkbookConfig) -> Result<(), ConfigError> {
    match config.backend {
        WorkbookBackend::Sqlite => {
            if config.database_path.as_deref().unwrap_or("").is_empty() {
                return Err(ConfigError::Validation(
                    "database-path is required for the sqlite workbook".to_string(),
                ));
            }
        }
        WorkbookBackend::GoogleSheets => {
            if config.spreadsheet_id.as_deref().unwrap_or("").is_empty() {
                return Err(ConfigError::Validation(
                    "spreadsheet-id is required for the google-sheets workbook".to_string(),
                ));
            }
            let has_token = !config.access_token.as_deref().unwrap_or("").is_empty();
            let has_key = !config.credentials_path.as_deref().unwrap_or("").is_empty();
            if !has_token && !has_key {
                return Err(ConfigError::Validation(
                    "access-token or credentials-path is required for the google-sheets workbook"
                        .to_string(),
                ));
            }
        }
    }

    if let Some(base_url) = &config.base_url {
        validate_base_url("workbook", base_url)?;
    }

    if config.input_sheet.trim().is_empty() || config.log_sheet.trim().is_empty() {
        return Err(ConfigError::Validation(
            "input-sheet and log-sheet cannot be empty".to_string(),
        ));
    }

    if config.input_sheet == config.log_sheet {
        return Err(ConfigError::Validation(format!(
            "input-sheet and log-sheet must differ, both are '{}'",
            config.log_sheet
        )));
    }

    Ok(())
}

/// Validates pricing API credentials
fn validate_pricing_config(config: &PricingConfig) -> Result<(), ConfigError> {
    if config.username.is_empty() || config.password.is_empty() {
        return Err(ConfigError::Validation(
            "pricing username and password cannot be empty".to_string(),
        ));
    }

    if config.geo_location.trim().is_empty() {
        return Err(ConfigError::Validation(
            "pricing geo-location cannot be empty".to_string(),
        ));
    }

    if let Some(base_url) = &config.base_url {
        validate_base_url("pricing", base_url)?;
    }

    Ok(())
}

/// Validates the provider rotation
fn validate_providers(providers: &[ProviderEntry]) -> Result<(), ConfigError> {
    if providers.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[provider]] must be configured".to_string(),
        ));
    }

    for (index, entry) in providers.iter().enumerate() {
        if entry.reset_quota() < 1 {
            return Err(ConfigError::Validation(format!(
                "provider {} ({}) must have reset-quota >= 1",
                index,
                entry.kind.as_str()
            )));
        }

        if entry.kind != ProviderKind::Direct && entry.api_key().is_empty() {
            return Err(ConfigError::Validation(format!(
                "provider {} ({}) requires an api-key",
                index,
                entry.kind.as_str()
            )));
        }

        if let Some(base_url) = &entry.base_url {
            validate_base_url(entry.kind.as_str(), base_url)?;
        }
    }

    Ok(())
}

fn validate_base_url(owner: &str, base_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} base-url: {}", owner, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} base-url '{}' must use HTTP(S)",
            owner, base_url
        )));
    }

    Ok(())
}

/// Parses an IANA zone name such as `America/New_York`
pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::Validation(format!("Unknown timezone: '{}'", name)))
}
