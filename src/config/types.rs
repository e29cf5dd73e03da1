use crate::provider::ProviderKind;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Price-Watch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub job: JobConfig,
    pub workbook: WorkbookConfig,
    #[serde(default)]
    pub pricing: Option<PricingConfig>,
    #[serde(default, rename = "provider")]
    pub providers: Vec<ProviderEntry>,
}

/// Job behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Attempts per URL before giving up
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Delay between attempts for the same URL (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Number of concurrent fetch workers (1 = sequential)
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Delay between task submissions (milliseconds)
    #[serde(rename = "dispatch-delay-ms", default = "default_dispatch_delay_ms")]
    pub dispatch_delay_ms: u64,

    /// Attempts for appending the result rows to the log sheet
    #[serde(rename = "append-attempts", default = "default_append_attempts")]
    pub append_attempts: u32,

    /// Delay between log append attempts (milliseconds)
    #[serde(rename = "append-delay-ms", default = "default_append_delay_ms")]
    pub append_delay_ms: u64,

    /// Per-request timeout for provider calls (seconds)
    #[serde(
        rename = "request-timeout-secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,

    /// IANA zone for log timestamps, e.g. "America/New_York". Local time when unset.
    #[serde(default)]
    pub timezone: Option<String>,
}

impl JobConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn dispatch_delay(&self) -> Duration {
        Duration::from_millis(self.dispatch_delay_ms)
    }

    pub fn append_delay(&self) -> Duration {
        Duration::from_millis(self.append_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            workers: default_workers(),
            dispatch_delay_ms: default_dispatch_delay_ms(),
            append_attempts: default_append_attempts(),
            append_delay_ms: default_append_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            timezone: None,
        }
    }
}

/// Which spreadsheet implementation backs the workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkbookBackend {
    Sqlite,
    GoogleSheets,
}

/// Workbook (input URLs and result log) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WorkbookConfig {
    pub backend: WorkbookBackend,

    /// Path to the SQLite workbook file (sqlite backend)
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,

    /// Spreadsheet identifier (google-sheets backend)
    #[serde(rename = "spreadsheet-id", default)]
    pub spreadsheet_id: Option<String>,

    /// OAuth bearer token (google-sheets backend); takes precedence over
    /// `credentials-path` when both are set
    #[serde(rename = "access-token", default)]
    pub access_token: Option<String>,

    /// Service-account JSON key file (google-sheets backend)
    #[serde(rename = "credentials-path", default)]
    pub credentials_path: Option<String>,

    /// Override for the Sheets API endpoint
    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,

    /// Sheet whose column A lists the product URLs
    #[serde(rename = "input-sheet", default = "default_input_sheet")]
    pub input_sheet: String,

    /// Sheet receiving the result rows
    #[serde(rename = "log-sheet", default = "default_log_sheet")]
    pub log_sheet: String,
}

/// Credentials for the structured pricing API used for Amazon products
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    pub username: String,
    pub password: String,

    /// Delivery location (zip code) the prices are quoted for
    #[serde(rename = "geo-location")]
    pub geo_location: String,

    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,

    #[serde(rename = "timeout-secs", default = "default_pricing_timeout_secs")]
    pub timeout_secs: u64,
}

/// One scraping provider in the rotation
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEntry {
    pub kind: ProviderKind,

    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,

    #[serde(rename = "initial-quota", default)]
    pub initial_quota: Option<u32>,

    #[serde(rename = "reset-quota", default)]
    pub reset_quota: Option<u32>,

    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,

    /// Replaces the kind's default non-retryable HTTP statuses
    #[serde(rename = "fatal-statuses", default)]
    pub fatal_statuses: Option<Vec<u16>>,

    /// Replaces the kind's default non-retryable error messages
    #[serde(rename = "fatal-messages", default)]
    pub fatal_messages: Option<Vec<String>>,
}

impl ProviderEntry {
    /// Creates an entry with the kind's defaults
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            api_key: None,
            initial_quota: None,
            reset_quota: None,
            base_url: None,
            fatal_statuses: None,
            fatal_messages: None,
        }
    }

    pub fn initial_quota(&self) -> u32 {
        self.initial_quota
            .unwrap_or_else(|| self.kind.default_initial_quota())
    }

    pub fn reset_quota(&self) -> u32 {
        self.reset_quota
            .unwrap_or_else(|| self.kind.default_reset_quota())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }
}

fn default_attempts() -> u32 {
    6
}

fn default_retry_delay_ms() -> u64 {
    3000
}

fn default_workers() -> u32 {
    2
}

fn default_dispatch_delay_ms() -> u64 {
    1000
}

fn default_append_attempts() -> u32 {
    5
}

fn default_append_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_pricing_timeout_secs() -> u64 {
    15
}

fn default_input_sheet() -> String {
    "Sheet1".to_string()
}

fn default_log_sheet() -> String {
    "Logs".to_string()
}
