//! Workbook module for spreadsheet input and output
//!
//! This module handles the spreadsheet side of a job, including:
//! - The `Workbook` trait shared by all backends
//! - A local SQLite workbook
//! - The Google Sheets v4 REST API, with a static token or a service account
//! - Creation of the log sheet and its header row

mod auth;
mod schema;
mod sheets;
mod sqlite;
mod traits;

pub use auth::{ServiceAccountAuth, SheetsAuth, SHEETS_SCOPE};
pub use sheets::{GoogleSheetsWorkbook, DEFAULT_SHEETS_ENDPOINT};
pub use sqlite::SqliteWorkbook;
pub use traits::{Workbook, WorkbookError, WorkbookResult};

use crate::config::{WorkbookBackend, WorkbookConfig};
use reqwest::Client;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Header row of the log sheet
pub const LOG_HEADER: [&str; 3] = ["Timestamp", "URL", "Price"];

/// Header row of the input sheet
pub const INPUT_HEADER: [&str; 1] = ["URL"];

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Renders the value the way a spreadsheet displays it
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => format_number(*n),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// How appended values are interpreted by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInput {
    /// Stored exactly as given
    Raw,
    /// Parsed as if typed into the sheet (numeric text becomes a number)
    UserEntered,
}

impl ValueInput {
    /// Name used by the Sheets API `valueInputOption` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "RAW",
            Self::UserEntered => "USER_ENTERED",
        }
    }
}

/// Opens the workbook described by the configuration
///
/// # Arguments
///
/// * `config` - The workbook configuration section
/// * `client` - HTTP client used by remote backends
///
/// # Returns
///
/// * `Ok(Arc<dyn Workbook>)` - The opened workbook
/// * `Err(WorkbookError)` - Failed to open the backend
pub fn open_workbook(
    config: &WorkbookConfig,
    client: Client,
) -> WorkbookResult<Arc<dyn Workbook>> {
    match config.backend {
        WorkbookBackend::Sqlite => {
            let path = config.database_path.as_deref().ok_or_else(|| {
                WorkbookError::Config("database-path is required for sqlite".to_string())
            })?;
            let workbook: Arc<dyn Workbook> = Arc::new(SqliteWorkbook::new(Path::new(path))?);
            Ok(workbook)
        }
        WorkbookBackend::GoogleSheets => {
            let spreadsheet_id = config.spreadsheet_id.as_deref().ok_or_else(|| {
                WorkbookError::Config("spreadsheet-id is required for google-sheets".to_string())
            })?;
            let auth = match (&config.access_token, &config.credentials_path) {
                (Some(token), _) => SheetsAuth::token(token.as_str()),
                (None, Some(path)) => SheetsAuth::service_account_file(Path::new(path))?,
                (None, None) => {
                    return Err(WorkbookError::Config(
                        "access-token or credentials-path is required for google-sheets"
                            .to_string(),
                    ))
                }
            };
            if let SheetsAuth::ServiceAccount(account) = &auth {
                tracing::info!(
                    account = %account.client_email(),
                    "Using service-account credentials"
                );
            }
            let endpoint = config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_SHEETS_ENDPOINT);

            let workbook: Arc<dyn Workbook> = Arc::new(GoogleSheetsWorkbook::new(
                client,
                endpoint,
                spreadsheet_id,
                auth,
            )?);
            Ok(workbook)
        }
    }
}

/// Creates `title` with a raw header row unless it already exists
///
/// Returns true when the sheet was created.
pub async fn ensure_sheet(
    workbook: &dyn Workbook,
    title: &str,
    header: &[&str],
) -> WorkbookResult<bool> {
    if workbook.has_sheet(title).await? {
        return Ok(false);
    }

    workbook.add_sheet(title).await?;
    let header: Vec<CellValue> = header.iter().map(|h| CellValue::text(*h)).collect();
    workbook
        .append_rows(title, &[header], ValueInput::Raw)
        .await?;

    tracing::info!(sheet = %title, "Created sheet");
    Ok(true)
}

/// Creates the log sheet with its `[Timestamp, URL, Price]` header if missing
pub async fn ensure_log_sheet(workbook: &dyn Workbook, title: &str) -> WorkbookResult<bool> {
    ensure_sheet(workbook, title, &LOG_HEADER).await
}

/// Spreadsheet column letters for a 1-based column number (1 = A, 27 = AA)
pub fn column_letter(column: u32) -> String {
    let mut n = column;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
