//! Workbook traits and error types
//!
//! This module defines the trait interface for spreadsheet backends and
//! associated error types.

use crate::workbook::{CellValue, ValueInput};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during workbook operations
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid workbook configuration: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),
}

/// Result type for workbook operations
pub type WorkbookResult<T> = Result<T, WorkbookError>;

/// Trait for spreadsheet backends
///
/// A workbook holds named sheets of cells. Rows and columns are 1-based,
/// as in spreadsheet notation. Implementations must be usable from several
/// tasks at once.
#[async_trait]
pub trait Workbook: Send + Sync {
    /// Returns true if a sheet with this title exists
    async fn has_sheet(&self, title: &str) -> WorkbookResult<bool>;

    /// Creates an empty sheet
    async fn add_sheet(&self, title: &str) -> WorkbookResult<()>;

    /// Reads the values of one column, top to bottom
    ///
    /// Numbers are rendered as text. Trailing empty cells are not returned.
    ///
    /// # Arguments
    ///
    /// * `sheet` - The sheet title
    /// * `column` - 1-based column number (1 = column A)
    async fn read_column(&self, sheet: &str, column: u32) -> WorkbookResult<Vec<String>>;

    /// Appends rows after the last non-empty row of a sheet
    ///
    /// # Arguments
    ///
    /// * `sheet` - The sheet title
    /// * `rows` - Rows of cells, starting at column A
    /// * `input` - Whether values are stored verbatim or interpreted
    async fn append_rows(
        &self,
        sheet: &str,
        rows: &[Vec<CellValue>],
        input: ValueInput,
    ) -> WorkbookResult<()>;
}
