//! SQLite workbook implementation
//!
//! This module provides a local, file-backed implementation of the Workbook
//! trait. Each worksheet is a sparse set of cells keyed by row and column.

use crate::workbook::schema::initialize_schema;
use crate::workbook::traits::{Workbook, WorkbookError, WorkbookResult};
use crate::workbook::{CellValue, ValueInput};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite workbook backend
pub struct SqliteWorkbook {
    conn: Mutex<Connection>,
}

impl SqliteWorkbook {
    /// Creates a new SqliteWorkbook instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteWorkbook)` - Successfully opened/created database
    /// * `Err(WorkbookError)` - Failed to open database
    pub fn new(path: &Path) -> WorkbookResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> WorkbookResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn worksheet_id(conn: &Connection, title: &str) -> WorkbookResult<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM worksheets WHERE title = ?1",
            params![title],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

fn require_worksheet(conn: &Connection, title: &str) -> WorkbookResult<i64> {
    worksheet_id(conn, title)?.ok_or_else(|| WorkbookError::SheetNotFound(title.to_string()))
}

/// Applies spreadsheet input parsing to a cell
fn interpret(value: &CellValue, input: ValueInput) -> CellValue {
    match (value, input) {
        (CellValue::Text(text), ValueInput::UserEntered) => match text.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}

#[async_trait]
impl Workbook for SqliteWorkbook {
    async fn has_sheet(&self, title: &str) -> WorkbookResult<bool> {
        let conn = self.lock();
        Ok(worksheet_id(&conn, title)?.is_some())
    }

    async fn add_sheet(&self, title: &str) -> WorkbookResult<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO worksheets (title, created_at) VALUES (?1, ?2)",
            params![title, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    async fn read_column(&self, sheet: &str, column: u32) -> WorkbookResult<Vec<String>> {
        let conn = self.lock();
        let id = require_worksheet(&conn, sheet)?;

        let mut stmt = conn.prepare(
            "SELECT row_num, text_value, number_value FROM cells
             WHERE worksheet_id = ?1 AND col_num = ?2
             ORDER BY row_num",
        )?;

        let cells = stmt.query_map(params![id, column], |row| {
            let row_num: i64 = row.get(0)?;
            let text: Option<String> = row.get(1)?;
            let number: Option<f64> = row.get(2)?;
            Ok((row_num, text, number))
        })?;

        let mut values = Vec::new();
        for cell in cells {
            let (row_num, text, number) = cell?;
            let rendered = match (text, number) {
                (Some(text), _) => text,
                (None, Some(number)) => CellValue::Number(number).render(),
                (None, None) => String::new(),
            };

            // Gaps in the sparse column read as empty cells
            let index = (row_num.max(1) - 1) as usize;
            if values.len() < index {
                values.resize(index, String::new());
            }
            values.push(rendered);
        }

        while values.last().is_some_and(|v: &String| v.is_empty()) {
            values.pop();
        }

        Ok(values)
    }

    async fn append_rows(
        &self,
        sheet: &str,
        rows: &[Vec<CellValue>],
        input: ValueInput,
    ) -> WorkbookResult<()> {
        let mut conn = self.lock();
        let id = require_worksheet(&conn, sheet)?;

        let tx = conn.transaction()?;
        let last_row: i64 = tx.query_row(
            "SELECT COALESCE(MAX(row_num), 0) FROM cells WHERE worksheet_id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO cells (worksheet_id, row_num, col_num, text_value, number_value)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for (offset, row) in rows.iter().enumerate() {
                let row_num = last_row + offset as i64 + 1;
                for (col, value) in row.iter().enumerate() {
                    let col_num = col as i64 + 1;
                    match interpret(value, input) {
                        CellValue::Text(text) => {
                            insert.execute(params![id, row_num, col_num, text, None::<f64>])?;
                        }
                        CellValue::Number(number) => {
                            insert.execute(params![id, row_num, col_num, None::<String>, number])?;
                        }
                    }
                }
            }
        }

        tx.commit()?;
        Ok(())
    }
}
