//! Database schema for the SQLite workbook
//!
//! A workbook is a set of named worksheets holding sparse cells. Text and
//! numeric cell values live in separate columns so numbers keep their type.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Named worksheets
CREATE TABLE IF NOT EXISTS worksheets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- Sparse cell storage, 1-based row and column numbers
CREATE TABLE IF NOT EXISTS cells (
    worksheet_id INTEGER NOT NULL REFERENCES worksheets(id),
    row_num INTEGER NOT NULL,
    col_num INTEGER NOT NULL,
    text_value TEXT,
    number_value REAL,
    PRIMARY KEY (worksheet_id, row_num, col_num)
);

CREATE INDEX IF NOT EXISTS idx_cells_column ON cells(worksheet_id, col_num);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
