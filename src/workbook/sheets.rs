//! Google Sheets workbook implementation
//!
//! Talks to the Sheets v4 REST API with a bearer token from [`SheetsAuth`].
//! Only the four calls the job needs are used: read a column, list sheet
//! titles, add a sheet and append rows.

use crate::workbook::auth::SheetsAuth;
use crate::workbook::traits::{Workbook, WorkbookError, WorkbookResult};
use crate::workbook::{column_letter, CellValue, ValueInput};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use url::Url;

pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Grid size of sheets created by `add_sheet`
const NEW_SHEET_ROWS: u32 = 1000;
const NEW_SHEET_COLUMNS: u32 = 3;

/// Google Sheets workbook backend
pub struct GoogleSheetsWorkbook {
    client: Client,
    endpoint: Url,
    spreadsheet_id: String,
    auth: SheetsAuth,
}

impl GoogleSheetsWorkbook {
    pub fn new(
        client: Client,
        endpoint: &str,
        spreadsheet_id: &str,
        auth: SheetsAuth,
    ) -> WorkbookResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| WorkbookError::Config(format!("invalid sheets endpoint: {}", e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(WorkbookError::Config(format!(
                "sheets endpoint cannot hold a path: {}",
                endpoint
            )));
        }

        Ok(Self {
            client,
            endpoint,
            spreadsheet_id: spreadsheet_id.to_string(),
            auth,
        })
    }

    /// `{endpoint}/{segments...}`, each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn check(response: Response) -> WorkbookResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(WorkbookError::Remote {
            status: status.as_u16(),
            body,
        })
    }
}

fn render_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn cell_json(value: &CellValue) -> Value {
    match value {
        CellValue::Text(s) => Value::String(s.clone()),
        CellValue::Number(n) => json!(n),
    }
}

#[async_trait]
impl Workbook for GoogleSheetsWorkbook {
    async fn has_sheet(&self, title: &str) -> WorkbookResult<bool> {
        let mut url = self.url(&[self.spreadsheet_id.as_str()]);
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let response = self
            .client
            .get(url)
            .bearer_auth(self.auth.bearer().await?)
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;

        let sheets = body["sheets"]
            .as_array()
            .ok_or_else(|| WorkbookError::Malformed("missing sheets list".to_string()))?;

        Ok(sheets
            .iter()
            .any(|sheet| sheet["properties"]["title"].as_str() == Some(title)))
    }

    async fn add_sheet(&self, title: &str) -> WorkbookResult<()> {
        let url = self.url(&[format!("{}:batchUpdate", self.spreadsheet_id).as_str()]);
        let payload = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": {
                            "rowCount": NEW_SHEET_ROWS,
                            "columnCount": NEW_SHEET_COLUMNS,
                        }
                    }
                }
            }]
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(self.auth.bearer().await?)
            .json(&payload)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn read_column(&self, sheet: &str, column: u32) -> WorkbookResult<Vec<String>> {
        let letter = column_letter(column);
        let range = format!("{}!{}:{}", sheet, letter, letter);
        let mut url = self.url(&[self.spreadsheet_id.as_str(), "values", range.as_str()]);
        url.query_pairs_mut()
            .append_pair("majorDimension", "COLUMNS");

        let response = self
            .client
            .get(url)
            .bearer_auth(self.auth.bearer().await?)
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;

        // An empty column has no "values" key at all
        let values = match body["values"][0].as_array() {
            Some(values) => values.iter().map(render_json).collect(),
            None => Vec::new(),
        };
        Ok(values)
    }

    async fn append_rows(
        &self,
        sheet: &str,
        rows: &[Vec<CellValue>],
        input: ValueInput,
    ) -> WorkbookResult<()> {
        let range = format!("{}!A1:append", sheet);
        let mut url = self.url(&[self.spreadsheet_id.as_str(), "values", range.as_str()]);
        url.query_pairs_mut()
            .append_pair("valueInputOption", input.as_str());

        let values: Vec<Vec<Value>> = rows
            .iter()
            .map(|row| row.iter().map(cell_json).collect())
            .collect();

        let response = self
            .client
            .post(url)
            .bearer_auth(self.auth.bearer().await?)
            .json(&json!({ "values": values }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
