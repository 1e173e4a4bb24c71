//! Sheets v4 `values` client.

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{ColumnIndex, SheetError, SheetName, SheetStore, SpreadsheetId};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::auth::TokenSource;
use crate::credentials::ServiceAccountKey;
use crate::range::{read_range, write_range};

/// Sheets API root.
pub const BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Body of a `values.get` response.
#[derive(Debug, Default, Deserialize)]
pub struct ValueRange {
    /// Row-major cell values; absent when the range is empty.
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// First cell of every row, trimmed, blank rows dropped, order kept.
pub fn column_texts(range: ValueRange) -> Vec<String> {
    range
        .values
        .iter()
        .map(|row| row.first().map(cell_text).unwrap_or_default())
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
        .collect()
}

/// [`SheetStore`] over the Google Sheets REST API.
pub struct SheetsClient {
    http: reqwest::Client,
    auth: TokenSource,
    base_url: String,
}

impl SheetsClient {
    /// Builds a client authenticating as the given service account.
    pub fn new(key: ServiceAccountKey) -> Result<Self, SheetError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SheetError::Auth {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            auth: TokenSource::new(key, http.clone()),
            http,
            base_url: BASE_URL.to_owned(),
        })
    }

    /// Sends requests to another `spreadsheets` root instead of [`BASE_URL`].
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Loads credentials from a path or inline JSON and builds a client.
    pub fn from_credentials(value: &str) -> Result<Self, SheetError> {
        Self::new(ServiceAccountKey::load(value)?)
    }

    /// Service-account email used for requests.
    pub fn client_email(&self) -> &str {
        self.auth.client_email()
    }

    fn values_url(&self, spreadsheet: &SpreadsheetId, range: &str) -> Result<Url, String> {
        let mut url = Url::parse(&self.base_url).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| format!("{} cannot be a base URL", self.base_url))?
            .push(spreadsheet.as_str())
            .push("values")
            .push(range);
        Ok(url)
    }
}

#[async_trait]
impl SheetStore for SheetsClient {
    async fn read_column(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &SheetName,
    ) -> Result<Vec<String>, SheetError> {
        let range = read_range(sheet);
        let read_err = |message: String| SheetError::Read { message };
        let url = self.values_url(spreadsheet, &range).map_err(read_err)?;
        let token = self.auth.token().await?;
        debug!(%range, "reading source column");

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| read_err(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| read_err(e.to_string()))?;
        if !status.is_success() {
            return Err(read_err(format!("{range}: {status} - {body}")));
        }

        let values: ValueRange =
            serde_json::from_str(&body).map_err(|e| read_err(format!("{range}: {e}")))?;
        Ok(column_texts(values))
    }

    async fn write_column(
        &self,
        spreadsheet: &SpreadsheetId,
        sheet: &SheetName,
        values: &[String],
        start_offset: usize,
        column: ColumnIndex,
    ) -> Result<(), SheetError> {
        if values.is_empty() {
            return Ok(());
        }
        let range = write_range(sheet, column, start_offset, values.len());
        let write_err = |message: String| SheetError::Write {
            range: range.clone(),
            message,
        };
        let url = self.values_url(spreadsheet, &range).map_err(write_err)?;
        let token = self.auth.token().await?;
        debug!(%range, rows = values.len(), "writing results");

        let rows: Vec<[&str; 1]> = values.iter().map(|v| [v.as_str()]).collect();
        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": rows,
            }))
            .send()
            .await
            .map_err(|e| write_err(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(write_err(format!("{status} - {body}")));
        }
        Ok(())
    }
}
