//! Sheets API v4 value reads

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use url::Url;

use super::client::{endpoint, GoogleClient};
use crate::error::Result;
use crate::mapping::SheetSource;

pub const DEFAULT_SHEETS_URL: &str = "https://sheets.googleapis.com";

/// `spreadsheets.values.get` response; `values` is absent for empty ranges
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// [`SheetSource`] backed by the Google Sheets API
#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: Arc<GoogleClient>,
    base_url: Url,
}

impl SheetsClient {
    pub fn new(client: Arc<GoogleClient>, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl SheetSource for SheetsClient {
    #[instrument(skip(self))]
    async fn read_range(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let url = endpoint(
            &self.base_url,
            &["v4", "spreadsheets", spreadsheet_id, "values", range],
        )?;
        let value_range: ValueRange = self.client.get_json(url).await?;
        Ok(value_range.values)
    }
}
