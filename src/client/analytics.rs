//! Analytics endpoints that bypass the chart cache.

use reqwest::Method;

use super::response::{self, Download};
use super::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// Download the product summary spreadsheet.
    pub async fn export_products(&self) -> Result<Download> {
        let (builder, url) = self.request(Method::GET, "/api/analytics/products/export")?;
        let response = self.send(builder, &url).await?;
        response::download(response, &url).await
    }
}
