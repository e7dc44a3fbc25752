//! Document endpoints.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;

use super::response::{self, Download};
use super::sessions::DocumentList;
use super::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::{Document, DocumentFilter, UploadResponse};

/// File extensions the backend accepts; anything else is silently dropped
/// server-side, so it is rejected before upload.
pub const UPLOADABLE_EXTENSIONS: &[&str] = &["pdf", "xml"];

/// Whether a path has an uploadable extension.
pub fn is_uploadable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| UPLOADABLE_EXTENSIONS.contains(&e.as_str()))
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    /// List documents, applying the server-side filters.
    pub async fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<Document>> {
        filter.validate().map_err(ApiError::InvalidInput)?;
        let (mut builder, url) = self.request(Method::GET, "/api/documents")?;
        let pairs = filter.query_pairs();
        if !pairs.is_empty() {
            builder = builder.query(&pairs);
        }
        let response = self.send(builder, &url).await?;
        let list: DocumentList = response::json(response, &url).await?;
        Ok(list.into_vec())
    }

    pub async fn get_document(&self, id: i64) -> Result<Document> {
        self.get_json(&format!("/api/documents/{}", id)).await
    }

    /// Upload one file. The backend may create several documents from a
    /// single XML envelope, so a list is returned.
    pub async fn upload_document(&self, path: &Path) -> Result<Vec<Document>> {
        if !is_uploadable(path) {
            return Err(ApiError::InvalidInput(format!(
                "{} is not a PDF or XML file",
                path.display()
            )));
        }
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::InvalidInput(format!("bad file name: {}", path.display())))?
            .to_string();
        let content = tokio::fs::read(path).await?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let part = Part::bytes(content)
            .file_name(filename.clone())
            .mime_str(mime.essence_str())
            .map_err(|e| ApiError::InvalidInput(format!("bad mime type for {}: {}", filename, e)))?;
        let form = Form::new().part("file", part);

        let (builder, url) = self.request(Method::POST, "/api/documents")?;
        let response = self.send(builder.multipart(form), &url).await?;
        let created: UploadResponse = response::json(response, &url).await?;
        let documents = created.into_documents();
        tracing::info!("Uploaded {} -> {} document(s)", filename, documents.len());
        Ok(documents)
    }

    /// Download the backend-generated PDF summary of a document.
    pub async fn download_summary(&self, id: i64) -> Result<Download> {
        let (builder, url) = self.request(Method::GET, &format!("/api/documents/{}/download", id))?;
        let response = self.send(builder, &url).await?;
        response::download(response, &url).await
    }

    /// Delete every document. Returns the server's confirmation message.
    pub async fn delete_all_documents(&self) -> Result<String> {
        let (builder, url) = self.request(Method::DELETE, "/api/documents/delete_all")?;
        let response = self.send(builder, &url).await?;
        let body: MessageResponse = response::json(response, &url).await?;
        Ok(body
            .message
            .unwrap_or_else(|| "All documents deleted".to_string()))
    }
}
