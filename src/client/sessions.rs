//! Session endpoints.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::response;
use super::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::{Document, NewSession, Session, SessionId};

#[derive(Deserialize)]
struct SessionList {
    #[serde(default)]
    sessions: Vec<Session>,
}

/// Listing payload; accepts both the wrapped and the bare-array form.
#[derive(Deserialize)]
#[serde(untagged)]
pub(super) enum DocumentList {
    Wrapped { documents: Vec<Document> },
    Bare(Vec<Document>),
}

impl DocumentList {
    pub(super) fn into_vec(self) -> Vec<Document> {
        match self {
            DocumentList::Wrapped { documents } => documents,
            DocumentList::Bare(documents) => documents,
        }
    }
}

#[derive(Serialize)]
struct AddDocuments<'a> {
    document_ids: &'a [i64],
}

impl ApiClient {
    /// List the sessions visible to the current user.
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        let list: SessionList = self.get_json("/api/sessions").await?;
        Ok(list.sessions)
    }

    /// Look up one session by id.
    pub async fn get_session(&self, id: SessionId) -> Result<Session> {
        self.list_sessions()
            .await?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or(ApiError::SessionNotFound(id))
    }

    /// Create a session. The active session is not changed here.
    pub async fn create_session(&self, new: &NewSession) -> Result<Session> {
        let (builder, url) = self.request(Method::POST, "/api/sessions")?;
        let response = self.send(builder.json(new), &url).await?;
        response::json(response, &url).await
    }

    pub async fn delete_session(&self, id: SessionId) -> Result<()> {
        let path = format!("/api/sessions/{}", id);
        let (builder, url) = self.request(Method::DELETE, &path)?;
        let response = self.send(builder, &url).await?;
        response::check(response).await?;
        Ok(())
    }

    /// Documents attached to a session.
    pub async fn session_documents(&self, id: SessionId) -> Result<Vec<Document>> {
        let path = format!("/api/sessions/{}/documents", id);
        let list: DocumentList = self.get_json_scoped(&path, Some(id)).await?;
        Ok(list.into_vec())
    }

    /// Attach documents to a session in a single call.
    pub async fn add_documents(&self, id: SessionId, document_ids: &[i64]) -> Result<()> {
        if document_ids.is_empty() {
            return Ok(());
        }
        let path = format!("/api/sessions/{}/add_documents", id);
        let (builder, url) = self.request_scoped(Method::POST, &path, Some(id))?;
        let response = self
            .send(builder.json(&AddDocuments { document_ids }), &url)
            .await?;
        response::check(response).await?;
        tracing::info!("Attached {} document(s) to session {}", document_ids.len(), id);
        Ok(())
    }
}
