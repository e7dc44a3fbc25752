//! Session lifecycle and uploads.

use std::path::{Path, PathBuf};

use url::Url;

use super::{Chart, Dashboard, PanelView};
use crate::client::is_uploadable;
use crate::error::{ApiError, Result};
use crate::models::{Document, NewSession, Session, SessionId};
use crate::session::{LinkAction, LinkSync};

/// Per-file result reported while an upload runs.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Number of documents the backend created from the file.
    Created(usize),
    /// Not a PDF or XML file; never sent.
    Skipped,
    Failed(String),
}

/// Summary of an upload action.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub created: Vec<Document>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    /// Session the new documents were attached to.
    pub attached_to: Option<SessionId>,
    /// Set when the documents were created but attaching them failed.
    pub attach_error: Option<String>,
    pub products: PanelView,
    pub categories: PanelView,
}

impl UploadReport {
    pub fn document_ids(&self) -> Vec<i64> {
        self.created.iter().map(|d| d.id).collect()
    }
}

impl Dashboard {
    /// Verify a session exists and make it active.
    pub async fn use_session(&self, id: SessionId) -> Result<Session> {
        let session = self.api.get_session(id).await?;
        self.switch_session(Some(session.id))?;
        Ok(session)
    }

    /// Reconcile a dashboard link with the store. When the link selects a
    /// different session the panels are cleared as for any other switch.
    pub fn open_link(&self, url: &Url) -> Result<LinkSync> {
        let sync = self.store().reconcile_link(url)?;
        if sync.action == LinkAction::Adopted {
            for chart in Chart::ALL {
                self.panel(chart).reset();
            }
        }
        Ok(sync)
    }

    /// Create a session and make it active. On failure nothing local
    /// changes.
    pub async fn create_session(&self, new: NewSession) -> Result<Session> {
        let new = new.normalized().map_err(ApiError::InvalidInput)?;
        let session = self.api.create_session(&new).await?;
        tracing::info!("Created session {} ({})", session.id, session.name);
        self.switch_session(Some(session.id))?;
        Ok(session)
    }

    /// Delete a session. Only its creator or an administrator may do so;
    /// anyone else is refused without a request being sent.
    pub async fn delete_session(&self, id: SessionId) -> Result<()> {
        let session = self.api.get_session(id).await?;
        let identity = self.store().identity();
        if !session.can_delete(&identity) {
            return Err(ApiError::Forbidden(format!(
                "only the creator or an administrator can delete session {}",
                id
            )));
        }

        self.api.delete_session(id).await?;
        tracing::info!("Deleted session {} ({})", id, session.name);
        self.queries.invalidate_session(Some(id));
        if self.active_session() == Some(id) {
            self.switch_session(None)?;
        }
        Ok(())
    }

    /// Upload files as one action: one creation call per file, then a single
    /// attach call to the session that was active when the upload started,
    /// then a refetch of both charts.
    pub async fn upload<F>(&self, paths: &[PathBuf], mut on_progress: F) -> UploadReport
    where
        F: FnMut(&Path, &UploadOutcome),
    {
        let session = self.active_session();
        let mut created = Vec::new();
        let mut skipped = Vec::new();
        let mut failed = Vec::new();

        for path in paths {
            let outcome = if !is_uploadable(path) {
                skipped.push(path.clone());
                UploadOutcome::Skipped
            } else {
                match self.api.upload_document(path).await {
                    Ok(docs) => {
                        let count = docs.len();
                        created.extend(docs);
                        UploadOutcome::Created(count)
                    }
                    Err(e) => {
                        failed.push((path.clone(), e.to_string()));
                        UploadOutcome::Failed(e.to_string())
                    }
                }
            };
            on_progress(path, &outcome);
        }

        let mut attached_to = None;
        let mut attach_error = None;
        if let Some(id) = session {
            let ids: Vec<i64> = created.iter().map(|d| d.id).collect();
            if !ids.is_empty() {
                match self.api.add_documents(id, &ids).await {
                    Ok(()) => attached_to = Some(id),
                    Err(e) => {
                        tracing::warn!(
                            "Uploaded documents could not be attached to session {}: {}",
                            id,
                            e
                        );
                        attach_error = Some(e.to_string());
                    }
                }
            }
        }

        let (products, categories) = self.refresh_charts().await;

        UploadReport {
            created,
            skipped,
            failed,
            attached_to,
            attach_error,
            products,
            categories,
        }
    }
}
