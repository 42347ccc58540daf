//! Documents delivered to one intern or to every intern

use crate::db::repositories::{DocumentRepository, InternRepository};
use crate::models::{format_size_kb, CreateDocumentInput, Document, ALL_INTERNS_LABEL};
use crate::services::auth::Actor;
use crate::services::changes::{ChangeAction, ChangeFeed};
use crate::services::storage::{FileUpload, Storage, UploadFolder};
use chrono::Utc;
use std::sync::Arc;

use super::error::{require, PortalError};

const TABLE: &str = "documents";

pub struct DocumentService {
    document_repo: Arc<dyn DocumentRepository>,
    intern_repo: Arc<dyn InternRepository>,
    storage: Arc<Storage>,
    changes: ChangeFeed,
}

impl DocumentService {
    pub fn new(
        document_repo: Arc<dyn DocumentRepository>,
        intern_repo: Arc<dyn InternRepository>,
        storage: Arc<Storage>,
        changes: ChangeFeed,
    ) -> Self {
        Self {
            document_repo,
            intern_repo,
            storage,
            changes,
        }
    }

    pub async fn add_document(
        &self,
        actor: &Actor,
        input: CreateDocumentInput,
        file: FileUpload,
    ) -> Result<Document, PortalError> {
        actor.require_admin()?;
        require(&input.title, "Title")?;

        let assigned_name = match input.assigned_to {
            Some(id) => {
                self.intern_repo
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| PortalError::validation(format!("Unknown intern {}", id)))?
                    .name
            }
            None => ALL_INTERNS_LABEL.to_string(),
        };

        let stored = self.storage.store_upload(UploadFolder::Documents, &file).await?;
        let document = Document {
            id: 0,
            title: input.title.trim().to_string(),
            assigned_to: input.assigned_to,
            assigned_name,
            file_url: stored.url,
            size: format_size_kb(stored.size),
            created_at: Utc::now(),
        };
        let document = self.document_repo.create(&document).await?;

        tracing::info!(
            "Document {} shared with {}",
            document.id,
            document.assigned_name
        );
        self.changes
            .publish(TABLE, ChangeAction::Insert, Some(document.id))
            .await;
        Ok(document)
    }

    pub async fn delete_document(&self, actor: &Actor, id: i64) -> Result<(), PortalError> {
        actor.require_admin()?;
        let document = self
            .document_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Document {}", id)))?;

        self.document_repo.delete(id).await?;
        if let Err(e) = self.storage.remove(&document.file_url).await {
            tracing::warn!("Failed to remove {}: {}", document.file_url, e);
        }

        self.changes.publish(TABLE, ChangeAction::Delete, Some(id)).await;
        Ok(())
    }

    pub async fn list_documents(&self, actor: &Actor) -> Result<Vec<Document>, PortalError> {
        actor.require_admin()?;
        Ok(self.document_repo.list().await?)
    }

    /// Documents addressed to the caller or to all interns
    pub async fn my_documents(&self, actor: &Actor) -> Result<Vec<Document>, PortalError> {
        let intern = actor.require_intern()?;
        Ok(self.document_repo.list_for_intern(intern.id).await?)
    }
}
