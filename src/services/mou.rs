//! Memoranda of understanding with partner organisations

use crate::cache::{get_or_load, SharedCache};
use crate::db::repositories::MouRepository;
use crate::models::{CreateMouInput, Mou};
use crate::services::auth::Actor;
use crate::services::changes::{ChangeAction, ChangeFeed};
use crate::services::storage::{FileUpload, Storage, UploadFolder};
use chrono::Utc;
use std::sync::Arc;

use super::error::{require, PortalError};

const TABLE: &str = "mous";
const CACHE_KEY: &str = "mous:all";

/// Optional files attached to a new MoU
#[derive(Debug, Clone, Default)]
pub struct MouFiles {
    pub logo: Option<FileUpload>,
    pub photo: Option<FileUpload>,
    pub doc: Option<FileUpload>,
}

pub struct MouService {
    mou_repo: Arc<dyn MouRepository>,
    storage: Arc<Storage>,
    cache: SharedCache,
    changes: ChangeFeed,
}

impl MouService {
    pub fn new(
        mou_repo: Arc<dyn MouRepository>,
        storage: Arc<Storage>,
        cache: SharedCache,
        changes: ChangeFeed,
    ) -> Self {
        Self {
            mou_repo,
            storage,
            cache,
            changes,
        }
    }

    async fn upload(
        &self,
        folder: UploadFolder,
        file: Option<&FileUpload>,
    ) -> Result<Option<String>, PortalError> {
        match file {
            Some(file) => Ok(Some(self.storage.store_upload(folder, file).await?.url)),
            None => Ok(None),
        }
    }

    pub async fn add_mou(
        &self,
        actor: &Actor,
        input: CreateMouInput,
        files: MouFiles,
    ) -> Result<Mou, PortalError> {
        actor.require_admin()?;
        require(&input.partner, "Partner")?;
        require(&input.scope, "Scope")?;

        let logo_url = self.upload(UploadFolder::Logos, files.logo.as_ref()).await?;
        let photo_url = self.upload(UploadFolder::Photos, files.photo.as_ref()).await?;
        let doc_url = self.upload(UploadFolder::Docs, files.doc.as_ref()).await?;

        let mou = Mou {
            id: 0,
            partner: input.partner.trim().to_string(),
            scope: input.scope.trim().to_string(),
            date: input.date,
            duration: input.duration.trim().to_string(),
            status: input.status.trim().to_string(),
            description: input.description.trim().to_string(),
            logo_url,
            photo_url,
            doc_url,
            created_at: Utc::now(),
        };
        let mou = self.mou_repo.create(&mou).await?;

        tracing::info!("MoU {} with {} added", mou.id, mou.partner);
        self.changes.publish(TABLE, ChangeAction::Insert, Some(mou.id)).await;
        Ok(mou)
    }

    pub async fn delete_mou(&self, actor: &Actor, id: i64) -> Result<(), PortalError> {
        actor.require_admin()?;
        let mou = self
            .mou_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("MoU {}", id)))?;

        self.mou_repo.delete(id).await?;
        for url in [&mou.logo_url, &mou.photo_url, &mou.doc_url].into_iter().flatten() {
            if let Err(e) = self.storage.remove(url).await {
                tracing::warn!("Failed to remove {}: {}", url, e);
            }
        }

        self.changes.publish(TABLE, ChangeAction::Delete, Some(id)).await;
        Ok(())
    }

    /// Public listing filtered by partner/scope search and status
    pub async fn list_mous(
        &self,
        search: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<Mou>, PortalError> {
        let mous = get_or_load(&self.cache, CACHE_KEY, || async {
            Ok::<_, PortalError>(self.mou_repo.list().await?)
        })
        .await?;

        let search = search.unwrap_or_default();
        Ok(mous
            .into_iter()
            .filter(|m| m.matches_search(search) && m.matches_status(status))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::StorageError;
    use crate::services::test_support::TestContext;

    fn input(partner: &str, scope: &str, status: &str) -> CreateMouInput {
        CreateMouInput {
            partner: partner.to_string(),
            scope: scope.to_string(),
            status: status.to_string(),
            duration: "3 Years".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_with_files_and_filter() {
        let ctx = TestContext::new().await;
        let service = ctx.mou_service();
        let admin = ctx.admin_actor().await;

        let files = MouFiles {
            logo: Some(FileUpload {
                file_name: "nxp logo.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: b"\x89PNG".to_vec(),
            }),
            doc: Some(FileUpload {
                file_name: "agreement.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                bytes: b"%PDF".to_vec(),
            }),
            photo: None,
        };
        let mou = service
            .add_mou(&admin, input("NXP", "VLSI training", "Active"), files)
            .await
            .unwrap();
        assert!(mou.logo_url.as_deref().unwrap().starts_with("/uploads/logos/"));
        assert!(mou.doc_url.as_deref().unwrap().starts_with("/uploads/docs/"));
        assert!(mou.photo_url.is_none());

        service
            .add_mou(&admin, input("Ceremorphic", "AI research", "Expired"), MouFiles::default())
            .await
            .unwrap();

        assert_eq!(service.list_mous(None, Some("All")).await.unwrap().len(), 2);
        assert_eq!(service.list_mous(Some("vlsi"), None).await.unwrap().len(), 1);
        let expired = service.list_mous(None, Some("expired")).await.unwrap();
        assert_eq!(expired[0].partner, "Ceremorphic");
    }

    #[tokio::test]
    async fn test_logo_must_be_an_image() {
        let ctx = TestContext::new().await;
        let service = ctx.mou_service();
        let admin = ctx.admin_actor().await;

        let files = MouFiles {
            logo: Some(FileUpload {
                file_name: "logo.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                bytes: b"%PDF".to_vec(),
            }),
            ..Default::default()
        };
        let result = service.add_mou(&admin, input("NXP", "VLSI", "Active"), files).await;
        assert!(matches!(
            result,
            Err(PortalError::Storage(StorageError::UnsupportedType { .. }))
        ));
    }

    #[tokio::test]
    async fn test_delete_invalidates_listing() {
        let ctx = TestContext::new().await;
        let service = ctx.mou_service();
        let admin = ctx.admin_actor().await;
        let asha = ctx.intern_actor("Asha", "asha@x.com").await;

        let mou = service
            .add_mou(&admin, input("NXP", "VLSI", "Active"), MouFiles::default())
            .await
            .unwrap();
        assert_eq!(service.list_mous(None, None).await.unwrap().len(), 1);

        assert!(matches!(
            service.delete_mou(&asha, mou.id).await,
            Err(PortalError::Forbidden(_))
        ));
        service.delete_mou(&admin, mou.id).await.unwrap();
        assert!(service.list_mous(None, None).await.unwrap().is_empty());
    }
}
