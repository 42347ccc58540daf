//! Gallery uploads, listing and homepage highlights
//!
//! A collage upload is one row whose `url` holds every image URL joined by
//! commas; a plain upload creates one row per image.

use crate::cache::{get_or_load, SharedCache};
use crate::db::repositories::GalleryRepository;
use crate::models::{GalleryEntry, GalleryPhoto};
use crate::services::auth::Actor;
use crate::services::changes::{ChangeAction, ChangeFeed};
use crate::services::storage::{BatchResult, FileUpload, Storage, UploadFolder};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use super::error::{require, PortalError};

const TABLE: &str = "gallery";
const CACHE_KEY: &str = "gallery:all";

pub const DEFAULT_HIGHLIGHTS: usize = 5;

#[derive(Debug, Clone)]
pub struct GalleryUpload {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub collage: bool,
    pub files: Vec<FileUpload>,
}

/// Newest first by entry date, falling back to upload time
pub fn sort_gallery(entries: &mut [GalleryEntry]) {
    entries.sort_by(|a, b| {
        (b.sort_date(), b.created_at, b.id).cmp(&(a.sort_date(), a.created_at, a.id))
    });
}

/// Flatten every entry's URL list into single photos, newest first
pub fn flatten_highlights(mut entries: Vec<GalleryEntry>, limit: usize) -> Vec<GalleryPhoto> {
    sort_gallery(&mut entries);
    entries
        .iter()
        .flat_map(|entry| {
            entry.urls().into_iter().map(move |url| GalleryPhoto {
                entry_id: entry.id,
                title: entry.title.clone(),
                url: url.to_string(),
                uploader: entry.uploader.clone(),
                date: entry.sort_date(),
            })
        })
        .take(limit)
        .collect()
}

pub struct GalleryService {
    gallery_repo: Arc<dyn GalleryRepository>,
    storage: Arc<Storage>,
    cache: SharedCache,
    changes: ChangeFeed,
}

impl GalleryService {
    pub fn new(
        gallery_repo: Arc<dyn GalleryRepository>,
        storage: Arc<Storage>,
        cache: SharedCache,
        changes: ChangeFeed,
    ) -> Self {
        Self {
            gallery_repo,
            storage,
            cache,
            changes,
        }
    }

    async fn insert(&self, entry: GalleryEntry) -> Result<GalleryEntry, PortalError> {
        let entry = self.gallery_repo.create(&entry).await?;
        self.changes
            .publish(TABLE, ChangeAction::Insert, Some(entry.id))
            .await;
        Ok(entry)
    }

    /// Upload images and record them. Files that fail to store are reported
    /// individually; the rest are still saved.
    pub async fn add_images(
        &self,
        actor: &Actor,
        upload: GalleryUpload,
    ) -> Result<BatchResult<GalleryEntry>, PortalError> {
        require(&upload.title, "Title")?;
        if upload.files.is_empty() {
            return Err(PortalError::validation("At least one image is required"));
        }

        let title = upload.title.trim().to_string();
        let new_entry = |url: String| GalleryEntry {
            id: 0,
            title: title.clone(),
            url,
            uploader: actor.name().to_string(),
            date: upload.date,
            created_at: Utc::now(),
        };

        let mut result = BatchResult::new();
        let mut collage_urls = Vec::new();
        for file in &upload.files {
            let stored = match self.storage.store_upload(UploadFolder::Gallery, file).await {
                Ok(stored) => stored,
                Err(e) => {
                    result.fail(&file.file_name, e);
                    continue;
                }
            };

            if upload.collage {
                collage_urls.push(stored.url);
                continue;
            }
            match self.insert(new_entry(stored.url)).await {
                Ok(entry) => result.created.push(entry),
                Err(e) => result.fail(&file.file_name, e),
            }
        }

        if !collage_urls.is_empty() {
            result
                .created
                .push(self.insert(new_entry(collage_urls.join(","))).await?);
        }

        tracing::info!(
            "{} added {} gallery entries ({} failed)",
            actor.participant(),
            result.created.len(),
            result.failed.len()
        );
        Ok(result)
    }

    /// Admins may delete anything; interns only what they uploaded.
    pub async fn delete_image(&self, actor: &Actor, id: i64) -> Result<(), PortalError> {
        let entry = self
            .gallery_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Gallery entry {}", id)))?;

        if !actor.is_admin() && entry.uploader != actor.name() {
            return Err(PortalError::forbidden("You can only delete your own uploads"));
        }

        self.gallery_repo.delete(id).await?;
        for url in entry.urls() {
            if let Err(e) = self.storage.remove(url).await {
                tracing::warn!("Failed to remove {}: {}", url, e);
            }
        }

        self.changes.publish(TABLE, ChangeAction::Delete, Some(id)).await;
        Ok(())
    }

    pub async fn list_gallery(&self) -> Result<Vec<GalleryEntry>, PortalError> {
        let mut entries = get_or_load(&self.cache, CACHE_KEY, || async {
            Ok::<_, PortalError>(self.gallery_repo.list().await?)
        })
        .await?;
        sort_gallery(&mut entries);
        Ok(entries)
    }

    pub async fn highlights(&self, limit: usize) -> Result<Vec<GalleryPhoto>, PortalError> {
        Ok(flatten_highlights(self.list_gallery().await?, limit))
    }
}
