//! Object storage on local disk
//!
//! Files land in `<upload.path>/<folder>/<millis>_<sanitized name>` and are
//! served back under `<public_prefix>/<folder>/...`. A name already on disk
//! is never overwritten; the next free `<millis>-<n>_<sanitized name>` is
//! used instead.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::config::UploadConfig;
use crate::models::string_enum;

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9.]").unwrap());
static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

/// Suffixes tried before giving up on a unique name
const MAX_NAME_ATTEMPTS: u32 = 1000;

string_enum! {
    /// Top-level directories uploads may go to
    pub enum UploadFolder {
        Gallery => "gallery",
        Submissions => "submissions",
        Documents => "documents",
        Logos => "logos",
        Photos => "photos",
        Docs => "docs",
    }
}

impl UploadFolder {
    /// Image folders accept only image types
    pub fn is_image_folder(&self) -> bool {
        matches!(
            self,
            UploadFolder::Gallery | UploadFolder::Logos | UploadFolder::Photos
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Unknown upload folder: {0}")]
    InvalidFolder(String),

    #[error("File type {content_type} is not allowed in {folder}")]
    UnsupportedType {
        content_type: String,
        folder: UploadFolder,
    },

    #[error("File too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("File is empty")]
    Empty,

    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

/// Replace anything outside `[a-zA-Z0-9.]` with `_` and collapse runs of `_`.
///
/// `"My Report (final).pdf"` becomes `"My_Report_final_.pdf"`.
pub fn sanitize_filename(name: &str) -> String {
    let replaced = UNSAFE_CHARS.replace_all(name, "_");
    UNDERSCORE_RUNS.replace_all(&replaced, "_").into_owned()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoredFile {
    pub url: String,
    pub file_name: String,
    pub size: u64,
    pub content_type: String,
}

/// A file received from a client, not yet stored
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedItem {
    pub file_name: String,
    pub error: String,
}

/// Outcome of a multi-file action; items succeed or fail independently
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult<T> {
    pub created: Vec<T>,
    pub failed: Vec<FailedItem>,
}

impl<T> BatchResult<T> {
    pub fn new() -> Self {
        Self {
            created: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn fail(&mut self, file_name: &str, error: impl std::fmt::Display) {
        tracing::warn!("Upload of {} failed: {}", file_name, error);
        self.failed.push(FailedItem {
            file_name: file_name.to_string(),
            error: error.to_string(),
        });
    }
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Storage {
    config: UploadConfig,
}

impl Storage {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    pub fn public_prefix(&self) -> &str {
        self.config.public_prefix.trim_end_matches('/')
    }

    pub fn root(&self) -> &PathBuf {
        &self.config.path
    }

    /// Validate and write one file, returning its public URL.
    pub async fn store(
        &self,
        folder: UploadFolder,
        original_name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredFile, StorageError> {
        let size = bytes.len() as u64;
        if size == 0 {
            return Err(StorageError::Empty);
        }
        if size > self.config.max_file_size {
            return Err(StorageError::TooLarge {
                size,
                max: self.config.max_file_size,
            });
        }

        // Drop parameters such as "; charset=utf-8"
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let allowed = if folder.is_image_folder() {
            self.config.is_image_type_allowed(&mime)
        } else {
            self.config.is_document_type_allowed(&mime)
        };
        if !allowed {
            return Err(StorageError::UnsupportedType {
                content_type: content_type.to_string(),
                folder,
            });
        }

        let dir = self.config.path.join(folder.as_str());
        fs::create_dir_all(&dir).await?;
        let (file_name, mut file) = create_unique(
            &dir,
            Utc::now().timestamp_millis(),
            &sanitize_filename(original_name),
        )
        .await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        tracing::info!("Stored {} ({} bytes) in {}", file_name, size, folder);
        Ok(StoredFile {
            url: format!("{}/{}/{}", self.public_prefix(), folder, file_name),
            file_name,
            size,
            content_type: mime,
        })
    }

    pub async fn store_upload(
        &self,
        folder: UploadFolder,
        upload: &FileUpload,
    ) -> Result<StoredFile, StorageError> {
        self.store(folder, &upload.file_name, &upload.bytes, &upload.content_type)
            .await
    }

    /// Delete a previously stored file by its public URL.
    ///
    /// URLs outside the public prefix, or that try to climb out of it, are ignored.
    pub async fn remove(&self, url: &str) -> Result<bool, StorageError> {
        let Some(relative) = url
            .strip_prefix(self.public_prefix())
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return Ok(false);
        };
        if relative.split('/').any(|part| part == ".." || part.is_empty()) {
            return Ok(false);
        }

        match fs::remove_file(self.config.path.join(relative)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Create a file that did not exist before, bumping the suffix on collision.
async fn create_unique(
    dir: &Path,
    millis: i64,
    clean: &str,
) -> Result<(String, File), StorageError> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let file_name = if attempt == 0 {
            format!("{}_{}", millis, clean)
        } else {
            format!("{}-{}_{}", millis, attempt, clean)
        };
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&file_name))
            .await
        {
            Ok(file) => return Ok((file_name, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free name for {} in {}", clean, dir.display()),
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn storage(dir: &tempfile::TempDir) -> Storage {
        Storage::new(UploadConfig {
            path: dir.path().to_path_buf(),
            max_file_size: 16,
            ..UploadConfig::default()
        })
    }

    #[test]
    fn test_sanitize_examples() {
        assert_eq!(sanitize_filename("My Report (final).pdf"), "My_Report_final_.pdf");
        assert_eq!(sanitize_filename("a__b  c.png"), "a_b_c.png");
        assert_eq!(sanitize_filename("café.jpg"), "caf_.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
    }

    #[test]
    fn test_folder_kinds() {
        assert!("Gallery".parse::<UploadFolder>().unwrap().is_image_folder());
        assert!(!UploadFolder::Docs.is_image_folder());
        assert!("avatars".parse::<UploadFolder>().is_err());
    }

    #[tokio::test]
    async fn test_store_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        let stored = storage
            .store(UploadFolder::Documents, "offer letter.pdf", b"%PDF-1.4", "application/pdf")
            .await
            .unwrap();

        assert!(stored.url.starts_with("/uploads/documents/"));
        assert!(stored.file_name.ends_with("_offer_letter.pdf"));
        assert_eq!(stored.size, 8);
        assert!(dir.path().join("documents").join(&stored.file_name).exists());

        assert!(storage.remove(&stored.url).await.unwrap());
        assert!(!storage.remove(&stored.url).await.unwrap());
        assert!(!storage.remove("/uploads/../secret").await.unwrap());
        assert!(!storage.remove("https://elsewhere/x.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        let pdf_in_gallery = storage
            .store(UploadFolder::Gallery, "x.pdf", b"%PDF", "application/pdf")
            .await;
        assert!(matches!(pdf_in_gallery, Err(StorageError::UnsupportedType { .. })));

        let too_big = storage
            .store(UploadFolder::Gallery, "x.png", &[0u8; 17], "image/png")
            .await;
        assert!(matches!(too_big, Err(StorageError::TooLarge { size: 17, max: 16 })));

        let empty = storage.store(UploadFolder::Docs, "x.pdf", b"", "application/pdf").await;
        assert!(matches!(empty, Err(StorageError::Empty)));

        // Image types are also valid documents; parameters are ignored
        assert!(storage
            .store(UploadFolder::Submissions, "shot.png", b"png", "image/png; q=1")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_same_name_uploads_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        let mut urls = std::collections::HashSet::new();
        for round in 0..20u8 {
            let first = storage
                .store(UploadFolder::Gallery, "photo.png", &[b'A', round], "image/png")
                .await
                .unwrap();
            let second = storage
                .store(UploadFolder::Gallery, "photo.png", &[b'B', round], "image/png")
                .await
                .unwrap();
            assert_ne!(first.url, second.url);

            let gallery = dir.path().join("gallery");
            assert_eq!(std::fs::read(gallery.join(&first.file_name)).unwrap(), vec![b'A', round]);
            assert_eq!(std::fs::read(gallery.join(&second.file_name)).unwrap(), vec![b'B', round]);
            assert!(urls.insert(first.url));
            assert!(urls.insert(second.url));
        }
    }

    #[tokio::test]
    async fn test_create_unique_bumps_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("42_a.png"), b"old").unwrap();
        std::fs::write(dir.path().join("42-1_a.png"), b"old").unwrap();

        let (name, _file) = create_unique(dir.path(), 42, "a.png").await.unwrap();
        assert_eq!(name, "42-2_a.png");
        assert_eq!(std::fs::read(dir.path().join("42_a.png")).unwrap(), b"old");
    }

    proptest! {
        #[test]
        fn prop_sanitized_names_are_safe(name in "\\PC{0,40}") {
            let clean = sanitize_filename(&name);
            prop_assert!(clean.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_'));
            prop_assert!(!clean.contains("__"));
            prop_assert!(!clean.contains('/'));
        }
    }
}
