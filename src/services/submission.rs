//! Intern work submissions and their review threads

use crate::db::repositories::SubmissionRepository;
use crate::models::{CommentRole, Submission, SubmissionComment, SubmissionStatus};
use crate::services::auth::Actor;
use crate::services::changes::{ChangeAction, ChangeFeed};
use crate::services::storage::{BatchResult, FileUpload, Storage, UploadFolder};
use chrono::Utc;
use std::sync::Arc;

use super::error::{require, PortalError};

const TABLE: &str = "submissions";

pub struct SubmissionService {
    submission_repo: Arc<dyn SubmissionRepository>,
    storage: Arc<Storage>,
    changes: ChangeFeed,
}

impl SubmissionService {
    pub fn new(
        submission_repo: Arc<dyn SubmissionRepository>,
        storage: Arc<Storage>,
        changes: ChangeFeed,
    ) -> Self {
        Self {
            submission_repo,
            storage,
            changes,
        }
    }

    /// Load a submission the actor may see: admins see all, interns their own
    async fn get_visible(&self, actor: &Actor, id: i64) -> Result<Submission, PortalError> {
        let submission = self
            .submission_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Submission {}", id)))?;

        match actor.intern_id() {
            Some(intern_id) if submission.intern_id != intern_id => {
                Err(PortalError::forbidden("Submission belongs to another intern"))
            }
            _ => Ok(submission),
        }
    }

    /// Upload each file and record one submission per file
    pub async fn submit_work(
        &self,
        actor: &Actor,
        title: &str,
        files: Vec<FileUpload>,
    ) -> Result<BatchResult<Submission>, PortalError> {
        let intern = actor.require_intern()?;
        require(title, "Title")?;
        if files.is_empty() {
            return Err(PortalError::validation("At least one file is required"));
        }

        let mut result = BatchResult::new();
        for file in &files {
            let stored = match self.storage.store_upload(UploadFolder::Submissions, file).await {
                Ok(stored) => stored,
                Err(e) => {
                    result.fail(&file.file_name, e);
                    continue;
                }
            };

            let submission = Submission {
                id: 0,
                intern_id: intern.id,
                intern_name: intern.name.clone(),
                title: title.trim().to_string(),
                file_name: file.file_name.clone(),
                file_url: stored.url,
                status: SubmissionStatus::Pending,
                created_at: Utc::now(),
            };
            match self.submission_repo.create(&submission).await {
                Ok(created) => {
                    self.changes
                        .publish(TABLE, ChangeAction::Insert, Some(created.id))
                        .await;
                    result.created.push(created);
                }
                Err(e) => result.fail(&file.file_name, e),
            }
        }

        tracing::info!(
            "Intern {} submitted {} files ({} failed)",
            intern.id,
            result.created.len(),
            result.failed.len()
        );
        Ok(result)
    }

    pub async fn list_submissions(&self, actor: &Actor) -> Result<Vec<Submission>, PortalError> {
        actor.require_admin()?;
        Ok(self.submission_repo.list().await?)
    }

    pub async fn my_submissions(&self, actor: &Actor) -> Result<Vec<Submission>, PortalError> {
        let intern = actor.require_intern()?;
        Ok(self.submission_repo.list_by_intern(intern.id).await?)
    }

    pub async fn mark_reviewed(&self, actor: &Actor, id: i64) -> Result<Submission, PortalError> {
        actor.require_admin()?;
        let submission = self.get_visible(actor, id).await?;
        self.submission_repo
            .update_status(id, SubmissionStatus::Reviewed)
            .await?;

        self.changes.publish(TABLE, ChangeAction::Update, Some(id)).await;
        Ok(Submission {
            status: SubmissionStatus::Reviewed,
            ..submission
        })
    }

    pub async fn add_submission_comment(
        &self,
        actor: &Actor,
        id: i64,
        text: &str,
    ) -> Result<SubmissionComment, PortalError> {
        require(text, "Comment")?;
        self.get_visible(actor, id).await?;

        let role = if actor.is_admin() {
            CommentRole::Admin
        } else {
            CommentRole::Intern
        };
        let comment = SubmissionComment {
            id: 0,
            submission_id: id,
            sender: actor.name().to_string(),
            role,
            text: text.trim().to_string(),
            created_at: Utc::now(),
        };
        let comment = self.submission_repo.add_comment(&comment).await?;

        self.changes.publish(TABLE, ChangeAction::Update, Some(id)).await;
        Ok(comment)
    }

    pub async fn list_submission_comments(
        &self,
        actor: &Actor,
        id: i64,
    ) -> Result<Vec<SubmissionComment>, PortalError> {
        self.get_visible(actor, id).await?;
        Ok(self.submission_repo.list_comments(id).await?)
    }
}
