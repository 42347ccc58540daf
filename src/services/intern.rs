//! Intern roster management

use crate::db::repositories::{InternRepository, MessageRepository, SessionRepository};
use crate::models::{CreateInternInput, Intern, InternStatus, Participant};
use crate::services::changes::{ChangeAction, ChangeFeed};
use crate::services::password::hash_password;
use chrono::Utc;
use std::sync::Arc;

use super::error::{require, require_email, PortalError};

const TABLE: &str = "interns";

pub struct InternService {
    intern_repo: Arc<dyn InternRepository>,
    session_repo: Arc<dyn SessionRepository>,
    message_repo: Arc<dyn MessageRepository>,
    changes: ChangeFeed,
    default_password: String,
}

impl InternService {
    pub fn new(
        intern_repo: Arc<dyn InternRepository>,
        session_repo: Arc<dyn SessionRepository>,
        message_repo: Arc<dyn MessageRepository>,
        changes: ChangeFeed,
        default_password: String,
    ) -> Self {
        Self {
            intern_repo,
            session_repo,
            message_repo,
            changes,
            default_password,
        }
    }

    /// Add an intern with the default password and `Active` status
    pub async fn add_intern(&self, input: CreateInternInput) -> Result<Intern, PortalError> {
        require(&input.name, "Name")?;
        require(&input.email, "Email")?;
        require_email(&input.email)?;

        let email = input.email.trim();
        if self.intern_repo.get_by_email(email).await?.is_some() {
            return Err(PortalError::Conflict(format!(
                "An intern with email '{}' already exists",
                email
            )));
        }

        let intern = Intern {
            id: 0,
            name: input.name.trim().to_string(),
            email: email.to_string(),
            branch: input.branch.trim().to_string(),
            year: input.year.trim().to_string(),
            status: InternStatus::Active,
            password_hash: hash_password(&self.default_password)?,
            created_at: Utc::now(),
        };
        let intern = self.intern_repo.create(&intern).await?;

        tracing::info!("Added intern {} ({})", intern.id, intern.email);
        self.changes
            .publish(TABLE, ChangeAction::Insert, Some(intern.id))
            .await;
        Ok(intern)
    }

    pub async fn get(&self, id: i64) -> Result<Intern, PortalError> {
        self.intern_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Intern {}", id)))
    }

    /// Remove an intern along with their sessions, chat history and the read
    /// cursors on their conversations.
    ///
    /// Tasks stay, unassigned; submissions, documents and dismissals cascade.
    pub async fn remove_intern(&self, id: i64) -> Result<(), PortalError> {
        let participant = Participant::Intern(id);
        if !self.intern_repo.delete(id).await? {
            return Err(PortalError::not_found(format!("Intern {}", id)));
        }
        self.session_repo.delete_by_principal(participant).await?;
        let removed = self.message_repo.delete_involving(participant).await?;
        self.message_repo
            .delete_cursors_involving(participant)
            .await?;

        tracing::info!("Removed intern {} and {} messages", id, removed);
        self.changes.publish(TABLE, ChangeAction::Delete, Some(id)).await;
        Ok(())
    }

    /// Roster, newest first, optionally filtered by name or email
    pub async fn list_interns(&self, search: Option<&str>) -> Result<Vec<Intern>, PortalError> {
        let interns = self.intern_repo.list().await?;
        Ok(match search {
            Some(query) => interns
                .into_iter()
                .filter(|i| i.matches_search(query))
                .collect(),
            None => interns,
        })
    }

    pub async fn set_intern_status(
        &self,
        id: i64,
        status: InternStatus,
    ) -> Result<Intern, PortalError> {
        if !self.intern_repo.update_status(id, status).await? {
            return Err(PortalError::not_found(format!("Intern {}", id)));
        }
        if status == InternStatus::Inactive {
            self.session_repo
                .delete_by_principal(Participant::Intern(id))
                .await?;
        }

        tracing::info!("Intern {} is now {}", id, status);
        self.changes.publish(TABLE, ChangeAction::Update, Some(id)).await;
        self.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::password::verify_password;
    use crate::services::test_support::TestContext;

    fn input(name: &str, email: &str) -> CreateInternInput {
        CreateInternInput {
            name: name.to_string(),
            email: email.to_string(),
            branch: "CSE".to_string(),
            year: "E3".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_intern_defaults() {
        let ctx = TestContext::new().await;
        let service = ctx.intern_service();

        let intern = service
            .add_intern(input(" Asha ", "asha@rgukt.ac.in"))
            .await
            .unwrap();

        assert_eq!(intern.name, "Asha");
        assert_eq!(intern.status, InternStatus::Active);
        assert!(verify_password("123", &intern.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_add_intern_validation_and_conflict() {
        let ctx = TestContext::new().await;
        let service = ctx.intern_service();

        assert!(matches!(
            service.add_intern(input("", "a@x.com")).await,
            Err(PortalError::Validation(_))
        ));
        assert!(matches!(
            service.add_intern(input("A", "not-an-email")).await,
            Err(PortalError::Validation(_))
        ));

        service.add_intern(input("A", "a@x.com")).await.unwrap();
        assert!(matches!(
            service.add_intern(input("B", "A@x.com")).await,
            Err(PortalError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_search_and_status() {
        let ctx = TestContext::new().await;
        let service = ctx.intern_service();
        let asha = service.add_intern(input("Asha Rao", "asha@x.com")).await.unwrap();
        service.add_intern(input("Ravi Kumar", "ravi@x.com")).await.unwrap();

        let found = service.list_interns(Some("RAO")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, asha.id);
        assert_eq!(service.list_interns(None).await.unwrap().len(), 2);

        let updated = service
            .set_intern_status(asha.id, InternStatus::Inactive)
            .await
            .unwrap();
        assert!(!updated.is_active());

        assert!(matches!(
            service.set_intern_status(999, InternStatus::Active).await,
            Err(PortalError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_intern_publishes_change() {
        let ctx = TestContext::new().await;
        let service = ctx.intern_service();
        let intern = service.add_intern(input("A", "a@x.com")).await.unwrap();
        let other = service.add_intern(input("B", "b@x.com")).await.unwrap();
        let admin = ctx.seed_admin().await;
        let team = format!("team:{}", intern.id);
        let peer = format!("peer:{}:{}", intern.id, other.id);
        let mut rx = ctx.changes.subscribe();

        let repo = &ctx.message_repo;
        repo.set_read_cursor(Participant::Intern(intern.id), &team, 3).await.unwrap();
        repo.set_read_cursor(Participant::Admin(admin.id), &team, 3).await.unwrap();
        repo.set_read_cursor(Participant::Intern(other.id), &peer, 5).await.unwrap();
        repo.set_read_cursor(Participant::Admin(admin.id), &format!("team:{}", other.id), 2)
            .await
            .unwrap();

        service.remove_intern(intern.id).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.table, "interns");
        assert_eq!(event.action, ChangeAction::Delete);

        assert!(repo
            .read_cursors(Participant::Intern(intern.id))
            .await
            .unwrap()
            .is_empty());
        assert!(repo
            .read_cursors(Participant::Intern(other.id))
            .await
            .unwrap()
            .is_empty());
        let admin_cursors = repo.read_cursors(Participant::Admin(admin.id)).await.unwrap();
        assert_eq!(admin_cursors.len(), 1);
        assert!(admin_cursors.contains_key(&format!("team:{}", other.id)));
        assert!(matches!(
            service.remove_intern(intern.id).await,
            Err(PortalError::NotFound(_))
        ));
    }
}
