//! Public contact form and the staff inbox behind it

use crate::db::repositories::ContactRepository;
use crate::models::{ContactFilter, ContactMessage, ContactStatus, CreateContactInput};
use crate::services::auth::Actor;
use crate::services::changes::{ChangeAction, ChangeFeed};
use crate::services::email::{contact_reply, DynMailTransport};
use chrono::Utc;
use std::sync::Arc;

use super::error::{require, require_email, PortalError};

const TABLE: &str = "contact_messages";

pub struct ContactService {
    contact_repo: Arc<dyn ContactRepository>,
    mailer: DynMailTransport,
    reply_to: String,
    changes: ChangeFeed,
}

impl ContactService {
    pub fn new(
        contact_repo: Arc<dyn ContactRepository>,
        mailer: DynMailTransport,
        reply_to: impl Into<String>,
        changes: ChangeFeed,
    ) -> Self {
        Self {
            contact_repo,
            mailer,
            reply_to: reply_to.into(),
            changes,
        }
    }

    async fn get(&self, id: i64) -> Result<ContactMessage, PortalError> {
        self.contact_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Contact message {}", id)))
    }

    /// Submitted from the public site; no account needed
    pub async fn send_contact_message(
        &self,
        input: CreateContactInput,
    ) -> Result<ContactMessage, PortalError> {
        require(&input.student_id, "Student ID")?;
        require(&input.email, "Email")?;
        require(&input.message, "Message")?;
        require_email(&input.email)?;

        let message = ContactMessage {
            id: 0,
            student_id: input.student_id.trim().to_string(),
            email: input.email.trim().to_string(),
            message: input.message.trim().to_string(),
            status: ContactStatus::Pending,
            resolved_by: None,
            created_at: Utc::now(),
        };
        let message = self.contact_repo.create(&message).await?;

        tracing::info!("Contact message {} from {}", message.id, message.student_id);
        self.changes
            .publish(TABLE, ChangeAction::Insert, Some(message.id))
            .await;
        Ok(message)
    }

    pub async fn list_contact_messages(
        &self,
        _actor: &Actor,
        filter: ContactFilter,
    ) -> Result<Vec<ContactMessage>, PortalError> {
        let messages = self.contact_repo.list().await?;
        Ok(messages.into_iter().filter(|m| filter.matches(m)).collect())
    }

    pub async fn resolve(&self, actor: &Actor, id: i64) -> Result<ContactMessage, PortalError> {
        let message = self.get(id).await?;
        self.contact_repo.resolve(id, actor.name()).await?;

        tracing::info!("Contact message {} resolved by {}", id, actor.name());
        self.changes.publish(TABLE, ChangeAction::Update, Some(id)).await;
        Ok(ContactMessage {
            status: ContactStatus::Resolved,
            resolved_by: Some(actor.name().to_string()),
            ..message
        })
    }

    /// Email the reply, then resolve. A failed send leaves the message pending.
    pub async fn reply(
        &self,
        actor: &Actor,
        id: i64,
        text: &str,
    ) -> Result<ContactMessage, PortalError> {
        require(text, "Reply")?;
        let message = self.get(id).await?;

        let email = contact_reply(&message.email, &message.student_id, text.trim(), &self.reply_to);
        if let Err(e) = self.mailer.send(&email).await {
            tracing::error!("Reply to contact message {} failed: {}", id, e);
            return Err(e.into());
        }

        self.resolve(actor, id).await
    }

    pub async fn delete_contact_message(&self, _actor: &Actor, id: i64) -> Result<(), PortalError> {
        if !self.contact_repo.delete(id).await? {
            return Err(PortalError::not_found(format!("Contact message {}", id)));
        }
        self.changes.publish(TABLE, ChangeAction::Delete, Some(id)).await;
        Ok(())
    }
}
