//! Admin notifications with per-intern dismissal

use crate::db::repositories::NotificationRepository;
use crate::models::{CreateNotificationInput, Notification, NotificationKind, URGENT_BROADCAST_SUBJECT};
use crate::services::auth::Actor;
use crate::services::changes::{ChangeAction, ChangeFeed};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

use super::error::{require, PortalError};

const TABLE: &str = "notifications";

pub struct NotificationService {
    notification_repo: Arc<dyn NotificationRepository>,
    changes: ChangeFeed,
}

impl NotificationService {
    pub fn new(notification_repo: Arc<dyn NotificationRepository>, changes: ChangeFeed) -> Self {
        Self {
            notification_repo,
            changes,
        }
    }

    pub async fn add_notification(
        &self,
        actor: &Actor,
        input: CreateNotificationInput,
    ) -> Result<Notification, PortalError> {
        actor.require_admin()?;
        require(&input.subject, "Subject")?;
        require(&input.message, "Message")?;

        let notification = Notification {
            id: 0,
            subject: input.subject.trim().to_string(),
            kind: input.kind,
            message: input.message.trim().to_string(),
            created_at: Utc::now(),
        };
        let notification = self.notification_repo.create(&notification).await?;

        tracing::info!("Notification {} ({}) posted", notification.id, notification.kind);
        self.changes
            .publish(TABLE, ChangeAction::Insert, Some(notification.id))
            .await;
        Ok(notification)
    }

    /// Preset urgent alert sent to every intern
    pub async fn broadcast_urgent(
        &self,
        actor: &Actor,
        message: &str,
    ) -> Result<Notification, PortalError> {
        self.add_notification(
            actor,
            CreateNotificationInput {
                subject: URGENT_BROADCAST_SUBJECT.to_string(),
                kind: NotificationKind::Urgent,
                message: message.to_string(),
            },
        )
        .await
    }

    pub async fn delete_notification(&self, actor: &Actor, id: i64) -> Result<(), PortalError> {
        actor.require_admin()?;
        if !self.notification_repo.delete(id).await? {
            return Err(PortalError::not_found(format!("Notification {}", id)));
        }
        self.changes.publish(TABLE, ChangeAction::Delete, Some(id)).await;
        Ok(())
    }

    pub async fn list_notifications(&self) -> Result<Vec<Notification>, PortalError> {
        Ok(self.notification_repo.list().await?)
    }

    pub async fn dismiss(&self, actor: &Actor, notification_id: i64) -> Result<(), PortalError> {
        let intern = actor.require_intern()?;
        if self.notification_repo.get_by_id(notification_id).await?.is_none() {
            return Err(PortalError::not_found(format!("Notification {}", notification_id)));
        }
        self.notification_repo.dismiss(intern.id, notification_id).await?;
        Ok(())
    }

    /// Everything the intern has not dismissed, newest first
    pub async fn visible_notifications(
        &self,
        actor: &Actor,
    ) -> Result<Vec<Notification>, PortalError> {
        let intern = actor.require_intern()?;
        let dismissed: HashSet<i64> = self
            .notification_repo
            .dismissed_ids(intern.id)
            .await?
            .into_iter()
            .collect();

        Ok(self
            .notification_repo
            .list()
            .await?
            .into_iter()
            .filter(|n| !dismissed.contains(&n.id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::TestContext;

    fn info(subject: &str) -> CreateNotificationInput {
        CreateNotificationInput {
            subject: subject.to_string(),
            kind: NotificationKind::Info,
            message: "Details inside".to_string(),
        }
    }

    #[tokio::test]
    async fn test_only_admins_post() {
        let ctx = TestContext::new().await;
        let service = ctx.notification_service();
        let asha = ctx.intern_actor("Asha", "asha@x.com").await;

        let result = service.add_notification(&asha, info("Hello")).await;
        assert!(matches!(result, Err(PortalError::Forbidden(_))));

        let admin = ctx.admin_actor().await;
        let result = service.add_notification(&admin, info("  ")).await;
        assert!(matches!(result, Err(PortalError::Validation(_))));
    }

    #[tokio::test]
    async fn test_urgent_broadcast_preset() {
        let ctx = TestContext::new().await;
        let service = ctx.notification_service();
        let admin = ctx.admin_actor().await;

        let n = service
            .broadcast_urgent(&admin, "Submit reports by Friday")
            .await
            .unwrap();
        assert_eq!(n.subject, URGENT_BROADCAST_SUBJECT);
        assert_eq!(n.kind, NotificationKind::Urgent);
    }

    #[tokio::test]
    async fn test_dismissal_is_per_intern() {
        let ctx = TestContext::new().await;
        let service = ctx.notification_service();
        let admin = ctx.admin_actor().await;
        let asha = ctx.intern_actor("Asha", "asha@x.com").await;
        let ravi = ctx.intern_actor("Ravi", "ravi@x.com").await;

        let first = service.add_notification(&admin, info("First")).await.unwrap();
        service.add_notification(&admin, info("Second")).await.unwrap();

        service.dismiss(&asha, first.id).await.unwrap();
        service.dismiss(&asha, first.id).await.unwrap();

        assert_eq!(service.visible_notifications(&asha).await.unwrap().len(), 1);
        assert_eq!(service.visible_notifications(&ravi).await.unwrap().len(), 2);
        assert_eq!(service.list_notifications().await.unwrap().len(), 2);

        assert!(matches!(
            service.dismiss(&asha, 999).await,
            Err(PortalError::NotFound(_))
        ));
    }
}
