//! Dashboard counters for admins and interns

use crate::db::repositories::{
    ContactRepository, EventRepository, InternRepository, SubmissionRepository, TaskRepository,
};
use crate::models::{ContactStatus, EventStatus, InternStatus, SubmissionStatus, TaskStatus};
use crate::services::auth::Actor;
use crate::services::messaging::MessagingService;
use crate::services::notification::NotificationService;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

use super::error::PortalError;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AdminStats {
    pub total_interns: i64,
    pub active_interns: i64,
    /// Tasks not yet completed
    pub active_tasks: i64,
    pub pending_submissions: i64,
    pub resolved_queries: i64,
    pub pending_queries: i64,
    pub events_running: i64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TaskCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct InternOverview {
    pub tasks: TaskCounts,
    pub pending_submissions: usize,
    pub notifications: usize,
    pub unread_messages: usize,
}

pub struct DashboardService {
    intern_repo: Arc<dyn InternRepository>,
    task_repo: Arc<dyn TaskRepository>,
    submission_repo: Arc<dyn SubmissionRepository>,
    contact_repo: Arc<dyn ContactRepository>,
    event_repo: Arc<dyn EventRepository>,
    notifications: Arc<NotificationService>,
    messaging: Arc<MessagingService>,
}

impl DashboardService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        intern_repo: Arc<dyn InternRepository>,
        task_repo: Arc<dyn TaskRepository>,
        submission_repo: Arc<dyn SubmissionRepository>,
        contact_repo: Arc<dyn ContactRepository>,
        event_repo: Arc<dyn EventRepository>,
        notifications: Arc<NotificationService>,
        messaging: Arc<MessagingService>,
    ) -> Self {
        Self {
            intern_repo,
            task_repo,
            submission_repo,
            contact_repo,
            event_repo,
            notifications,
            messaging,
        }
    }

    pub async fn admin_stats(&self, actor: &Actor, today: NaiveDate) -> Result<AdminStats, PortalError> {
        actor.require_admin()?;

        let events_running = self
            .event_repo
            .list()
            .await?
            .iter()
            .filter(|e| e.status_on(today) == Some(EventStatus::Running))
            .count() as i64;

        Ok(AdminStats {
            total_interns: self.intern_repo.count_by_status(None).await?,
            active_interns: self
                .intern_repo
                .count_by_status(Some(InternStatus::Active))
                .await?,
            active_tasks: self.task_repo.count_active().await?,
            pending_submissions: self
                .submission_repo
                .count_by_status(SubmissionStatus::Pending)
                .await?,
            resolved_queries: self
                .contact_repo
                .count_by_status(ContactStatus::Resolved)
                .await?,
            pending_queries: self
                .contact_repo
                .count_by_status(ContactStatus::Pending)
                .await?,
            events_running,
        })
    }

    pub async fn intern_overview(&self, actor: &Actor) -> Result<InternOverview, PortalError> {
        let intern = actor.require_intern()?;

        let mut tasks = TaskCounts::default();
        for task in self.task_repo.list_by_intern(intern.id).await? {
            match task.status {
                TaskStatus::Pending => tasks.pending += 1,
                TaskStatus::InProgress => tasks.in_progress += 1,
                TaskStatus::Completed => tasks.completed += 1,
            }
        }

        let pending_submissions = self
            .submission_repo
            .list_by_intern(intern.id)
            .await?
            .iter()
            .filter(|s| s.status == SubmissionStatus::Pending)
            .count();

        Ok(InternOverview {
            tasks,
            pending_submissions,
            notifications: self.notifications.visible_notifications(actor).await?.len(),
            unread_messages: self.messaging.unread_summary(actor).await?.total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateContactInput, CreateNotificationInput, CreateTaskInput, Participant, TaskPriority};
    use crate::services::email::RecordingMailer;
    use crate::services::test_support::TestContext;
    use chrono::Utc;

    #[tokio::test]
    async fn test_admin_stats() {
        let ctx = TestContext::new().await;
        let dashboard = ctx.dashboard_service();
        let admin = ctx.admin_actor().await;
        let asha = ctx.intern_actor("Asha", "asha@x.com").await;
        let ravi = ctx.intern_actor("Ravi", "ravi@x.com").await;
        ctx.intern_service()
            .set_intern_status(ravi.intern_id().unwrap(), InternStatus::Inactive)
            .await
            .unwrap();

        let tasks = ctx.task_service();
        let task = tasks
            .add_task(
                &admin,
                CreateTaskInput {
                    title: "Report".to_string(),
                    description: String::new(),
                    assigned_to: asha.intern_id().unwrap(),
                    due_date: None,
                    priority: TaskPriority::Low,
                },
            )
            .await
            .unwrap();
        tasks
            .update_task_status(&asha, task.id, TaskStatus::InProgress)
            .await
            .unwrap();

        let contact = ctx.contact_service(Arc::new(RecordingMailer::default()));
        let query = contact
            .send_contact_message(CreateContactInput {
                student_id: "R1".to_string(),
                email: "r1@x.com".to_string(),
                message: "Hi".to_string(),
            })
            .await
            .unwrap();
        contact.resolve(&admin, query.id).await.unwrap();

        let stats = dashboard
            .admin_stats(&admin, Utc::now().date_naive())
            .await
            .unwrap();
        assert_eq!(
            stats,
            AdminStats {
                total_interns: 2,
                active_interns: 1,
                active_tasks: 1,
                pending_submissions: 0,
                resolved_queries: 1,
                pending_queries: 0,
                events_running: 0,
            }
        );

        assert!(matches!(
            dashboard.admin_stats(&asha, Utc::now().date_naive()).await,
            Err(PortalError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_intern_overview() {
        let ctx = TestContext::new().await;
        let dashboard = ctx.dashboard_service();
        let admin = ctx.admin_actor().await;
        let asha = ctx.intern_actor("Asha", "asha@x.com").await;

        ctx.notification_service()
            .add_notification(
                &admin,
                CreateNotificationInput {
                    subject: "Welcome".to_string(),
                    kind: Default::default(),
                    message: "Orientation at 10".to_string(),
                },
            )
            .await
            .unwrap();
        ctx.messaging_service()
            .send(&admin, asha.participant(), "Hello")
            .await
            .unwrap();
        ctx.messaging_service()
            .send(&asha, Participant::AdminTeam, "Hi")
            .await
            .unwrap();

        let overview = dashboard.intern_overview(&asha).await.unwrap();
        assert_eq!(overview.tasks, TaskCounts::default());
        assert_eq!(overview.notifications, 1);
        assert_eq!(overview.unread_messages, 1);
    }
}
