//! Task assignment and task comment threads
//!
//! Comments are unified messages of kind `task`. An intern's comment is
//! addressed to the admin team; an admin's to the assigned intern.

use crate::db::repositories::{InternRepository, MessageRepository, TaskRepository};
use crate::models::{
    CreateTaskInput, Message, MessageKind, Participant, Task, TaskStatus, TaskStatusFilter,
};
use crate::services::auth::Actor;
use crate::services::changes::{ChangeAction, ChangeFeed};
use chrono::Utc;
use std::sync::Arc;

use super::error::{require, PortalError};

pub struct TaskService {
    task_repo: Arc<dyn TaskRepository>,
    intern_repo: Arc<dyn InternRepository>,
    message_repo: Arc<dyn MessageRepository>,
    changes: ChangeFeed,
}

impl TaskService {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        intern_repo: Arc<dyn InternRepository>,
        message_repo: Arc<dyn MessageRepository>,
        changes: ChangeFeed,
    ) -> Self {
        Self {
            task_repo,
            intern_repo,
            message_repo,
            changes,
        }
    }

    async fn get(&self, id: i64) -> Result<Task, PortalError> {
        self.task_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Task {}", id)))
    }

    /// Load a task the actor may see: admins see all, interns their own
    async fn get_visible(&self, actor: &Actor, id: i64) -> Result<Task, PortalError> {
        let task = self.get(id).await?;
        match actor.intern_id() {
            Some(intern_id) if !task.is_assigned_to(intern_id) => {
                Err(PortalError::forbidden("Task is not assigned to you"))
            }
            _ => Ok(task),
        }
    }

    pub async fn add_task(&self, actor: &Actor, input: CreateTaskInput) -> Result<Task, PortalError> {
        actor.require_admin()?;
        require(&input.title, "Title")?;

        let intern = self
            .intern_repo
            .get_by_id(input.assigned_to)
            .await?
            .ok_or_else(|| PortalError::validation(format!("Unknown intern {}", input.assigned_to)))?;

        let task = Task {
            id: 0,
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            assigned_to: Some(intern.id),
            assigned_name: intern.name,
            due_date: input.due_date,
            priority: input.priority,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
        };
        let task = self.task_repo.create(&task).await?;

        tracing::info!("Task {} assigned to intern {}", task.id, intern.id);
        self.changes
            .publish("tasks", ChangeAction::Insert, Some(task.id))
            .await;
        Ok(task)
    }

    pub async fn delete_task(&self, actor: &Actor, id: i64) -> Result<(), PortalError> {
        actor.require_admin()?;
        if !self.task_repo.delete(id).await? {
            return Err(PortalError::not_found(format!("Task {}", id)));
        }
        self.changes.publish("tasks", ChangeAction::Delete, Some(id)).await;
        Ok(())
    }

    pub async fn update_task_status(
        &self,
        actor: &Actor,
        id: i64,
        status: TaskStatus,
    ) -> Result<Task, PortalError> {
        let task = self.get_visible(actor, id).await?;
        self.task_repo.update_status(id, status).await?;

        tracing::info!("Task {} moved from {} to {}", id, task.status, status);
        self.changes.publish("tasks", ChangeAction::Update, Some(id)).await;
        Ok(Task { status, ..task })
    }

    pub async fn list_tasks(
        &self,
        actor: &Actor,
        filter: TaskStatusFilter,
    ) -> Result<Vec<Task>, PortalError> {
        actor.require_admin()?;
        let tasks = self.task_repo.list().await?;
        Ok(tasks.into_iter().filter(|t| filter.matches(t)).collect())
    }

    pub async fn my_tasks(
        &self,
        actor: &Actor,
        filter: TaskStatusFilter,
    ) -> Result<Vec<Task>, PortalError> {
        let intern = actor.require_intern()?;
        let tasks = self.task_repo.list_by_intern(intern.id).await?;
        Ok(tasks.into_iter().filter(|t| filter.matches(t)).collect())
    }

    pub async fn add_task_comment(
        &self,
        actor: &Actor,
        task_id: i64,
        text: &str,
    ) -> Result<Message, PortalError> {
        require(text, "Comment")?;
        let task = self.get_visible(actor, task_id).await?;

        let recipient = match (actor, task.assigned_to) {
            (Actor::Admin(_), Some(intern_id)) => Participant::Intern(intern_id),
            _ => Participant::AdminTeam,
        };
        let message = Message {
            id: 0,
            sender: actor.participant(),
            sender_name: actor.name().to_string(),
            recipient,
            kind: MessageKind::Task,
            task_id: Some(task.id),
            text: text.trim().to_string(),
            created_at: Utc::now(),
        };
        let message = self.message_repo.create(&message).await?;

        self.changes
            .publish("messages", ChangeAction::Insert, Some(message.id))
            .await;
        Ok(message)
    }

    /// Comment thread, oldest first
    pub async fn list_task_comments(
        &self,
        actor: &Actor,
        task_id: i64,
    ) -> Result<Vec<Message>, PortalError> {
        self.get_visible(actor, task_id).await?;
        Ok(self.message_repo.list_for_task(task_id).await?)
    }
}
