//! Unified messaging: admin-team threads, peer chat and read tracking
//!
//! Every chat message is a row in `messages`. A conversation is not stored;
//! it is a filter over those rows, named by a key such as `team:7`,
//! `peer:3:9` or `task:12`. Read cursors are kept per reader and key.

use crate::db::repositories::{InternRepository, MessageRepository, TaskRepository};
use crate::models::{Intern, Message, MessageKind, Participant};
use crate::services::auth::Actor;
use crate::services::changes::{ChangeAction, ChangeFeed};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::error::{require, PortalError};

pub const ADMIN_TEAM_NAME: &str = "Admin Team";

/// A thread of messages, identified by a stable key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversation {
    /// Intern X and the admin team
    Team(i64),
    /// Two interns; always stored with the smaller id first
    Peer(i64, i64),
    Task(i64),
}

impl Conversation {
    pub fn peer(a: i64, b: i64) -> Self {
        Conversation::Peer(a.min(b), a.max(b))
    }

    /// Whether a message belongs to this thread
    pub fn contains(&self, message: &Message) -> bool {
        match *self {
            Conversation::Team(intern_id) => {
                let intern = Participant::Intern(intern_id);
                message.kind == MessageKind::DirectAdmin
                    && ((message.sender == intern && message.recipient == Participant::AdminTeam)
                        || (matches!(message.sender, Participant::Admin(_))
                            && message.recipient == intern))
            }
            Conversation::Peer(a, b) => {
                let (a, b) = (Participant::Intern(a), Participant::Intern(b));
                message.kind == MessageKind::InternToIntern
                    && ((message.sender == a && message.recipient == b)
                        || (message.sender == b && message.recipient == a))
            }
            Conversation::Task(task_id) => {
                message.kind == MessageKind::Task && message.task_id == Some(task_id)
            }
        }
    }

    /// Whether `reader` may open this thread. Task threads are checked
    /// against the task itself.
    fn is_open_to(&self, reader: Participant) -> bool {
        match (*self, reader) {
            (Conversation::Team(_), Participant::Admin(_)) => true,
            (Conversation::Team(x), Participant::Intern(id)) => x == id,
            (Conversation::Peer(a, b), Participant::Intern(id)) => id == a || id == b,
            (Conversation::Task(_), _) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conversation::Team(id) => write!(f, "team:{}", id),
            Conversation::Peer(a, b) => write!(f, "peer:{}:{}", a, b),
            Conversation::Task(id) => write!(f, "task:{}", id),
        }
    }
}

impl FromStr for Conversation {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PortalError::validation(format!("Invalid conversation: {}", s));
        let parts: Vec<&str> = s.trim().split(':').collect();
        let id = |i: usize| -> Result<i64, PortalError> {
            parts
                .get(i)
                .and_then(|v| v.parse().ok())
                .ok_or_else(invalid)
        };

        match (parts.first().copied(), parts.len()) {
            (Some("team"), 2) => Ok(Conversation::Team(id(1)?)),
            (Some("task"), 2) => Ok(Conversation::Task(id(1)?)),
            (Some("peer"), 3) => {
                let (a, b) = (id(1)?, id(2)?);
                if a == b {
                    return Err(invalid());
                }
                Ok(Conversation::peer(a, b))
            }
            _ => Err(invalid()),
        }
    }
}

/// Messages of one conversation, oldest first
pub fn filter_conversation(messages: &[Message], conversation: Conversation) -> Vec<Message> {
    let mut thread: Vec<Message> = messages
        .iter()
        .filter(|m| conversation.contains(m))
        .cloned()
        .collect();
    thread.sort_by_key(|m| m.id);
    thread
}

/// Whether `sender` is on the same side of the thread as `reader`.
///
/// All admins count as one side, so a reply by any admin is not unread for
/// another admin.
fn same_side(sender: Participant, reader: Participant) -> bool {
    if reader.is_admin_side() {
        sender.is_admin_side()
    } else {
        sender == reader
    }
}

/// Messages past the cursor that the reader's side did not write
pub fn count_unread(
    messages: &[Message],
    conversation: Conversation,
    reader: Participant,
    last_seen_id: i64,
) -> usize {
    messages
        .iter()
        .filter(|m| m.id > last_seen_id)
        .filter(|m| !same_side(m.sender, reader))
        .filter(|m| conversation.contains(m))
        .count()
}

#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    pub participant: Participant,
    pub name: String,
    pub conversation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactUnread {
    pub participant: Participant,
    pub conversation: String,
    pub unread: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UnreadSummary {
    pub contacts: Vec<ContactUnread>,
    pub total: usize,
}

pub struct MessagingService {
    message_repo: Arc<dyn MessageRepository>,
    intern_repo: Arc<dyn InternRepository>,
    task_repo: Arc<dyn TaskRepository>,
    changes: ChangeFeed,
}

impl MessagingService {
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        intern_repo: Arc<dyn InternRepository>,
        task_repo: Arc<dyn TaskRepository>,
        changes: ChangeFeed,
    ) -> Self {
        Self {
            message_repo,
            intern_repo,
            task_repo,
            changes,
        }
    }

    /// Conversation between the actor and one of their contacts
    fn conversation_with(actor: &Actor, contact: Participant) -> Option<Conversation> {
        match (actor, contact) {
            (Actor::Intern(me), Participant::AdminTeam) => Some(Conversation::Team(me.id)),
            (Actor::Intern(me), Participant::Intern(other)) if other != me.id => {
                Some(Conversation::peer(me.id, other))
            }
            (Actor::Admin(_), Participant::Intern(id)) => Some(Conversation::Team(id)),
            _ => None,
        }
    }

    async fn other_interns(&self, actor: &Actor) -> Result<Vec<Intern>, PortalError> {
        let mut interns: Vec<Intern> = self
            .intern_repo
            .list()
            .await?
            .into_iter()
            .filter(|i| Some(i.id) != actor.intern_id())
            .collect();
        interns.sort_by_key(|i| i.name.to_lowercase());
        Ok(interns)
    }

    /// People the actor can message. Interns see the admin team first.
    pub async fn contacts(
        &self,
        actor: &Actor,
        search: Option<&str>,
    ) -> Result<Vec<Contact>, PortalError> {
        let mut contacts = Vec::new();
        if !actor.is_admin() {
            contacts.push((Participant::AdminTeam, ADMIN_TEAM_NAME.to_string()));
        }
        for intern in self.other_interns(actor).await? {
            contacts.push((Participant::Intern(intern.id), intern.name));
        }

        let query = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        Ok(contacts
            .into_iter()
            .filter(|(_, name)| query.is_empty() || name.to_lowercase().contains(&query))
            .filter_map(|(participant, name)| {
                let conversation = Self::conversation_with(actor, participant)?;
                Some(Contact {
                    participant,
                    name,
                    conversation: conversation.to_string(),
                })
            })
            .collect())
    }

    pub async fn send(
        &self,
        actor: &Actor,
        recipient: Participant,
        text: &str,
    ) -> Result<Message, PortalError> {
        require(text, "Message")?;

        match (actor, recipient) {
            (Actor::Intern(_), Participant::Admin(_)) => {
                return Err(PortalError::forbidden(
                    "Interns message admins through the Admin Team",
                ));
            }
            (Actor::Admin(_), Participant::AdminTeam | Participant::Admin(_)) => {
                return Err(PortalError::validation("Admins can only message interns"));
            }
            _ => {}
        }
        if let Participant::Intern(id) = recipient {
            if Some(id) == actor.intern_id() {
                return Err(PortalError::validation("Cannot message yourself"));
            }
            if self.intern_repo.get_by_id(id).await?.is_none() {
                return Err(PortalError::not_found(format!("Intern {}", id)));
            }
        }

        let sender = actor.participant();
        let message = Message {
            id: 0,
            sender,
            sender_name: actor.name().to_string(),
            recipient,
            kind: MessageKind::for_chat(sender, recipient),
            task_id: None,
            text: text.trim().to_string(),
            created_at: Utc::now(),
        };
        let message = self.message_repo.create(&message).await?;

        tracing::debug!("Message {} sent from {} to {}", message.id, sender, recipient);
        self.changes
            .publish("messages", ChangeAction::Insert, Some(message.id))
            .await;
        Ok(message)
    }

    async fn authorize(&self, actor: &Actor, conversation: Conversation) -> Result<(), PortalError> {
        if !conversation.is_open_to(actor.participant()) {
            return Err(PortalError::forbidden("Not a participant of this conversation"));
        }
        if let (Conversation::Task(task_id), Some(intern_id)) = (conversation, actor.intern_id()) {
            let task = self
                .task_repo
                .get_by_id(task_id)
                .await?
                .ok_or_else(|| PortalError::not_found(format!("Task {}", task_id)))?;
            if !task.is_assigned_to(intern_id) {
                return Err(PortalError::forbidden("Task is not assigned to you"));
            }
        }
        Ok(())
    }

    async fn load(&self, conversation: Conversation) -> Result<Vec<Message>, PortalError> {
        let messages = match conversation {
            Conversation::Team(id) | Conversation::Peer(id, _) => {
                self.message_repo
                    .list_chat_involving(Participant::Intern(id))
                    .await?
            }
            Conversation::Task(id) => self.message_repo.list_for_task(id).await?,
        };
        Ok(filter_conversation(&messages, conversation))
    }

    pub async fn thread(
        &self,
        actor: &Actor,
        conversation: Conversation,
    ) -> Result<Vec<Message>, PortalError> {
        self.authorize(actor, conversation).await?;
        self.load(conversation).await
    }

    /// Thread with the admin team. Admins name the intern; interns get their own.
    pub async fn team_thread(
        &self,
        actor: &Actor,
        intern_id: Option<i64>,
    ) -> Result<Vec<Message>, PortalError> {
        let intern_id = match (actor.intern_id(), intern_id) {
            (Some(me), _) => me,
            (None, Some(id)) => id,
            (None, None) => return Err(PortalError::validation("Intern id is required")),
        };
        self.thread(actor, Conversation::Team(intern_id)).await
    }

    pub async fn peer_thread(
        &self,
        actor: &Actor,
        other_intern: i64,
    ) -> Result<Vec<Message>, PortalError> {
        let me = actor.require_intern()?;
        if me.id == other_intern {
            return Err(PortalError::validation("Cannot open a thread with yourself"));
        }
        self.thread(actor, Conversation::peer(me.id, other_intern)).await
    }

    pub async fn mark_read(
        &self,
        actor: &Actor,
        conversation: Conversation,
        last_seen_id: i64,
    ) -> Result<(), PortalError> {
        self.authorize(actor, conversation).await?;
        self.message_repo
            .set_read_cursor(actor.participant(), &conversation.to_string(), last_seen_id)
            .await?;
        Ok(())
    }

    pub async fn unread_count(
        &self,
        actor: &Actor,
        conversation: Conversation,
    ) -> Result<usize, PortalError> {
        self.authorize(actor, conversation).await?;
        let reader = actor.participant();
        let cursor = self
            .message_repo
            .get_read_cursor(reader, &conversation.to_string())
            .await?;
        let messages = self.load(conversation).await?;
        Ok(count_unread(&messages, conversation, reader, cursor))
    }

    /// Unread counts for every contact of the actor
    pub async fn unread_summary(&self, actor: &Actor) -> Result<UnreadSummary, PortalError> {
        let reader = actor.participant();
        let cursors: HashMap<String, i64> = self.message_repo.read_cursors(reader).await?;
        // An admin's unread messages are always addressed to the team
        let messages = match actor {
            Actor::Admin(_) => {
                self.message_repo
                    .list_chat_involving(Participant::AdminTeam)
                    .await?
            }
            Actor::Intern(me) => {
                self.message_repo
                    .list_chat_involving(Participant::Intern(me.id))
                    .await?
            }
        };

        let mut summary = UnreadSummary::default();
        for contact in self.contacts(actor, None).await? {
            let conversation: Conversation = contact.conversation.parse()?;
            let cursor = cursors.get(&contact.conversation).copied().unwrap_or(0);
            let unread = count_unread(&messages, conversation, reader, cursor);
            summary.total += unread;
            summary.contacts.push(ContactUnread {
                participant: contact.participant,
                conversation: contact.conversation,
                unread,
            });
        }
        Ok(summary)
    }
}
