//! Unified message model
//!
//! One table carries task threads, admin/intern direct messages and peer
//! messages between interns; `kind` tells them apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{string_enum, Participant};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    #[sqlx(try_from = "String")]
    pub sender: Participant,
    /// Display name of the sender when the message was written
    pub sender_name: String,
    #[sqlx(try_from = "String")]
    pub recipient: Participant,
    #[sqlx(try_from = "String")]
    pub kind: MessageKind,
    /// Set for `task` messages only
    pub task_id: Option<i64>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

string_enum! {
    pub enum MessageKind {
        /// Feedback on a task
        Task => "task",
        /// Between an intern and the admin side
        DirectAdmin => "direct_admin",
        /// Peer chat
        InternToIntern => "intern_to_intern",
    }
}

impl MessageKind {
    /// Kind of a chat message from `sender` to `recipient`
    pub fn for_chat(sender: Participant, recipient: Participant) -> Self {
        if recipient == Participant::AdminTeam || sender.is_admin_side() {
            MessageKind::DirectAdmin
        } else {
            MessageKind::InternToIntern
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_kind() {
        assert_eq!(
            MessageKind::for_chat(Participant::Intern(1), Participant::AdminTeam),
            MessageKind::DirectAdmin
        );
        assert_eq!(
            MessageKind::for_chat(Participant::Admin(1), Participant::Intern(2)),
            MessageKind::DirectAdmin
        );
        assert_eq!(
            MessageKind::for_chat(Participant::Intern(1), Participant::Intern(2)),
            MessageKind::InternToIntern
        );
    }
}
