//! Data models
//!
//! Database entities of the portal plus the input types the services accept.
//! Entities derive `sqlx::FromRow` so one mapping serves both backends;
//! textual enums are stored as their display strings.

mod admin;
mod contact;
mod document;
mod event;
mod gallery;
mod intern;
mod message;
mod mou;
mod notification;
mod participant;
mod session;
mod submission;
mod task;
mod ticker;

pub use admin::{Admin, CreateAdminInput};
pub use contact::{ContactFilter, ContactMessage, ContactStatus, CreateContactInput};
pub use document::{format_size_kb, CreateDocumentInput, Document, ALL_INTERNS_LABEL};
pub use event::{CreateEventInput, Event, EventFilter, EventKind, EventStatus};
pub use gallery::{GalleryEntry, GalleryPhoto};
pub use intern::{CreateInternInput, Intern, InternStatus};
pub use message::{Message, MessageKind};
pub use mou::{CreateMouInput, Mou};
pub use notification::{
    CreateNotificationInput, Notification, NotificationKind, URGENT_BROADCAST_SUBJECT,
};
pub use participant::Participant;
pub use session::Session;
pub use submission::{CommentRole, Submission, SubmissionComment, SubmissionStatus};
pub use task::{CreateTaskInput, Task, TaskPriority, TaskStatus, TaskStatusFilter};
pub use ticker::{TickerFeed, TickerSetting};

/// Error returned when a stored or submitted string is not a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Declare a fieldless enum that is stored and serialized as fixed strings.
///
/// Parsing is case-insensitive and ignores surrounding whitespace, so values
/// typed into forms ("in progress", "URGENT") are accepted.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err($crate::models::ParseEnumError::new(stringify!($name), s))
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::models::ParseEnumError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                value.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use string_enum;
