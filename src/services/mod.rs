//! Services layer - Business logic
//!
//! One service per portal area. Services enforce who may do what (through
//! the [`Actor`] passed to each operation), validate input, write through
//! the repositories and publish a change event after every successful write.

pub mod auth;
pub mod changes;
pub mod contact;
pub mod dashboard;
pub mod document;
pub mod email;
pub mod error;
pub mod event;
pub mod gallery;
pub mod intern;
pub mod messaging;
pub mod mou;
pub mod notification;
pub mod password;
pub mod rate_limiter;
pub mod storage;
pub mod submission;
pub mod task;
pub mod ticker;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{Actor, AuthService, AuthServiceError, LoginResult};
pub use changes::{ChangeAction, ChangeEvent, ChangeFeed};
pub use contact::ContactService;
pub use dashboard::{AdminStats, DashboardService, InternOverview};
pub use document::DocumentService;
pub use email::{create_mailer, DynMailTransport, EmailError, MailTransport};
pub use error::PortalError;
pub use event::{CalendarLists, CalendarMonth, EventService, EventView};
pub use gallery::{GalleryService, GalleryUpload};
pub use intern::InternService;
pub use messaging::{Contact, Conversation, MessagingService, UnreadSummary};
pub use mou::{MouFiles, MouService};
pub use notification::NotificationService;
pub use password::{hash_password, verify_password};
pub use rate_limiter::{LoginKey, LoginRateLimiter};
pub use storage::{BatchResult, FileUpload, Storage, StorageError, StoredFile, UploadFolder};
pub use submission::SubmissionService;
pub use task::TaskService;
pub use ticker::TickerService;
