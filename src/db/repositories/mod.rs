//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod admin;
pub mod contact;
pub mod document;
pub mod event;
pub mod gallery;
pub mod intern;
pub mod message;
pub mod mou;
pub mod notification;
pub mod session;
pub mod submission;
pub mod task;
pub mod ticker;

pub use admin::{AdminRepository, SqlxAdminRepository};
pub use contact::{ContactRepository, SqlxContactRepository};
pub use document::{DocumentRepository, SqlxDocumentRepository};
pub use event::{EventRepository, SqlxEventRepository};
pub use gallery::{GalleryRepository, SqlxGalleryRepository};
pub use intern::{InternRepository, SqlxInternRepository};
pub use message::{MessageRepository, SqlxMessageRepository};
pub use mou::{MouRepository, SqlxMouRepository};
pub use notification::{NotificationRepository, SqlxNotificationRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use submission::{SqlxSubmissionRepository, SubmissionRepository};
pub use task::{SqlxTaskRepository, TaskRepository};
pub use ticker::{SqlxTickerRepository, TickerRepository};
