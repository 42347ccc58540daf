//! Shared fixtures for service tests: an in-memory database with every
//! repository, a throwaway upload directory and factories for each service.

use crate::cache::{create_cache, SharedCache};
use crate::config::{CacheConfig, UploadConfig};
use crate::db::repositories::*;
use crate::db::{create_test_pool, migrations, DynDatabasePool};
use crate::models::{Admin, Intern, InternStatus};
use chrono::Utc;
use std::sync::Arc;

use super::*;

pub const TEST_PASSWORD: &str = "123";

pub struct TestContext {
    pub pool: DynDatabasePool,
    pub cache: SharedCache,
    pub changes: ChangeFeed,
    pub storage: Arc<Storage>,
    pub admin_repo: Arc<dyn AdminRepository>,
    pub intern_repo: Arc<dyn InternRepository>,
    pub session_repo: Arc<dyn SessionRepository>,
    pub task_repo: Arc<dyn TaskRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub gallery_repo: Arc<dyn GalleryRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub submission_repo: Arc<dyn SubmissionRepository>,
    pub message_repo: Arc<dyn MessageRepository>,
    pub contact_repo: Arc<dyn ContactRepository>,
    pub mou_repo: Arc<dyn MouRepository>,
    pub document_repo: Arc<dyn DocumentRepository>,
    pub ticker_repo: Arc<dyn TickerRepository>,
    _upload_dir: tempfile::TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let cache = create_cache(&CacheConfig::default());
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
        let storage = Arc::new(Storage::new(UploadConfig {
            path: upload_dir.path().to_path_buf(),
            ..Default::default()
        }));

        Self {
            changes: ChangeFeed::with_cache(cache.clone()),
            cache,
            storage,
            admin_repo: SqlxAdminRepository::boxed(pool.clone()),
            intern_repo: SqlxInternRepository::boxed(pool.clone()),
            session_repo: SqlxSessionRepository::boxed(pool.clone()),
            task_repo: SqlxTaskRepository::boxed(pool.clone()),
            event_repo: SqlxEventRepository::boxed(pool.clone()),
            gallery_repo: SqlxGalleryRepository::boxed(pool.clone()),
            notification_repo: SqlxNotificationRepository::boxed(pool.clone()),
            submission_repo: SqlxSubmissionRepository::boxed(pool.clone()),
            message_repo: SqlxMessageRepository::boxed(pool.clone()),
            contact_repo: SqlxContactRepository::boxed(pool.clone()),
            mou_repo: SqlxMouRepository::boxed(pool.clone()),
            document_repo: SqlxDocumentRepository::boxed(pool.clone()),
            ticker_repo: SqlxTickerRepository::boxed(pool.clone()),
            pool,
            _upload_dir: upload_dir,
        }
    }

    /// The admin used by most tests, created on first use
    pub async fn seed_admin(&self) -> Admin {
        let email = "admin@eitp.test";
        if let Some(admin) = self.admin_repo.get_by_email(email).await.unwrap() {
            return admin;
        }
        let admin = Admin {
            id: 0,
            name: "Program Admin".to_string(),
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            created_at: Utc::now(),
        };
        self.admin_repo.create(&admin).await.unwrap()
    }

    /// An active intern whose password is `TEST_PASSWORD`
    pub async fn seed_intern(&self, name: &str, email: &str) -> Intern {
        let intern = Intern {
            id: 0,
            name: name.to_string(),
            email: email.to_string(),
            branch: "CSE".to_string(),
            year: "E3".to_string(),
            status: InternStatus::Active,
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            created_at: Utc::now(),
        };
        self.intern_repo.create(&intern).await.unwrap()
    }

    pub async fn admin_actor(&self) -> Actor {
        Actor::Admin(self.seed_admin().await)
    }

    pub async fn intern_actor(&self, name: &str, email: &str) -> Actor {
        Actor::Intern(self.seed_intern(name, email).await)
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.admin_repo.clone(),
            self.intern_repo.clone(),
            self.session_repo.clone(),
            168,
        )
    }

    pub fn intern_service(&self) -> InternService {
        InternService::new(
            self.intern_repo.clone(),
            self.session_repo.clone(),
            self.message_repo.clone(),
            self.changes.clone(),
            TEST_PASSWORD.to_string(),
        )
    }

    pub fn task_service(&self) -> TaskService {
        TaskService::new(
            self.task_repo.clone(),
            self.intern_repo.clone(),
            self.message_repo.clone(),
            self.changes.clone(),
        )
    }

    pub fn event_service(&self) -> EventService {
        EventService::new(self.event_repo.clone(), self.cache.clone(), self.changes.clone())
    }

    pub fn gallery_service(&self) -> GalleryService {
        GalleryService::new(
            self.gallery_repo.clone(),
            self.storage.clone(),
            self.cache.clone(),
            self.changes.clone(),
        )
    }

    pub fn notification_service(&self) -> NotificationService {
        NotificationService::new(self.notification_repo.clone(), self.changes.clone())
    }

    pub fn submission_service(&self) -> SubmissionService {
        SubmissionService::new(
            self.submission_repo.clone(),
            self.storage.clone(),
            self.changes.clone(),
        )
    }

    pub fn messaging_service(&self) -> MessagingService {
        MessagingService::new(
            self.message_repo.clone(),
            self.intern_repo.clone(),
            self.task_repo.clone(),
            self.changes.clone(),
        )
    }

    pub fn contact_service(&self, mailer: DynMailTransport) -> ContactService {
        ContactService::new(
            self.contact_repo.clone(),
            mailer,
            "eitp@rgukt.ac.in",
            self.changes.clone(),
        )
    }

    pub fn mou_service(&self) -> MouService {
        MouService::new(
            self.mou_repo.clone(),
            self.storage.clone(),
            self.cache.clone(),
            self.changes.clone(),
        )
    }

    pub fn document_service(&self) -> DocumentService {
        DocumentService::new(
            self.document_repo.clone(),
            self.intern_repo.clone(),
            self.storage.clone(),
            self.changes.clone(),
        )
    }

    pub fn ticker_service(&self) -> TickerService {
        TickerService::new(
            self.ticker_repo.clone(),
            self.event_repo.clone(),
            self.cache.clone(),
            self.changes.clone(),
        )
    }

    pub fn dashboard_service(&self) -> DashboardService {
        DashboardService::new(
            self.intern_repo.clone(),
            self.task_repo.clone(),
            self.submission_repo.clone(),
            self.contact_repo.clone(),
            self.event_repo.clone(),
            Arc::new(self.notification_service()),
            Arc::new(self.messaging_service()),
        )
    }
}
