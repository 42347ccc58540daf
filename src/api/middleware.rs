//! API middleware
//!
//! Contains middleware for:
//! - Authentication (session token from `Authorization: Bearer` or the
//!   `session` cookie)
//! - Authorization (admin-only route groups)
//! - Request statistics
//!
//! Also home to the shared [`AppState`] and the JSON [`ApiError`].

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::SharedCache;
use crate::config::{Config, UploadConfig};
use crate::db::repositories::*;
use crate::db::DynDatabasePool;
use crate::models::ParseEnumError;
use crate::services::{
    Actor, AuthService, AuthServiceError, ChangeFeed, ContactService, DashboardService,
    DocumentService, DynMailTransport, EmailError, EventService, GalleryService, InternService,
    LoginRateLimiter, MessagingService, MouService, NotificationService, PortalError, Storage,
    StorageError, SubmissionService, TaskService, TickerService,
};

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    total_requests: AtomicU64,
    /// Total response time in microseconds (for calculating average)
    total_response_time_us: AtomicU64,
    failed_requests: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record(&self, duration_us: u64, failed: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
        if failed {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Requests answered with a 5xx status
    pub fn failed_requests(&self) -> u64 {
        self.failed_requests.load(Ordering::Relaxed)
    }

    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);
        total_time as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Application State
// ============================================================================

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub upload_config: Arc<UploadConfig>,
    pub session_hours: i64,
    pub changes: ChangeFeed,
    pub storage: Arc<Storage>,
    pub rate_limiter: Arc<LoginRateLimiter>,
    pub request_stats: Arc<RequestStats>,
    pub auth_service: Arc<AuthService>,
    pub intern_service: Arc<InternService>,
    pub task_service: Arc<TaskService>,
    pub event_service: Arc<EventService>,
    pub gallery_service: Arc<GalleryService>,
    pub notification_service: Arc<NotificationService>,
    pub submission_service: Arc<SubmissionService>,
    pub messaging_service: Arc<MessagingService>,
    pub contact_service: Arc<ContactService>,
    pub mou_service: Arc<MouService>,
    pub document_service: Arc<DocumentService>,
    pub ticker_service: Arc<TickerService>,
    pub dashboard_service: Arc<DashboardService>,
}

impl AppState {
    /// Wire every repository and service onto one pool
    pub fn new(
        pool: DynDatabasePool,
        config: &Config,
        cache: SharedCache,
        mailer: DynMailTransport,
    ) -> Self {
        let admin_repo = SqlxAdminRepository::boxed(pool.clone());
        let intern_repo = SqlxInternRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let task_repo = SqlxTaskRepository::boxed(pool.clone());
        let event_repo = SqlxEventRepository::boxed(pool.clone());
        let gallery_repo = SqlxGalleryRepository::boxed(pool.clone());
        let notification_repo = SqlxNotificationRepository::boxed(pool.clone());
        let submission_repo = SqlxSubmissionRepository::boxed(pool.clone());
        let message_repo = SqlxMessageRepository::boxed(pool.clone());
        let contact_repo = SqlxContactRepository::boxed(pool.clone());
        let mou_repo = SqlxMouRepository::boxed(pool.clone());
        let document_repo = SqlxDocumentRepository::boxed(pool.clone());
        let ticker_repo = SqlxTickerRepository::boxed(pool.clone());

        let changes = ChangeFeed::with_cache(cache.clone());
        let storage = Arc::new(Storage::new(config.upload.clone()));

        let notification_service = Arc::new(NotificationService::new(
            notification_repo,
            changes.clone(),
        ));
        let messaging_service = Arc::new(MessagingService::new(
            message_repo.clone(),
            intern_repo.clone(),
            task_repo.clone(),
            changes.clone(),
        ));
        let dashboard_service = Arc::new(DashboardService::new(
            intern_repo.clone(),
            task_repo.clone(),
            submission_repo.clone(),
            contact_repo.clone(),
            event_repo.clone(),
            notification_service.clone(),
            messaging_service.clone(),
        ));

        Self {
            pool,
            upload_config: Arc::new(config.upload.clone()),
            session_hours: config.auth.session_hours,
            auth_service: Arc::new(AuthService::new(
                admin_repo,
                intern_repo.clone(),
                session_repo.clone(),
                config.auth.session_hours,
            )),
            intern_service: Arc::new(InternService::new(
                intern_repo.clone(),
                session_repo,
                message_repo.clone(),
                changes.clone(),
                config.auth.default_intern_password.clone(),
            )),
            task_service: Arc::new(TaskService::new(
                task_repo.clone(),
                intern_repo.clone(),
                message_repo,
                changes.clone(),
            )),
            event_service: Arc::new(EventService::new(
                event_repo.clone(),
                cache.clone(),
                changes.clone(),
            )),
            gallery_service: Arc::new(GalleryService::new(
                gallery_repo,
                storage.clone(),
                cache.clone(),
                changes.clone(),
            )),
            submission_service: Arc::new(SubmissionService::new(
                submission_repo,
                storage.clone(),
                changes.clone(),
            )),
            contact_service: Arc::new(ContactService::new(
                contact_repo,
                mailer,
                config.email.reply_to.clone(),
                changes.clone(),
            )),
            mou_service: Arc::new(MouService::new(
                mou_repo,
                storage.clone(),
                cache.clone(),
                changes.clone(),
            )),
            document_service: Arc::new(DocumentService::new(
                document_repo,
                intern_repo,
                storage.clone(),
                changes.clone(),
            )),
            ticker_service: Arc::new(TickerService::new(
                ticker_repo,
                event_repo,
                cache,
                changes.clone(),
            )),
            notification_service,
            messaging_service,
            dashboard_service,
            changes,
            storage,
            rate_limiter: Arc::new(LoginRateLimiter::new()),
            request_stats: Arc::new(RequestStats::new()),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "EMAIL_ERROR" => StatusCode::BAD_GATEWAY,
            "RATE_LIMIT" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<PortalError> for ApiError {
    fn from(e: PortalError) -> Self {
        match e {
            PortalError::NotFound(what) => ApiError::not_found(format!("{} not found", what)),
            PortalError::Validation(msg) => ApiError::validation_error(msg),
            PortalError::Forbidden(msg) => ApiError::forbidden(msg),
            PortalError::Conflict(msg) => ApiError::conflict(msg),
            PortalError::Email(e) => e.into(),
            PortalError::Storage(e) => e.into(),
            PortalError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(e: AuthServiceError) -> Self {
        match e {
            AuthServiceError::InvalidCredentials => {
                ApiError::unauthorized("Invalid email or password")
            }
            AuthServiceError::AccountInactive => ApiError::forbidden("Account is inactive"),
            AuthServiceError::SessionExpired | AuthServiceError::SessionNotFound => {
                ApiError::unauthorized("Invalid or expired session")
            }
            AuthServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            AuthServiceError::EmailTaken(email) => {
                ApiError::with_details("CONFLICT", "Email already registered", serde_json::json!({ "email": email }))
            }
            AuthServiceError::InternalError(e) => {
                tracing::error!("Auth error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Io(_) => {
                tracing::error!("Storage error: {}", e);
                ApiError::internal_error("Failed to store file")
            }
            other => ApiError::validation_error(other.to_string()),
        }
    }
}

impl From<ParseEnumError> for ApiError {
    fn from(e: ParseEnumError) -> Self {
        ApiError::validation_error(e.to_string())
    }
}

impl From<EmailError> for ApiError {
    fn from(e: EmailError) -> Self {
        ApiError::new("EMAIL_ERROR", e.to_string())
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Extract session token from request
fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some(token) = cookie.trim().strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Session token of a request, if it carries one
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    extract_session_token(headers)
}

/// Client address for login limiting.
///
/// Proxy headers are only believed when the connection itself comes from a
/// loopback or private address. `None` when nothing identifies the client.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
    match peer {
        Some(peer) if !is_proxy_address(peer) => Some(peer),
        Some(peer) => forwarded_ip(headers).or(Some(peer)),
        None => forwarded_ip(headers),
    }
}

fn is_proxy_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_private(),
        // fc00::/7 unique local
        IpAddr::V6(v6) => v6.is_loopback() || (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim);
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim);

    forwarded.or(real_ip).and_then(|ip| ip.parse().ok())
}

/// Extractor for [`client_ip`], using the peer address from `ConnectInfo`
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(ClientIp(client_ip(&parts.headers, peer)))
    }
}

/// The authenticated caller, placed in request extensions by [`require_auth`]
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentActor>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let actor = state.auth_service.current(&token).await?;

    request.extensions_mut().insert(CurrentActor(actor));
    Ok(next.run(request).await)
}

/// Admin authorization middleware
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let actor = request
        .extensions()
        .get::<CurrentActor>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !actor.0.is_admin() {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// Request statistics middleware
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;

    let duration_us = start.elapsed().as_micros() as u64;
    state
        .request_stats
        .record(duration_us, response.status().is_server_error());

    response
}
