//! Authentication API endpoints
//!
//! - POST /api/v1/auth/login/admin - Admin login
//! - POST /api/v1/auth/login/intern - Intern login
//! - POST /api/v1/auth/logout - End the current session
//! - GET /api/v1/auth/me - Current caller
//! - PUT /api/v1/auth/password - Change own password
//! - GET/POST /api/v1/admins - Admin management (admin only)

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::api::common::SuccessResponse;
use crate::api::middleware::{session_token, ApiError, AppState, ClientIp, CurrentActor};
use crate::models::{Admin, CreateAdminInput, Intern};
use crate::services::{Actor, AuthServiceError, LoginKey, LoginResult};

/// Request body for both login endpoints
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// The caller as returned by `/auth/me`
#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum MeResponse {
    Admin(Admin),
    Intern(Intern),
}

impl From<Actor> for MeResponse {
    fn from(actor: Actor) -> Self {
        match actor {
            Actor::Admin(a) => MeResponse::Admin(a),
            Actor::Intern(i) => MeResponse::Intern(i),
        }
    }
}

#[derive(Clone, Copy)]
enum LoginKind {
    Admin,
    Intern,
}

impl LoginKind {
    fn as_str(self) -> &'static str {
        match self {
            LoginKind::Admin => "admin",
            LoginKind::Intern => "intern",
        }
    }
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/login/admin", post(login_admin))
        .route("/login/intern", post(login_intern))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_actor))
        .route("/password", put(change_password))
}

/// Admin management routes (requires admin)
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/", get(list_admins).post(create_admin))
}

async fn login_admin(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    login(state, ip, body, LoginKind::Admin).await
}

async fn login_intern(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    login(state, ip, body, LoginKind::Intern).await
}

async fn login(
    state: AppState,
    ip: Option<IpAddr>,
    body: LoginRequest,
    kind: LoginKind,
) -> Result<(HeaderMap, Json<LoginResult>), ApiError> {
    // Failures count against the account and, when known, the client
    let mut keys = vec![LoginKey::account(kind.as_str(), &body.email)];
    keys.extend(ip.map(LoginKey::Client));

    for key in &keys {
        if let Some(remaining) = state.rate_limiter.locked_for(key).await {
            tracing::warn!("Login blocked for {} ({}s left)", key, remaining.num_seconds());
            return Err(ApiError::with_details(
                "RATE_LIMIT",
                "Too many failed login attempts, try again later",
                serde_json::json!({ "retry_after": remaining.num_seconds() }),
            ));
        }
    }

    let result = match kind {
        LoginKind::Admin => state.auth_service.login_admin(&body.email, &body.password).await,
        LoginKind::Intern => state.auth_service.login_intern(&body.email, &body.password).await,
    };

    let login = match result {
        Ok(login) => login,
        Err(e) => {
            if matches!(e, AuthServiceError::InvalidCredentials) {
                for key in &keys {
                    state.rate_limiter.record_failure(key).await;
                }
            }
            return Err(e.into());
        }
    };

    for key in &keys {
        state.rate_limiter.clear(key).await;
    }

    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        login.token,
        state.session_hours * 60 * 60
    );
    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|_| ApiError::internal_error("Invalid session cookie"))?,
    );

    Ok((response_headers, Json(login)))
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = session_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    state.auth_service.logout(&token).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    );

    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/v1/auth/me
async fn get_current_actor(CurrentActor(actor): CurrentActor) -> Json<MeResponse> {
    Json(actor.into())
}

/// PUT /api/v1/auth/password
async fn change_password(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .auth_service
        .change_password(&actor, &body.current_password, &body.new_password)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn list_admins(State(state): State<AppState>) -> Result<Json<Vec<Admin>>, ApiError> {
    Ok(Json(state.auth_service.list_admins().await?))
}

async fn create_admin(
    State(state): State<AppState>,
    Json(body): Json<CreateAdminInput>,
) -> Result<(StatusCode, Json<Admin>), ApiError> {
    let admin = state.auth_service.create_admin(body).await?;
    Ok((StatusCode::CREATED, Json(admin)))
}
