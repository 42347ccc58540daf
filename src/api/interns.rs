//! Intern roster endpoints (admin only)
//!
//! - GET /api/v1/interns?search= - List interns
//! - POST /api/v1/interns - Enroll an intern
//! - DELETE /api/v1/interns/{id} - Remove an intern
//! - PUT /api/v1/interns/{id}/status - Activate or deactivate

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{SearchQuery, SuccessResponse};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateInternInput, Intern, InternStatus};

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: InternStatus,
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_interns).post(add_intern))
        .route("/{id}", delete(remove_intern))
        .route("/{id}/status", put(set_status))
}

async fn list_interns(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Intern>>, ApiError> {
    let interns = state
        .intern_service
        .list_interns(query.search.as_deref().filter(|s| !s.trim().is_empty()))
        .await?;
    Ok(Json(interns))
}

async fn add_intern(
    State(state): State<AppState>,
    Json(body): Json<CreateInternInput>,
) -> Result<(StatusCode, Json<Intern>), ApiError> {
    let intern = state.intern_service.add_intern(body).await?;
    Ok((StatusCode::CREATED, Json(intern)))
}

async fn remove_intern(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.intern_service.remove_intern(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<Intern>, ApiError> {
    Ok(Json(
        state.intern_service.set_intern_status(id, body.status).await?,
    ))
}
