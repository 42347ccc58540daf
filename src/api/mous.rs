//! MoU endpoints
//!
//! - GET /api/v1/mous?search=&status= - Public listing
//! - POST /api/v1/mous - Multipart form with optional `logo`, `photo`, `doc` (admin)
//! - DELETE /api/v1/mous/{id} (admin)

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{MultipartForm, SuccessResponse};
use crate::api::middleware::{ApiError, AppState, CurrentActor};
use crate::models::{CreateMouInput, Mou};
use crate::services::MouFiles;

#[derive(Debug, Default, Deserialize)]
pub struct MouQuery {
    pub search: Option<String>,
    pub status: Option<String>,
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(list_mous))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_mou))
        .route("/{id}", delete(delete_mou))
}

async fn list_mous(
    State(state): State<AppState>,
    Query(query): Query<MouQuery>,
) -> Result<Json<Vec<Mou>>, ApiError> {
    let mous = state
        .mou_service
        .list_mous(query.search.as_deref(), query.status.as_deref())
        .await?;
    Ok(Json(mous))
}

async fn add_mou(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Mou>), ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let input = CreateMouInput {
        partner: form.text_or_default("partner"),
        scope: form.text_or_default("scope"),
        date: form.date("date")?,
        duration: form.text_or_default("duration"),
        status: form.text_or_default("status"),
        description: form.text_or_default("description"),
    };
    let files = MouFiles {
        logo: form.take_file("logo"),
        photo: form.take_file("photo"),
        doc: form.take_file("doc"),
    };

    let mou = state.mou_service.add_mou(&actor, input, files).await?;
    Ok((StatusCode::CREATED, Json(mou)))
}

async fn delete_mou(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.mou_service.delete_mou(&actor, id).await?;
    Ok(Json(SuccessResponse::ok()))
}
