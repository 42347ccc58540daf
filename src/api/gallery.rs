//! Gallery endpoints
//!
//! - GET /api/v1/gallery - Every entry, newest first
//! - GET /api/v1/gallery/highlights?limit= - Flattened homepage photos
//! - POST /api/v1/gallery - Multipart upload (`title`, `date`, `collage`, `files`)
//! - DELETE /api/v1/gallery/{id}

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{MultipartForm, SuccessResponse};
use crate::api::middleware::{ApiError, AppState, CurrentActor};
use crate::models::{GalleryEntry, GalleryPhoto};
use crate::services::gallery::DEFAULT_HIGHLIGHTS;
use crate::services::{BatchResult, GalleryUpload};

#[derive(Debug, Deserialize)]
pub struct HighlightsQuery {
    pub limit: Option<usize>,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_gallery))
        .route("/highlights", get(highlights))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_images))
        .route("/{id}", delete(delete_image))
}

async fn list_gallery(State(state): State<AppState>) -> Result<Json<Vec<GalleryEntry>>, ApiError> {
    Ok(Json(state.gallery_service.list_gallery().await?))
}

async fn highlights(
    State(state): State<AppState>,
    Query(query): Query<HighlightsQuery>,
) -> Result<Json<Vec<GalleryPhoto>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_HIGHLIGHTS);
    Ok(Json(state.gallery_service.highlights(limit).await?))
}

async fn add_images(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BatchResult<GalleryEntry>>), ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let upload = GalleryUpload {
        title: form.text_or_default("title"),
        date: form.date("date")?,
        collage: form.flag("collage"),
        files: form.take_files(&["files", "file"]),
    };

    let result = state.gallery_service.add_images(&actor, upload).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn delete_image(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.gallery_service.delete_image(&actor, id).await?;
    Ok(Json(SuccessResponse::ok()))
}
