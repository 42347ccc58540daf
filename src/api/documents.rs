//! Document sharing endpoints
//!
//! - GET /api/v1/documents (admin)
//! - POST /api/v1/documents - Multipart (`title`, `assigned_to`, `file`) (admin)
//! - DELETE /api/v1/documents/{id} (admin)
//! - GET /api/v1/documents/mine (intern)

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};

use crate::api::common::{MultipartForm, SuccessResponse};
use crate::api::middleware::{ApiError, AppState, CurrentActor};
use crate::models::{CreateDocumentInput, Document};

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_documents).post(add_document))
        .route("/{id}", delete(delete_document))
}

pub fn protected_router() -> Router<AppState> {
    Router::new().route("/mine", get(my_documents))
}

async fn list_documents(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(state.document_service.list_documents(&actor).await?))
}

async fn my_documents(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(state.document_service.my_documents(&actor).await?))
}

async fn add_document(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let mut form = MultipartForm::read(multipart).await?;

    // "all" or blank means every intern
    let assigned_to = match form.text("assigned_to") {
        Some(v) if v.eq_ignore_ascii_case("all") => None,
        _ => form.int("assigned_to")?,
    };
    let input = CreateDocumentInput {
        title: form.text_or_default("title"),
        assigned_to,
    };
    let file = form
        .take_file("file")
        .ok_or_else(|| ApiError::validation_error("No file provided"))?;

    let document = state
        .document_service
        .add_document(&actor, input, file)
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn delete_document(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.document_service.delete_document(&actor, id).await?;
    Ok(Json(SuccessResponse::ok()))
}
