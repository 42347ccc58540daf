//! Upload API endpoint
//!
//! - POST /api/v1/upload/{folder} - Store a single file (field `file`) and
//!   return its public URL. Requires authentication.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::api::common::MultipartForm;
use crate::api::middleware::{ApiError, AppState, CurrentActor};
use crate::services::{StorageError, StoredFile, UploadFolder};

/// Build the upload router
pub fn router() -> Router<AppState> {
    Router::new().route("/{folder}", post(upload_file))
}

async fn upload_file(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(folder): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<StoredFile>), ApiError> {
    let folder: UploadFolder = folder
        .parse()
        .map_err(|_| StorageError::InvalidFolder(folder.clone()))?;

    let mut form = MultipartForm::read(multipart).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| ApiError::validation_error("No file provided"))?;

    let stored = state.storage.store_upload(folder, &file).await?;
    tracing::info!("{} uploaded {}", actor.participant(), stored.url);
    Ok((StatusCode::CREATED, Json(stored)))
}
