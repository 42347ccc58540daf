//! Work submission endpoints
//!
//! - GET /api/v1/submissions - All submissions (admin)
//! - PUT /api/v1/submissions/{id}/review - Mark reviewed (admin)
//! - POST /api/v1/submissions - Multipart upload (`title`, `files`) (intern)
//! - GET /api/v1/submissions/mine (intern)
//! - GET/POST /api/v1/submissions/{id}/comments

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use crate::api::common::{MultipartForm, TextRequest};
use crate::api::middleware::{ApiError, AppState, CurrentActor};
use crate::models::{Submission, SubmissionComment};
use crate::services::BatchResult;

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_submissions))
        .route("/{id}/review", put(mark_reviewed))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_work))
        .route("/mine", get(my_submissions))
        .route("/{id}/comments", get(list_comments).post(add_comment))
}

async fn list_submissions(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<Submission>>, ApiError> {
    Ok(Json(state.submission_service.list_submissions(&actor).await?))
}

async fn my_submissions(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<Submission>>, ApiError> {
    Ok(Json(state.submission_service.my_submissions(&actor).await?))
}

async fn submit_work(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BatchResult<Submission>>), ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let title = form.text_or_default("title");
    let files = form.take_files(&["files", "file"]);

    let result = state
        .submission_service
        .submit_work(&actor, &title, files)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn mark_reviewed(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<Submission>, ApiError> {
    Ok(Json(state.submission_service.mark_reviewed(&actor, id).await?))
}

async fn list_comments(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<Vec<SubmissionComment>>, ApiError> {
    Ok(Json(
        state
            .submission_service
            .list_submission_comments(&actor, id)
            .await?,
    ))
}

async fn add_comment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(body): Json<TextRequest>,
) -> Result<(StatusCode, Json<SubmissionComment>), ApiError> {
    let comment = state
        .submission_service
        .add_submission_comment(&actor, id, &body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
