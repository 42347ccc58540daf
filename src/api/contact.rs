//! Contact inbox endpoints
//!
//! - POST /api/v1/contact - Public contact form
//! - GET /api/v1/contact?status=all|unread|resolved (staff)
//! - PUT /api/v1/contact/{id}/resolve (staff)
//! - POST /api/v1/contact/{id}/reply - Email the student, then resolve (staff)
//! - DELETE /api/v1/contact/{id} (staff)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};

use crate::api::common::{StatusQuery, SuccessResponse, TextRequest};
use crate::api::middleware::{ApiError, AppState, CurrentActor};
use crate::models::{ContactFilter, ContactMessage, CreateContactInput};

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", post(send_contact_message))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contact_messages))
        .route("/{id}", delete(delete_contact_message))
        .route("/{id}/resolve", put(resolve))
        .route("/{id}/reply", post(reply))
}

async fn send_contact_message(
    State(state): State<AppState>,
    Json(body): Json<CreateContactInput>,
) -> Result<(StatusCode, Json<ContactMessage>), ApiError> {
    let message = state.contact_service.send_contact_message(body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn list_contact_messages(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    let filter = ContactFilter::parse(query.status.as_deref())?;
    Ok(Json(
        state
            .contact_service
            .list_contact_messages(&actor, filter)
            .await?,
    ))
}

async fn resolve(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<ContactMessage>, ApiError> {
    Ok(Json(state.contact_service.resolve(&actor, id).await?))
}

async fn reply(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(body): Json<TextRequest>,
) -> Result<Json<ContactMessage>, ApiError> {
    Ok(Json(
        state.contact_service.reply(&actor, id, &body.text).await?,
    ))
}

async fn delete_contact_message(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .contact_service
        .delete_contact_message(&actor, id)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}
