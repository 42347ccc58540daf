//! Chat endpoints
//!
//! Conversations are addressed by key: `team:<intern>`, `peer:<a>:<b>` or
//! `task:<id>`.
//!
//! - GET /api/v1/messages/contacts?search=
//! - POST /api/v1/messages - Send `{ recipient, text }`
//! - GET /api/v1/messages/unread - Per-contact unread counts
//! - GET /api/v1/messages/team?intern_id= - Admin-team thread
//! - GET /api/v1/messages/peer/{intern_id} - Thread with another intern
//! - GET /api/v1/messages/threads/{key}
//! - GET /api/v1/messages/threads/{key}/unread
//! - POST /api/v1/messages/threads/{key}/read - Advance the read cursor

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{SearchQuery, SuccessResponse};
use crate::api::middleware::{ApiError, AppState, CurrentActor};
use crate::models::{Message, Participant};
use crate::services::{Contact, Conversation, UnreadSummary};

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub recipient: Participant,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    pub intern_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub last_seen_id: i64,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub conversation: String,
    pub unread: usize,
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(send))
        .route("/contacts", get(contacts))
        .route("/unread", get(unread_summary))
        .route("/team", get(team_thread))
        .route("/peer/{intern_id}", get(peer_thread))
        .route("/threads/{key}", get(thread))
        .route("/threads/{key}/unread", get(unread_count))
        .route("/threads/{key}/read", post(mark_read))
}

async fn contacts(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let search = query.search.as_deref().filter(|s| !s.trim().is_empty());
    Ok(Json(state.messaging_service.contacts(&actor, search).await?))
}

async fn send(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<SendRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let message = state
        .messaging_service
        .send(&actor, body.recipient, &body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn team_thread(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<TeamQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(
        state
            .messaging_service
            .team_thread(&actor, query.intern_id)
            .await?,
    ))
}

async fn peer_thread(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(intern_id): Path<i64>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(
        state.messaging_service.peer_thread(&actor, intern_id).await?,
    ))
}

async fn thread(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(key): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let conversation: Conversation = key.parse()?;
    Ok(Json(
        state.messaging_service.thread(&actor, conversation).await?,
    ))
}

async fn unread_count(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(key): Path<String>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let conversation: Conversation = key.parse()?;
    let unread = state
        .messaging_service
        .unread_count(&actor, conversation)
        .await?;
    Ok(Json(UnreadCountResponse {
        conversation: conversation.to_string(),
        unread,
    }))
}

async fn mark_read(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(key): Path<String>,
    Json(body): Json<MarkReadRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let conversation: Conversation = key.parse()?;
    state
        .messaging_service
        .mark_read(&actor, conversation, body.last_seen_id)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn unread_summary(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<UnreadSummary>, ApiError> {
    Ok(Json(state.messaging_service.unread_summary(&actor).await?))
}
