//! Activities and calendar endpoints
//!
//! Public:
//! - GET /api/v1/events?status=all|running|upcoming|completed
//! - GET /api/v1/events/running
//! - GET /api/v1/events/calendar?year=&month=
//! - GET /api/v1/events/calendar/lists
//!
//! Staff:
//! - POST /api/v1/events
//! - DELETE /api/v1/events/{id}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Datelike;
use serde::Deserialize;

use crate::api::common::{today, StatusQuery, SuccessResponse};
use crate::api::middleware::{ApiError, AppState, CurrentActor};
use crate::models::{CreateEventInput, Event, EventFilter};
use crate::services::{CalendarLists, CalendarMonth, EventView};

/// Calendar month; defaults to the current one
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events))
        .route("/running", get(running_events))
        .route("/calendar", get(calendar))
        .route("/calendar/lists", get(calendar_lists))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_event))
        .route("/{id}", delete(delete_event))
}

async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<EventView>>, ApiError> {
    let filter = EventFilter::parse(query.status.as_deref())?;
    Ok(Json(state.event_service.list_events(filter, today()).await?))
}

async fn running_events(State(state): State<AppState>) -> Result<Json<Vec<EventView>>, ApiError> {
    Ok(Json(state.event_service.running_events(today()).await?))
}

async fn calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarMonth>, ApiError> {
    let now = today();
    let month = state
        .event_service
        .calendar(
            query.year.unwrap_or_else(|| now.year()),
            query.month.unwrap_or_else(|| now.month()),
            now,
        )
        .await?;
    Ok(Json(month))
}

async fn calendar_lists(State(state): State<AppState>) -> Result<Json<CalendarLists>, ApiError> {
    Ok(Json(state.event_service.calendar_lists(today()).await?))
}

async fn add_event(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<CreateEventInput>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let event = state.event_service.add_event(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn delete_event(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.event_service.delete_event(&actor, id).await?;
    Ok(Json(SuccessResponse::ok()))
}
