//! Homepage ticker endpoints
//!
//! - GET /api/v1/ticker - Items to rotate through, with `rotate_ms`
//! - GET/POST /api/v1/ticker/settings (admin)
//! - DELETE /api/v1/ticker/settings/{id} (admin)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{today, SuccessResponse};
use crate::api::middleware::{ApiError, AppState, CurrentActor};
use crate::models::{TickerFeed, TickerSetting};

#[derive(Debug, Deserialize)]
pub struct AddSettingRequest {
    pub value: String,
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(ticker_items))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(list_settings).post(add_setting))
        .route("/settings/{id}", delete(delete_setting))
}

async fn ticker_items(State(state): State<AppState>) -> Result<Json<TickerFeed>, ApiError> {
    Ok(Json(state.ticker_service.ticker_items(today()).await?))
}

async fn list_settings(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<TickerSetting>>, ApiError> {
    Ok(Json(state.ticker_service.list_ticker_settings(&actor).await?))
}

async fn add_setting(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<AddSettingRequest>,
) -> Result<(StatusCode, Json<TickerSetting>), ApiError> {
    let setting = state
        .ticker_service
        .add_ticker_setting(&actor, &body.value)
        .await?;
    Ok((StatusCode::CREATED, Json(setting)))
}

async fn delete_setting(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.ticker_service.delete_ticker_setting(&actor, id).await?;
    Ok(Json(SuccessResponse::ok()))
}
