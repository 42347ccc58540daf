//! Dashboard endpoints
//!
//! - GET /api/v1/dashboard/admin - Program counters plus server stats (admin)
//! - GET /api/v1/dashboard/intern - The calling intern's overview

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::common::today;
use crate::api::middleware::{ApiError, AppState, CurrentActor};
use crate::services::{AdminStats, InternOverview};

/// Server-side counters from the request stats middleware
#[derive(Debug, Serialize)]
pub struct ServerStats {
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub failed_requests: u64,
    pub avg_response_time_ms: f64,
    pub change_subscribers: usize,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboardResponse {
    #[serde(flatten)]
    pub stats: AdminStats,
    pub server: ServerStats,
}

pub fn admin_router() -> Router<AppState> {
    Router::new().route("/admin", get(admin_dashboard))
}

pub fn protected_router() -> Router<AppState> {
    Router::new().route("/intern", get(intern_dashboard))
}

async fn admin_dashboard(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<AdminDashboardResponse>, ApiError> {
    let stats = state.dashboard_service.admin_stats(&actor, today()).await?;
    let request_stats = &state.request_stats;

    Ok(Json(AdminDashboardResponse {
        stats,
        server: ServerStats {
            uptime_seconds: request_stats.uptime_seconds(),
            total_requests: request_stats.total_requests(),
            failed_requests: request_stats.failed_requests(),
            avg_response_time_ms: request_stats.avg_response_time_us() / 1000.0,
            change_subscribers: state.changes.subscriber_count(),
        },
    }))
}

async fn intern_dashboard(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<InternOverview>, ApiError> {
    Ok(Json(state.dashboard_service.intern_overview(&actor).await?))
}
