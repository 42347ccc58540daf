//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints of the EITP portal:
//! - Auth and admin management
//! - Intern roster, tasks, submissions and documents
//! - Events, gallery, MoUs and the homepage ticker
//! - Notifications, chat and the public contact inbox
//! - Dashboards, generic uploads and the change stream

pub mod auth;
pub mod changes;
pub mod common;
pub mod contact;
pub mod dashboard;
pub mod documents;
pub mod events;
pub mod gallery;
pub mod interns;
pub mod messages;
pub mod middleware;
pub mod mous;
pub mod notifications;
pub mod submissions;
pub mod tasks;
pub mod ticker;
pub mod upload;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

pub use middleware::{ApiError, AppState, CurrentActor, RequestStats};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/admins", auth::admin_router())
        .nest("/interns", interns::admin_router())
        .nest("/tasks", tasks::admin_router())
        .nest("/notifications", notifications::admin_router())
        .nest("/submissions", submissions::admin_router())
        .nest("/mous", mous::admin_router())
        .nest("/documents", documents::admin_router())
        .nest("/ticker", ticker::admin_router())
        .nest("/dashboard", dashboard::admin_router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (admins and interns; services check ownership)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/tasks", tasks::protected_router())
        .nest("/events", events::protected_router())
        .nest("/gallery", gallery::protected_router())
        .nest("/notifications", notifications::protected_router())
        .nest("/submissions", submissions::protected_router())
        .nest("/messages", messages::protected_router())
        .nest("/contact", contact::protected_router())
        .nest("/documents", documents::protected_router())
        .nest("/dashboard", dashboard::protected_router())
        .nest("/upload", upload::router())
        .nest("/changes", changes::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/events", events::public_router())
        .nest("/gallery", gallery::public_router())
        .nest("/contact", contact::public_router())
        .nest("/mous", mous::public_router())
        .nest("/ticker", ticker::public_router())
        .nest("/changes", changes::public_router())
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    // CORS with credentials so the session cookie is sent cross-origin
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    let upload_limit = usize::try_from(state.upload_config.max_file_size)
        .unwrap_or(usize::MAX)
        // Room for the other parts of a multi-file form
        .saturating_mul(4);

    Ok(Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        // Stored uploads
        .nest_service(
            &state.upload_config.public_prefix,
            ServeDir::new(&state.upload_config.path),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state))
}
