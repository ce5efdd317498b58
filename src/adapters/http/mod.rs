//! HTTP adapter: axum routers wired over the application handlers.

pub mod envelope;
pub mod live_events;
pub mod middleware;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::{Extension, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::application::Metrics;

pub use envelope::{error_response, ApiResponse};
pub use live_events::{event_routes, EventHandlers};
pub use middleware::{JwtVerifier, RequireAuth};
pub use users::{user_routes, UserHandlers};

/// Builds the full API router with tracing, CORS, the per-request timeout
/// budget, and the JWT verifier extension.
pub fn api_router(
    events: EventHandlers,
    users: UserHandlers,
    verifier: JwtVerifier,
    metrics: Arc<Metrics>,
    request_timeout: Duration,
) -> Router {
    Router::new()
        .nest("/api/events", event_routes(events))
        .nest("/api/users", user_routes(users))
        .route("/healthz", get(|| async { "ok" }))
        .route(
            "/metrics",
            get(move || {
                let metrics = metrics.clone();
                async move { Json(metrics.snapshot()) }
            }),
        )
        .layer(Extension(verifier))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
