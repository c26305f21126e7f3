use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::{
    handlers,
    middleware::{auth_middleware, metrics_middleware},
};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let request_timeout = Duration::from_secs(state.config().server.request_timeout_secs);

    // Webhooks (authenticated)
    let webhook_routes = Router::new()
        .route("/pack", post(handlers::pack))
        .route("/parse", post(handlers::parse))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Health checks (open)
    let api_routes = Router::new()
        .merge(webhook_routes)
        .route("/healthz/liveness", get(handlers::liveness))
        .route("/healthz/readiness", get(handlers::readiness));

    Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
