use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::handle_panic;
use crate::handlers::{detect_deepfake, health_check};
use crate::state::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/detect-deepfake", post(detect_deepfake))
        .route("/health", get(health_check))
}

/// Full application: routes plus body limit, panic recovery, tracing and
/// permissive CORS.
pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.system_config.max_body_bytes;

    Router::new()
        .merge(create_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
