use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{api, bots};
use crate::state::AppState;

/// Create the router for status and bot lifecycle endpoints
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::home))
        .route("/health", get(api::health_check))
        .route("/start", post(bots::start_bot))
        .route("/stop", post(bots::stop_bot))
        .layer(TraceLayer::new_for_http())
}
