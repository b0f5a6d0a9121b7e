use axum::{Router, extract::DefaultBodyLimit, middleware, routing::post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::calls;
use crate::middleware::{MAX_WEBHOOK_BODY_BYTES, twilio_signature_middleware};
use crate::state::AppState;

/// Create the router for Twilio voice webhooks
///
/// Every route here is checked against `X-Twilio-Signature` according to the
/// configured signature mode. Bodies over `MAX_WEBHOOK_BODY_BYTES` get 413
/// whether or not the signature is checked.
pub fn create_webhook_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/twilio", post(calls::twilio_webhook))
        .route("/end", post(calls::end_call))
        .layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state,
            twilio_signature_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}
