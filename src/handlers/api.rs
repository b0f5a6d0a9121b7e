use axum::{extract::State, response::Json};
use serde_json::{Map, Value, json};
use std::sync::Arc;

use crate::state::AppState;

/// Service banner listing the available endpoints
pub async fn home() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Phone Chatbot Server is running!",
        "endpoints": {
            "/": "Health check",
            "/health": "Configuration and call status",
            "/start": "Start a new bot session",
            "/stop": "Stop a bot session",
            "/twilio": "Handle Twilio webhooks",
            "/end": "End call and get summary"
        }
    }))
}

/// Health check handler
///
/// Reports which optional integration keys are configured (never their
/// values) and how many calls are in progress.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let variables: Map<String, Value> = state
        .config
        .integrations
        .status()
        .into_iter()
        .map(|(name, _, set)| (name.to_string(), Value::Bool(set)))
        .collect();

    Json(json!({
        "status": "ok",
        "message": "Bot Runner is healthy",
        "environment": {
            "variables": variables
        },
        "session_mode": state.calls.mode().as_str(),
        "active_calls": state.calls.active_calls()
    }))
}
