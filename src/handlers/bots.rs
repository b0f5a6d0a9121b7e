//! Bot session lifecycle endpoints
//!
//! The gateway does not run bots itself. These endpoints acknowledge start
//! and stop requests so an external bot runner can be wired in behind them.

use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::app_error::{AppError, AppResult};

fn default_bot_name() -> String {
    "AI Assistant".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotStartRequest {
    pub room_name: String,
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
}

impl BotStartRequest {
    fn validate(&self) -> AppResult<()> {
        if self.room_name.trim().is_empty() {
            return Err(AppError::BadRequest("room_name must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BotResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_name: Option<String>,
}

impl BotResponse {
    fn success(message: String, request: BotStartRequest) -> Self {
        Self {
            status: "success".to_string(),
            message,
            room_name: Some(request.room_name),
            bot_name: Some(request.bot_name),
        }
    }
}

pub async fn start_bot(Json(request): Json<BotStartRequest>) -> AppResult<Json<BotResponse>> {
    request.validate()?;
    info!(bot_name = %request.bot_name, room_name = %request.room_name, "Starting bot");

    let message = format!(
        "Bot {} started in room {}",
        request.bot_name, request.room_name
    );
    Ok(Json(BotResponse::success(message, request)))
}

pub async fn stop_bot(Json(request): Json<BotStartRequest>) -> AppResult<Json<BotResponse>> {
    request.validate()?;
    info!(bot_name = %request.bot_name, room_name = %request.room_name, "Stopping bot");

    let message = format!(
        "Bot {} stopped in room {}",
        request.bot_name, request.room_name
    );
    Ok(Json(BotResponse::success(message, request)))
}
