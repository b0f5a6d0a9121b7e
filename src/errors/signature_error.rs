use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Error codes for structured error responses
pub mod error_codes {
    pub const MISSING_SIGNATURE: &str = "missing_signature";
    pub const INVALID_SIGNATURE: &str = "invalid_signature";
    pub const BODY_HASH_MISMATCH: &str = "body_hash_mismatch";
    pub const INVALID_REQUEST: &str = "invalid_request";
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
    pub const CONFIG_ERROR: &str = "config_error";
}

/// Webhook signature verification errors
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// X-Twilio-Signature header is missing
    #[error("Missing X-Twilio-Signature header")]
    MissingSignature,

    /// Signature did not match the expected HMAC
    #[error("Webhook signature mismatch")]
    InvalidSignature,

    /// bodySHA256 query parameter does not match the JSON body
    #[error("bodySHA256 does not match request body")]
    BodyHashMismatch,

    /// The request could not be read for verification
    #[error("Invalid webhook request: {0}")]
    InvalidRequest(String),

    /// The body exceeded the buffering limit
    #[error("Webhook body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    /// Verification is on but no auth token is configured
    #[error("Signature configuration error: {0}")]
    ConfigError(String),
}

impl SignatureError {
    /// Get the error code for structured error responses
    pub fn error_code(&self) -> &'static str {
        match self {
            SignatureError::MissingSignature => error_codes::MISSING_SIGNATURE,
            SignatureError::InvalidSignature => error_codes::INVALID_SIGNATURE,
            SignatureError::BodyHashMismatch => error_codes::BODY_HASH_MISMATCH,
            SignatureError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            SignatureError::PayloadTooLarge(_) => error_codes::PAYLOAD_TOO_LARGE,
            SignatureError::ConfigError(_) => error_codes::CONFIG_ERROR,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            SignatureError::MissingSignature
            | SignatureError::InvalidSignature
            | SignatureError::BodyHashMismatch => StatusCode::FORBIDDEN,
            SignatureError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            SignatureError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            SignatureError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log the error at the appropriate level
    pub fn log(&self, path: &str) {
        match self {
            SignatureError::MissingSignature
            | SignatureError::InvalidSignature
            | SignatureError::BodyHashMismatch => {
                tracing::warn!(path = %path, error = %self, "Webhook signature rejected");
            }
            SignatureError::InvalidRequest(msg) => {
                tracing::warn!(path = %path, "Invalid webhook request: {}", msg);
            }
            SignatureError::PayloadTooLarge(limit) => {
                tracing::warn!(path = %path, limit, "Webhook body too large");
            }
            SignatureError::ConfigError(msg) => {
                tracing::error!(path = %path, "Signature configuration error: {}", msg);
            }
        }
    }
}

impl IntoResponse for SignatureError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16()
        }));
        (status, body).into_response()
    }
}

pub type SignatureResult<T> = Result<T, SignatureError>;
