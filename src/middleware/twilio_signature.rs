use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::sync::Arc;

use crate::config::SignatureMode;
use crate::errors::signature_error::{SignatureError, SignatureResult};
use crate::state::AppState;
use crate::twilio::{SIGNATURE_HEADER, SignedBody, verify_request};

/// Largest webhook body the gateway will buffer. Twilio call-progress
/// payloads are a few kilobytes.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 64 * 1024;

/// Reconstruct the URL Twilio signed.
///
/// A configured `webhook_base_url` wins, since the gateway usually sits behind
/// a proxy or tunnel that rewrites `Host`. Otherwise the URL is rebuilt from
/// `X-Forwarded-Proto` and `Host`.
fn signed_url(
    base_url: Option<&str>,
    tls: bool,
    headers: &HeaderMap,
    path_and_query: &str,
) -> SignatureResult<String> {
    if let Some(base) = base_url {
        return Ok(format!("{base}{path_and_query}"));
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(if tls { "https" } else { "http" });

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| SignatureError::InvalidRequest("Missing Host header".to_string()))?;

    Ok(format!("{scheme}://{host}{path_and_query}"))
}

/// Twilio request signature middleware
///
/// Buffers the body, recomputes the `X-Twilio-Signature` HMAC and compares.
/// The signature mode decides what happens on failure:
/// - `enforce`: reject with 403 and a JSON error
/// - `log_only`: log the failure and let the request through
/// - `disabled`: skip verification entirely
///
/// The buffered body is handed on to the handler unchanged.
pub async fn twilio_signature_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, SignatureError> {
    let twilio = &state.config.twilio;
    if twilio.signature_mode == SignatureMode::Disabled {
        return Ok(next.run(request).await);
    }

    let path = request.uri().path().to_string();
    let (parts, body) = request.into_parts();
    let body_bytes = match Limited::new(body, MAX_WEBHOOK_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let err = if e.downcast_ref::<LengthLimitError>().is_some() {
                SignatureError::PayloadTooLarge(MAX_WEBHOOK_BODY_BYTES)
            } else {
                SignatureError::InvalidRequest(format!("Failed to read request body: {e}"))
            };
            err.log(&path);
            return Err(err);
        }
    };

    let result = verify(&state, &parts.headers, parts.uri.path_and_query(), &body_bytes);

    match result {
        Ok(()) => {
            tracing::debug!(path = %path, "Twilio signature verified");
        }
        Err(e) if twilio.signature_mode == SignatureMode::LogOnly => {
            e.log(&path);
            tracing::warn!(path = %path, "Signature mode is log_only, request allowed");
        }
        Err(e) => {
            e.log(&path);
            return Err(e);
        }
    }

    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}

fn verify(
    state: &AppState,
    headers: &HeaderMap,
    path_and_query: Option<&axum::http::uri::PathAndQuery>,
    body: &[u8],
) -> SignatureResult<()> {
    let twilio = &state.config.twilio;
    let auth_token = twilio
        .auth_token
        .as_deref()
        .ok_or_else(|| SignatureError::ConfigError("TWILIO_AUTH_TOKEN is not set".to_string()))?;

    let url = signed_url(
        twilio.webhook_base_url.as_deref(),
        state.config.is_tls_enabled(),
        headers,
        path_and_query.map(|pq| pq.as_str()).unwrap_or("/"),
    )?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    verify_request(
        auth_token,
        &url,
        SignedBody::from_content_type(content_type),
        body,
        signature,
    )
}
