//! Twilio voice webhook handlers
//!
//! Both routes sit behind the signature middleware, so the body reaching
//! them has already been verified (or deliberately let through).

use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::Response,
};
use bytes::Bytes;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::core::{CallEvent, Decision};
use crate::errors::app_error::AppResult;
use crate::state::AppState;
use crate::twilio::{TwilioWebhookPayload, WebhookParams, WebhookResponse};

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

/// Handle a call-progress webhook
///
/// Turns the payload into a call event, runs it through the call's tracker
/// and replies with what the platform should say or do next.
///
/// An unreadable payload does not advance the call: the caller is asked to
/// repeat. A brand-new call is still greeted first.
///
/// # Returns
/// * `200 OK` - JSON or TwiML reply, depending on `TWILIO_RESPONSE_FORMAT`
/// * `400 Bad Request` - `CallSid` missing while sessions are tracked per call
pub async fn twilio_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let now = OffsetDateTime::now_utc();

    let reply = match TwilioWebhookPayload::parse(content_type(&headers), &body) {
        Ok(payload) => {
            let call_sid = payload.call_sid.clone();
            let event = payload.into_event();
            debug!(
                call_sid = call_sid.as_deref().unwrap_or("-"),
                event = event.kind(),
                "Call event received"
            );

            let decision = state.calls.handle_event(call_sid.as_deref(), event, now)?;
            respond(&state, call_sid.as_deref(), &decision)
        }
        Err(e) => {
            warn!(error = %e, "Unreadable webhook payload");
            let call_sid = WebhookParams::from_form(&body)
                .get("CallSid")
                .map(str::to_string);

            match state.calls.ensure_started(call_sid.as_deref(), now) {
                Ok(Some(decision)) => respond(&state, call_sid.as_deref(), &decision),
                // Without a CallSid there is no call to greet in per-call mode
                Ok(None) | Err(_) => WebhookResponse::apology(state.pause_seconds()),
            }
        }
    };

    Ok(reply.render(
        state.config.twilio.response_format,
        &state.webhook_action_url(),
    ))
}

/// End the call on request
///
/// The summary of the finished call is logged; the caller only hears a
/// goodbye. Ending a call that is not in progress still says goodbye.
pub async fn end_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let now = OffsetDateTime::now_utc();

    // The end request only needs the CallSid; the rest of the body is ignored
    let call_sid = WebhookParams::parse(content_type(&headers), &body)
        .ok()
        .and_then(|params| params.get("CallSid").map(str::trim).map(str::to_string))
        .filter(|sid| !sid.is_empty());

    let decision = state
        .calls
        .handle_event(call_sid.as_deref(), CallEvent::ExplicitEnd, now)?;
    let reply = respond(&state, call_sid.as_deref(), &decision);

    Ok(reply.render(
        state.config.twilio.response_format,
        &state.webhook_action_url(),
    ))
}

fn respond(state: &AppState, call_sid: Option<&str>, decision: &Decision) -> WebhookResponse {
    match decision {
        Decision::Terminate { summary } => {
            summary.log(call_sid);
        }
        Decision::Greet => {
            info!(call_sid = call_sid.unwrap_or("-"), "Call started");
        }
        Decision::Acknowledge { .. } | Decision::Reprompt { .. } => {}
    }
    WebhookResponse::from_decision(decision, state.pause_seconds())
}
