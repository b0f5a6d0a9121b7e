use axum::{
    Json,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::twiml::{TWIML_CONTENT_TYPE, TwimlBuilder};
use crate::config::ResponseFormat;
use crate::core::{Decision, TerminationReason};

pub const GREETING: &str = "Hello! This is your AI phone assistant.";
pub const FOLLOW_UP_PROMPT: &str = "Do you want to continue?";
pub const NO_RESPONSE_GOODBYE: &str = "No response detected. Goodbye.";
pub const CALL_ENDED_GOODBYE: &str = "Call ending. Goodbye.";
pub const APOLOGY: &str = "Sorry, I didn't catch that. Could you say that again?";

/// What the voice platform should do next.
///
/// Serialized as-is for JSON clients; TwiML rendering maps `pause` to the
/// speech gather timeout and `end_call` to `<Hangup/>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_call: Option<bool>,
}

impl WebhookResponse {
    pub fn from_decision(decision: &Decision, pause_seconds: u32) -> Self {
        match decision {
            Decision::Greet => Self::speak(GREETING, pause_seconds),
            Decision::Acknowledge { text } => Self {
                next_prompt: Some(FOLLOW_UP_PROMPT.to_string()),
                ..Self::speak(format!("You said: {text}"), pause_seconds)
            },
            Decision::Reprompt { message } => Self::speak(message.clone(), pause_seconds),
            Decision::Terminate { summary } => Self::goodbye(summary.reason),
        }
    }

    /// Reply for a payload that could not be understood.
    pub fn apology(pause_seconds: u32) -> Self {
        Self::speak(APOLOGY, pause_seconds)
    }

    pub fn goodbye(reason: TerminationReason) -> Self {
        let message = match reason {
            TerminationReason::NoResponse | TerminationReason::Abandoned => NO_RESPONSE_GOODBYE,
            TerminationReason::ExplicitEnd => CALL_ENDED_GOODBYE,
        };
        Self {
            response: message.to_string(),
            pause: None,
            next_prompt: None,
            end_call: Some(true),
        }
    }

    fn speak(message: impl Into<String>, pause_seconds: u32) -> Self {
        Self {
            response: message.into(),
            pause: Some(pause_seconds),
            next_prompt: None,
            end_call: None,
        }
    }

    pub fn ends_call(&self) -> bool {
        self.end_call == Some(true)
    }

    /// Render as a TwiML document; `action` is where the next gather posts.
    pub fn to_twiml(&self, action: &str) -> String {
        let mut twiml = TwimlBuilder::new().say(&self.response);
        if let Some(prompt) = &self.next_prompt {
            twiml = twiml.say(prompt);
        }
        if self.ends_call() {
            // Let the goodbye finish playing before the line drops
            twiml = twiml.pause(1).hangup();
        } else {
            // The redirect keeps the loop going when the gather times out
            // without speech; Twilio then posts an empty SpeechResult.
            twiml = twiml
                .gather_speech(action, self.pause.unwrap_or(1).max(1))
                .redirect(action);
        }
        twiml.build()
    }

    pub fn render(&self, format: ResponseFormat, action: &str) -> Response {
        match format {
            ResponseFormat::Json => Json(self).into_response(),
            ResponseFormat::Twiml => (
                [(header::CONTENT_TYPE, TWIML_CONTENT_TYPE)],
                self.to_twiml(action),
            )
                .into_response(),
        }
    }
}
