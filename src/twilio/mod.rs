//! Twilio voice webhook adapter
//!
//! Decodes webhook bodies into call events, verifies request signatures, and
//! renders call decisions back as JSON or TwiML.

pub mod payload;
pub mod response;
pub mod signature;
pub mod twiml;

pub use payload::{PayloadError, TwilioWebhookPayload, WebhookParams};
pub use response::WebhookResponse;
pub use signature::{SIGNATURE_HEADER, SignedBody, compute_signature, verify_request};
pub use twiml::TwimlBuilder;
