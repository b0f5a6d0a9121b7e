pub mod twilio_signature;

pub use twilio_signature::{MAX_WEBHOOK_BODY_BYTES, twilio_signature_middleware};
