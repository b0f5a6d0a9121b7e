//! HTTP request handlers
//!
//! - `api` - Service banner and health check
//! - `bots` - Bot session start/stop acknowledgements
//! - `calls` - Twilio call-progress and end-call webhooks

pub mod api;
pub mod bots;
pub mod calls;
