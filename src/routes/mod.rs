pub mod api;
pub mod webhooks;
