pub mod app_error;
pub mod signature_error;
