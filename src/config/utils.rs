/// Parse a boolean value from a string, supporting multiple formats
///
/// Accepts: "true", "false", "1", "0", "yes", "no" (case insensitive)
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Treat empty or whitespace-only values as unset
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Mask a secret for display, keeping only its length visible
pub fn redact(secret: &Option<String>) -> String {
    match secret {
        Some(s) if !s.is_empty() => format!("<redacted:{} chars>", s.len()),
        _ => "<unset>".to_string(),
    }
}
