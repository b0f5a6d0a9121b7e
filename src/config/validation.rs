use super::{CallsConfig, SignatureMode, TlsConfig, TwilioConfig};

/// Validate Twilio signature settings
///
/// Verification needs the account auth token; a mode that verifies without
/// one would reject (or warn about) every request.
pub fn validate_twilio(twilio: &TwilioConfig) -> Result<(), Box<dyn std::error::Error>> {
    if twilio.signature_mode != SignatureMode::Disabled && twilio.auth_token.is_none() {
        return Err(format!(
            "TWILIO_AUTH_TOKEN is required when TWILIO_SIGNATURE_MODE={}",
            twilio.signature_mode
        )
        .into());
    }

    if let Some(base_url) = &twilio.webhook_base_url {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| format!("Invalid TWILIO_WEBHOOK_BASE_URL '{base_url}': {e}"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(format!(
                "TWILIO_WEBHOOK_BASE_URL must use http or https, got '{}'",
                parsed.scheme()
            )
            .into());
        }
    }

    Ok(())
}

/// Validate call thresholds
pub fn validate_calls(calls: &CallsConfig) -> Result<(), Box<dyn std::error::Error>> {
    if calls.max_unanswered_prompts == 0 {
        return Err("CALL_MAX_UNANSWERED_PROMPTS must be at least 1".into());
    }
    if calls.long_silence_seconds == 0 {
        return Err("CALL_LONG_SILENCE_SECONDS must be at least 1".into());
    }
    if calls.long_silence_seconds > i64::MAX as u64 {
        return Err("CALL_LONG_SILENCE_SECONDS is out of range".into());
    }
    if calls.idle_timeout_seconds == 0 || calls.idle_timeout_seconds > i64::MAX as u64 {
        return Err("CALL_IDLE_TIMEOUT_SECONDS must be between 1 and i64::MAX".into());
    }
    if calls.idle_timeout_seconds <= u64::from(calls.pause_seconds) {
        return Err(format!(
            "CALL_IDLE_TIMEOUT_SECONDS ({}) must be longer than CALL_PAUSE_SECONDS ({})",
            calls.idle_timeout_seconds, calls.pause_seconds
        )
        .into());
    }
    Ok(())
}

/// Validate that TLS certificate and key files exist
pub fn validate_tls(tls: &Option<TlsConfig>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(tls) = tls {
        if !tls.cert_path.exists() {
            return Err(format!(
                "TLS certificate file does not exist: {}",
                tls.cert_path.display()
            )
            .into());
        }
        if !tls.key_path.exists() {
            return Err(
                format!("TLS key file does not exist: {}", tls.key_path.display()).into(),
            );
        }
    }
    Ok(())
}

/// Validate rate limiting values
pub fn validate_rate_limit(
    requests_per_second: u32,
    burst_size: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if requests_per_second == 0 {
        return Err("RATE_LIMIT_REQUESTS_PER_SECOND must be at least 1".into());
    }
    if burst_size == 0 {
        return Err("RATE_LIMIT_BURST_SIZE must be at least 1".into());
    }
    Ok(())
}
