use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::utils::{non_empty, parse_bool};
use super::yaml::YamlConfig;
use super::{
    CallsConfig, IntegrationKeys, ResponseFormat, ServerConfig, SignatureMode, TlsConfig,
    TwilioConfig,
};
use crate::core::SessionMode;

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. YAML configuration values
/// 2. Environment variables
/// 3. Default values
///
/// # Arguments
/// * `yaml_config` - Optional YAML configuration to use as overrides
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();

    // Helper macro to get value with priority: YAML > ENV > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            $yaml_value
                .or_else(|| env::var($env_var).ok())
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // Helper macro for optional values: YAML > ENV
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            non_empty($yaml_value.or_else(|| env::var($env_var).ok()))
        };
    }

    // Helper macro for parsed values: YAML > ENV (parsed) > Default
    macro_rules! get_parsed {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            match $yaml_value {
                Some(v) => v,
                None => match env::var($env_var) {
                    Ok(raw) => raw
                        .trim()
                        .parse()
                        .map_err(|e| format!("Invalid {} value '{}': {}", $env_var, raw, e))?,
                    Err(_) => $default,
                },
            }
        };
    }

    let server = yaml.server.unwrap_or_default();
    let twilio = yaml.twilio.unwrap_or_default();
    let calls = yaml.calls.unwrap_or_default();
    let integrations = yaml.integrations.unwrap_or_default();
    let security = yaml.security.unwrap_or_default();

    // Server configuration
    let host = get_value!("HOST", server.host, "0.0.0.0");
    let port: u16 = get_parsed!("PORT", server.port, 8000);

    // TLS: `enabled: false` (YAML) or TLS_ENABLED=false switches TLS off even
    // when certificate paths are set
    let tls_yaml = server.tls.unwrap_or_default();
    let tls_enabled = tls_yaml
        .enabled
        .or_else(|| env::var("TLS_ENABLED").ok().and_then(|v| parse_bool(&v)));
    let tls = if tls_enabled == Some(false) {
        None
    } else {
        let cert_path = get_optional!("TLS_CERT_PATH", tls_yaml.cert_path);
        let key_path = get_optional!("TLS_KEY_PATH", tls_yaml.key_path);
        match (cert_path, key_path) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (None, None) => {
                if tls_enabled == Some(true) {
                    return Err("TLS is enabled but cert_path and key_path are not set".into());
                }
                None
            }
            _ => {
                return Err(
                    "Both TLS_CERT_PATH and TLS_KEY_PATH must be set to enable TLS".into(),
                );
            }
        }
    };

    // Twilio configuration
    let auth_token = get_optional!("TWILIO_AUTH_TOKEN", twilio.auth_token);
    let signature_mode = match get_optional!("TWILIO_SIGNATURE_MODE", twilio.signature_mode) {
        Some(raw) => SignatureMode::from_str(&raw)?,
        None => SignatureMode::default_for(auth_token.is_some()),
    };
    let webhook_base_url = get_optional!("TWILIO_WEBHOOK_BASE_URL", twilio.webhook_base_url)
        .map(|url| url.trim_end_matches('/').to_string());
    let response_format = match get_optional!("TWILIO_RESPONSE_FORMAT", twilio.response_format) {
        Some(raw) => ResponseFormat::from_str(&raw)?,
        None => ResponseFormat::default(),
    };

    // Call handling configuration
    let defaults = CallsConfig::default();
    let session_mode = match get_optional!("CALL_SESSION_MODE", calls.session_mode) {
        Some(raw) => SessionMode::from_str(&raw)?,
        None => defaults.session_mode,
    };
    let calls = CallsConfig {
        pause_seconds: get_parsed!("CALL_PAUSE_SECONDS", calls.pause_seconds, defaults.pause_seconds),
        max_unanswered_prompts: get_parsed!(
            "CALL_MAX_UNANSWERED_PROMPTS",
            calls.max_unanswered_prompts,
            defaults.max_unanswered_prompts
        ),
        long_silence_seconds: get_parsed!(
            "CALL_LONG_SILENCE_SECONDS",
            calls.long_silence_seconds,
            defaults.long_silence_seconds
        ),
        session_mode,
        idle_timeout_seconds: get_parsed!(
            "CALL_IDLE_TIMEOUT_SECONDS",
            calls.idle_timeout_seconds,
            defaults.idle_timeout_seconds
        ),
    };

    // Optional bot integrations
    let integrations = IntegrationKeys {
        daily_api_key: get_optional!("DAILY_API_KEY", integrations.daily_api_key),
        google_api_key: get_optional!("GOOGLE_API_KEY", integrations.google_api_key),
        deepgram_api_key: get_optional!("DEEPGRAM_API_KEY", integrations.deepgram_api_key),
    };

    // Security configuration
    let cors_allowed_origins = get_optional!("CORS_ALLOWED_ORIGINS", security.cors_allowed_origins)
        .or_else(|| Some("*".to_string()));
    let rate_limit_requests_per_second: u32 = get_parsed!(
        "RATE_LIMIT_REQUESTS_PER_SECOND",
        security.rate_limit_requests_per_second,
        60
    );
    let rate_limit_burst_size: u32 =
        get_parsed!("RATE_LIMIT_BURST_SIZE", security.rate_limit_burst_size, 10);

    Ok(ServerConfig {
        host,
        port,
        tls,
        twilio: TwilioConfig {
            auth_token,
            signature_mode,
            webhook_base_url,
            response_format,
        },
        calls,
        integrations,
        cors_allowed_origins,
        rate_limit_requests_per_second,
        rate_limit_burst_size,
    })
}
