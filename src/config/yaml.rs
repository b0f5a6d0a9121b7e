use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present
/// here override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8000
///   tls:
///     enabled: true
///     cert_path: "/etc/phonebot/cert.pem"
///     key_path: "/etc/phonebot/key.pem"
///
/// twilio:
///   auth_token: "your-twilio-auth-token"
///   signature_mode: "enforce"
///   webhook_base_url: "https://bot.example.com"
///   response_format: "json"
///
/// calls:
///   pause_seconds: 5
///   max_unanswered_prompts: 3
///   long_silence_seconds: 10
///   session_mode: "single"
///   idle_timeout_seconds: 300
///
/// integrations:
///   daily_api_key: "your-daily-key"
///   google_api_key: "your-google-key"
///   deepgram_api_key: "your-deepgram-key"
///
/// security:
///   cors_allowed_origins: "*"
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub twilio: Option<TwilioYaml>,
    pub calls: Option<CallsYaml>,
    pub integrations: Option<IntegrationsYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Twilio configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TwilioYaml {
    pub auth_token: Option<String>,
    /// "enforce", "log_only" or "disabled"
    pub signature_mode: Option<String>,
    pub webhook_base_url: Option<String>,
    /// "json" or "twiml"
    pub response_format: Option<String>,
}

/// Call handling configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CallsYaml {
    pub pause_seconds: Option<u32>,
    pub max_unanswered_prompts: Option<u32>,
    pub long_silence_seconds: Option<u64>,
    /// "single" or "per_call"
    pub session_mode: Option<String>,
    pub idle_timeout_seconds: Option<u64>,
}

/// Optional bot integration keys from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct IntegrationsYaml {
    pub daily_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub deepgram_api_key: Option<String>,
}

/// Security configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    pub rate_limit_requests_per_second: Option<u32>,
    /// Maximum burst size for rate limiting
    pub rate_limit_burst_size: Option<u32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config {}: {e}", path.display()))?;

        Ok(config)
    }
}
