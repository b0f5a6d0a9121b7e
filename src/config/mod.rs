//! Configuration module for the phone bot gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `twilio`: Twilio signature and response settings
//! - `calls`: Call-progress thresholds
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use phonebot_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use serde_json::{Value, json};

mod calls;
mod merge;
mod twilio;
mod utils;
mod validation;
mod yaml;

pub use calls::CallsConfig;
pub use twilio::{ResponseFormat, SignatureMode, TwilioConfig};
pub use utils::parse_bool;

/// TLS configuration for HTTPS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// API keys for the optional services a phone bot can use.
///
/// The gateway itself never calls these services; `/health` reports which
/// ones are configured so operators can tell a half-provisioned deployment
/// apart from a healthy one.
#[derive(Debug, Clone, Default)]
pub struct IntegrationKeys {
    /// Daily.co API key (media rooms)
    pub daily_api_key: Option<String>,
    /// Google API key (LLM)
    pub google_api_key: Option<String>,
    /// Deepgram API key (speech recognition)
    pub deepgram_api_key: Option<String>,
}

impl IntegrationKeys {
    /// Environment variable name, description, and whether the key is set.
    pub fn status(&self) -> [(&'static str, &'static str, bool); 3] {
        [
            (
                "DAILY_API_KEY",
                "Daily.co API key (optional)",
                self.daily_api_key.is_some(),
            ),
            (
                "GOOGLE_API_KEY",
                "Google API key (optional)",
                self.google_api_key.is_some(),
            ),
            (
                "DEEPGRAM_API_KEY",
                "Deepgram API key (optional)",
                self.deepgram_api_key.is_some(),
            ),
        ]
    }
}

/// Server configuration
///
/// Contains all configuration needed to run the gateway:
/// - Server settings (host, port, TLS)
/// - Twilio webhook verification and response format
/// - Call-progress thresholds and session mode
/// - Optional bot integration keys
/// - Security settings (CORS, rate limiting)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    pub twilio: TwilioConfig,
    pub calls: CallsConfig,
    pub integrations: IntegrationKeys,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: "*"
    pub cors_allowed_origins: Option<String>,

    // Rate limiting configuration
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,
}

/// Zeroize all secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut token) = self.twilio.auth_token {
            token.zeroize();
        }
        if let Some(ref mut key) = self.integrations.daily_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.integrations.google_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.integrations.deepgram_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables (the .env file is loaded
    /// by `main` beforehand), with defaults for everything that is unset.
    ///
    /// # Errors
    /// Returns an error if a variable has an invalid format or validation fails.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    /// Run all validation checks on the final configuration
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_twilio(&self.twilio)?;
        validation::validate_calls(&self.calls)?;
        validation::validate_tls(&self.tls)?;
        validation::validate_rate_limit(
            self.rate_limit_requests_per_second,
            self.rate_limit_burst_size,
        )?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Effective configuration with secrets masked, for `check-config`
    pub fn redacted_summary(&self) -> Value {
        json!({
            "server": {
                "address": self.address(),
                "tls": self.tls.as_ref().map(|tls| json!({
                    "cert_path": tls.cert_path.display().to_string(),
                    "key_path": tls.key_path.display().to_string(),
                })),
            },
            "twilio": {
                "auth_token": utils::redact(&self.twilio.auth_token),
                "signature_mode": self.twilio.signature_mode.as_str(),
                "webhook_base_url": self.twilio.webhook_base_url,
                "response_format": self.twilio.response_format.as_str(),
            },
            "calls": {
                "pause_seconds": self.calls.pause_seconds,
                "max_unanswered_prompts": self.calls.max_unanswered_prompts,
                "long_silence_seconds": self.calls.long_silence_seconds,
                "session_mode": self.calls.session_mode.as_str(),
                "idle_timeout_seconds": self.calls.idle_timeout_seconds,
            },
            "integrations": {
                "daily_api_key": utils::redact(&self.integrations.daily_api_key),
                "google_api_key": utils::redact(&self.integrations.google_api_key),
                "deepgram_api_key": utils::redact(&self.integrations.deepgram_api_key),
            },
            "security": {
                "cors_allowed_origins": self.cors_allowed_origins,
                "rate_limit_requests_per_second": self.rate_limit_requests_per_second,
                "rate_limit_burst_size": self.rate_limit_burst_size,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionMode;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "HOST",
        "PORT",
        "TLS_ENABLED",
        "TLS_CERT_PATH",
        "TLS_KEY_PATH",
        "TWILIO_AUTH_TOKEN",
        "TWILIO_SIGNATURE_MODE",
        "TWILIO_WEBHOOK_BASE_URL",
        "TWILIO_RESPONSE_FORMAT",
        "CALL_PAUSE_SECONDS",
        "CALL_MAX_UNANSWERED_PROMPTS",
        "CALL_LONG_SILENCE_SECONDS",
        "CALL_SESSION_MODE",
        "CALL_IDLE_TIMEOUT_SECONDS",
        "DAILY_API_KEY",
        "GOOGLE_API_KEY",
        "DEEPGRAM_API_KEY",
        "CORS_ALLOWED_ORIGINS",
        "RATE_LIMIT_REQUESTS_PER_SECOND",
        "RATE_LIMIT_BURST_SIZE",
    ];

    // Helper to clean up environment variables after tests
    fn cleanup_env_vars() {
        for var in ENV_VARS {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    fn set_env(key: &str, value: &str) {
        unsafe {
            env::set_var(key, value);
        }
    }

    /// Helper function to create a test ServerConfig with defaults
    fn test_config() -> ServerConfig {
        ServerConfig {
            host: "localhost".to_string(),
            port: 8000,
            tls: None,
            twilio: TwilioConfig::default(),
            calls: CallsConfig::default(),
            integrations: IntegrationKeys::default(),
            cors_allowed_origins: Some("*".to_string()),
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = ServerConfig::from_env().expect("Should load config");

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert!(config.tls.is_none());
        assert!(config.twilio.auth_token.is_none());
        assert_eq!(config.twilio.signature_mode, SignatureMode::Disabled);
        assert_eq!(config.twilio.response_format, ResponseFormat::Json);
        assert_eq!(config.calls, CallsConfig::default());
        assert_eq!(config.cors_allowed_origins.as_deref(), Some("*"));
        assert_eq!(config.rate_limit_requests_per_second, 60);
        assert_eq!(config.rate_limit_burst_size, 10);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_auth_token_enables_enforcement() {
        cleanup_env_vars();
        set_env("TWILIO_AUTH_TOKEN", "twilio-secret");

        let config = ServerConfig::from_env().expect("Should load config");

        assert_eq!(config.twilio.auth_token.as_deref(), Some("twilio-secret"));
        assert_eq!(config.twilio.signature_mode, SignatureMode::Enforce);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_log_only_without_token_fails() {
        cleanup_env_vars();
        set_env("TWILIO_SIGNATURE_MODE", "log_only");

        let result = ServerConfig::from_env();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("TWILIO_AUTH_TOKEN is required")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_call_settings() {
        cleanup_env_vars();
        set_env("CALL_PAUSE_SECONDS", "2");
        set_env("CALL_MAX_UNANSWERED_PROMPTS", "5");
        set_env("CALL_LONG_SILENCE_SECONDS", "30");
        set_env("CALL_SESSION_MODE", "per_call");
        set_env("CALL_IDLE_TIMEOUT_SECONDS", "120");
        set_env("TWILIO_WEBHOOK_BASE_URL", "https://bot.example.com/");

        let config = ServerConfig::from_env().expect("Should load config");

        assert_eq!(config.calls.pause_seconds, 2);
        assert_eq!(config.calls.max_unanswered_prompts, 5);
        assert_eq!(config.calls.long_silence_seconds, 30);
        assert_eq!(config.calls.session_mode, SessionMode::PerCall);
        assert_eq!(config.calls.idle_timeout_seconds, 120);
        // Trailing slash is trimmed so paths can be appended
        assert_eq!(
            config.twilio.webhook_base_url.as_deref(),
            Some("https://bot.example.com")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        cleanup_env_vars();
        set_env("PORT", "not-a-port");

        let err = ServerConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("Invalid PORT value"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_session_mode() {
        cleanup_env_vars();
        set_env("CALL_SESSION_MODE", "everything");

        assert!(ServerConfig::from_env().is_err());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_partial_tls_fails() {
        cleanup_env_vars();
        set_env("TLS_CERT_PATH", "/tmp/cert.pem");

        let err = ServerConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("TLS_KEY_PATH"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_tls_disabled_flag_wins() {
        cleanup_env_vars();
        set_env("TLS_CERT_PATH", "/nonexistent/cert.pem");
        set_env("TLS_KEY_PATH", "/nonexistent/key.pem");
        set_env("TLS_ENABLED", "false");

        let config = ServerConfig::from_env().expect("Should load config");
        assert!(!config.is_tls_enabled());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_yaml_overrides_env() {
        cleanup_env_vars();
        set_env("PORT", "7000");
        set_env("CALL_PAUSE_SECONDS", "9");
        set_env("DEEPGRAM_API_KEY", "dg-key");

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
server:
  port: 9100
calls:
  pause_seconds: 4
twilio:
  auth_token: "yaml-token"
  signature_mode: "log_only"
  response_format: "twiml"
"#,
        )
        .unwrap();

        let config = ServerConfig::from_file(&path).expect("Should load config");

        assert_eq!(config.port, 9100);
        assert_eq!(config.calls.pause_seconds, 4);
        assert_eq!(config.twilio.auth_token.as_deref(), Some("yaml-token"));
        assert_eq!(config.twilio.signature_mode, SignatureMode::LogOnly);
        assert_eq!(config.twilio.response_format, ResponseFormat::Twiml);
        // ENV still fills what YAML leaves out
        assert_eq!(config.integrations.deepgram_api_key.as_deref(), Some("dg-key"));

        cleanup_env_vars();
    }

    #[test]
    fn test_address() {
        let config = test_config();
        assert_eq!(config.address(), "localhost:8000");
    }

    #[test]
    fn test_integration_status() {
        let mut config = test_config();
        config.integrations.daily_api_key = Some("daily".to_string());

        let status = config.integrations.status();
        assert_eq!(status[0], ("DAILY_API_KEY", "Daily.co API key (optional)", true));
        assert!(!status[1].2);
        assert!(!status[2].2);
    }

    #[test]
    fn test_redacted_summary_hides_secrets() {
        let mut config = test_config();
        config.twilio.auth_token = Some("super-secret-token".to_string());
        config.twilio.signature_mode = SignatureMode::Enforce;

        let summary = config.redacted_summary();
        let rendered = summary.to_string();

        assert!(!rendered.contains("super-secret-token"));
        assert_eq!(summary["twilio"]["auth_token"], "<redacted:18 chars>");
        assert_eq!(summary["twilio"]["signature_mode"], "enforce");
        assert_eq!(summary["calls"]["session_mode"], "single");
    }
}
