use std::fmt;
use std::str::FromStr;

/// How strictly `X-Twilio-Signature` is checked on webhook routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureMode {
    /// Reject requests whose signature is missing or wrong (403).
    Enforce,
    /// Verify and log failures, but let the request through.
    LogOnly,
    /// Skip verification entirely.
    Disabled,
}

impl SignatureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureMode::Enforce => "enforce",
            SignatureMode::LogOnly => "log_only",
            SignatureMode::Disabled => "disabled",
        }
    }

    /// Default mode given whether an auth token is available.
    pub fn default_for(has_auth_token: bool) -> Self {
        if has_auth_token {
            SignatureMode::Enforce
        } else {
            SignatureMode::Disabled
        }
    }
}

impl FromStr for SignatureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "enforce" | "strict" => Ok(SignatureMode::Enforce),
            "log_only" | "log-only" | "log" => Ok(SignatureMode::LogOnly),
            "disabled" | "off" | "none" => Ok(SignatureMode::Disabled),
            other => Err(format!(
                "Invalid signature mode '{other}'. Must be 'enforce', 'log_only' or 'disabled'"
            )),
        }
    }
}

impl fmt::Display for SignatureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body format of webhook responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// `{ "response", "pause", "next_prompt", "end_call" }`
    #[default]
    Json,
    /// TwiML voice document
    Twiml,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Twiml => "twiml",
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ResponseFormat::Json),
            "twiml" | "xml" => Ok(ResponseFormat::Twiml),
            other => Err(format!(
                "Invalid response format '{other}'. Must be 'json' or 'twiml'"
            )),
        }
    }
}

/// Twilio integration settings
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    /// Account auth token, the HMAC key for request signatures
    pub auth_token: Option<String>,
    pub signature_mode: SignatureMode,
    /// Public base URL Twilio calls (e.g. `https://bot.example.com`).
    /// When unset, the URL is rebuilt from `Host` and `X-Forwarded-Proto`.
    pub webhook_base_url: Option<String>,
    pub response_format: ResponseFormat,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            auth_token: None,
            signature_mode: SignatureMode::Disabled,
            webhook_base_url: None,
            response_format: ResponseFormat::Json,
        }
    }
}
