use serde_json::Value;

use crate::core::CallEvent;

/// Errors raised while decoding a webhook body
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),
    #[error("JSON body must be an object")]
    NotAnObject,
    #[error("Unsupported value for field '{0}'")]
    UnsupportedField(String),
}

/// Decoded webhook parameters, in the order they were received.
///
/// Twilio posts `application/x-www-form-urlencoded`; local test clients post
/// JSON. Both end up as flat `(name, value)` pairs so signature verification
/// and field extraction work the same way for either.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookParams(pub Vec<(String, String)>);

impl WebhookParams {
    /// Decode a request body according to its content type.
    ///
    /// Unknown or missing content types are sniffed: a body starting with `{`
    /// is read as JSON, anything else as a form.
    pub fn parse(content_type: Option<&str>, body: &[u8]) -> Result<Self, PayloadError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let is_json = match content_type.map(|ct| ct.to_ascii_lowercase()) {
            Some(ct) if ct.starts_with("application/json") => true,
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => false,
            _ => body.trim_ascii_start().starts_with(b"{"),
        };

        if is_json {
            Self::from_json(body)
        } else {
            Ok(Self::from_form(body))
        }
    }

    pub fn from_form(body: &[u8]) -> Self {
        Self(
            url::form_urlencoded::parse(body)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    pub fn from_json(body: &[u8]) -> Result<Self, PayloadError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| PayloadError::InvalidJson(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(PayloadError::NotAnObject);
        };

        let mut params = Vec::with_capacity(map.len());
        for (key, value) in map {
            let value = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(PayloadError::UnsupportedField(key));
                }
            };
            params.push((key, value));
        }
        Ok(Self(params))
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Fields of a Twilio voice webhook the gateway cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TwilioWebhookPayload {
    pub call_sid: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub speech_result: Option<String>,
    pub confidence: f32,
}

impl TwilioWebhookPayload {
    pub fn from_params(params: &WebhookParams) -> Self {
        let field = |name: &str| {
            params
                .get(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            call_sid: field("CallSid"),
            from: field("From"),
            to: field("To"),
            speech_result: field("SpeechResult"),
            // Twilio sends confidence as a decimal string; anything unreadable counts as 0
            confidence: params
                .get("Confidence")
                .and_then(|c| c.trim().parse::<f32>().ok())
                .filter(|c| c.is_finite())
                .unwrap_or(0.0),
        }
    }

    pub fn parse(content_type: Option<&str>, body: &[u8]) -> Result<Self, PayloadError> {
        WebhookParams::parse(content_type, body).map(|params| Self::from_params(&params))
    }

    /// A non-empty speech result means the caller spoke; otherwise the
    /// polling interval was silent.
    pub fn into_event(self) -> CallEvent {
        match self.speech_result {
            Some(text) => CallEvent::SpeechRecognized {
                text,
                confidence: self.confidence,
            },
            None => CallEvent::Silence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = "application/x-www-form-urlencoded";
    const JSON: &str = "application/json";

    #[test]
    fn test_form_payload() {
        let body = b"CallSid=CA123&From=%2B15076077082&To=%2B15550001111&SpeechResult=Hello%2C+this+is+a+test&Confidence=0.87";

        let payload = TwilioWebhookPayload::parse(Some(FORM), body).unwrap();

        assert_eq!(payload.call_sid.as_deref(), Some("CA123"));
        assert_eq!(payload.from.as_deref(), Some("+15076077082"));
        assert_eq!(payload.to.as_deref(), Some("+15550001111"));
        assert_eq!(payload.speech_result.as_deref(), Some("Hello, this is a test"));
        assert!((payload.confidence - 0.87).abs() < f32::EPSILON);
    }

    #[test]
    fn test_json_payload() {
        let body = br#"{"SpeechResult": "Hello, this is a test", "Confidence": 0.5, "CallSid": null}"#;

        let payload = TwilioWebhookPayload::parse(Some(JSON), body).unwrap();

        assert_eq!(payload.speech_result.as_deref(), Some("Hello, this is a test"));
        assert_eq!(payload.confidence, 0.5);
        assert!(payload.call_sid.is_none());
    }

    #[test]
    fn test_empty_body_is_silence() {
        let cases: [(Option<&str>, &[u8]); 3] = [(Some(JSON), b""), (Some(JSON), b"{}"), (None, b"  ")];
        for (ct, body) in cases {
            let payload = TwilioWebhookPayload::parse(ct, body).unwrap();
            assert_eq!(payload.into_event(), CallEvent::Silence);
        }
    }

    #[test]
    fn test_blank_speech_is_silence() {
        let payload = TwilioWebhookPayload::parse(Some(FORM), b"SpeechResult=+++").unwrap();
        assert_eq!(payload.into_event(), CallEvent::Silence);
    }

    #[test]
    fn test_speech_event() {
        let payload =
            TwilioWebhookPayload::parse(Some(FORM), b"SpeechResult=+book+a+table+").unwrap();
        assert_eq!(
            payload.into_event(),
            CallEvent::SpeechRecognized {
                text: "book a table".to_string(),
                confidence: 0.0
            }
        );
    }

    #[test]
    fn test_garbled_confidence_defaults_to_zero() {
        let payload =
            TwilioWebhookPayload::parse(Some(FORM), b"SpeechResult=hi&Confidence=high").unwrap();
        assert_eq!(payload.confidence, 0.0);

        let payload =
            TwilioWebhookPayload::parse(Some(FORM), b"SpeechResult=hi&Confidence=NaN").unwrap();
        assert_eq!(payload.confidence, 0.0);
    }

    #[test]
    fn test_content_type_sniffing() {
        let payload = TwilioWebhookPayload::parse(None, br#"{"SpeechResult":"yes"}"#).unwrap();
        assert_eq!(payload.speech_result.as_deref(), Some("yes"));

        let payload = TwilioWebhookPayload::parse(Some("text/plain"), b"SpeechResult=no").unwrap();
        assert_eq!(payload.speech_result.as_deref(), Some("no"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            TwilioWebhookPayload::parse(Some(JSON), b"{\"SpeechResult\": "),
            Err(PayloadError::InvalidJson(_))
        ));
        assert_eq!(
            TwilioWebhookPayload::parse(Some(JSON), b"[1, 2]"),
            Err(PayloadError::NotAnObject)
        );
        assert_eq!(
            TwilioWebhookPayload::parse(Some(JSON), br#"{"SpeechResult": {"text": "hi"}}"#),
            Err(PayloadError::UnsupportedField("SpeechResult".to_string()))
        );
    }

    #[test]
    fn test_params_keep_duplicates_in_order() {
        let params = WebhookParams::from_form(b"a=1&b=2&a=3");
        assert_eq!(params.0.len(), 3);
        assert_eq!(params.get("a"), Some("1"));
    }
}
