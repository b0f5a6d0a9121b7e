//! Minimal TwiML document builder
//!
//! Only the verbs a speech-driven voice loop needs. Text and attribute values
//! are XML-escaped on insertion.

use std::fmt::Write;

/// Content type Twilio expects for TwiML responses
pub const TWIML_CONTENT_TYPE: &str = "application/xml";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Verb {
    Say(String),
    Pause(u32),
    Gather { action: String, timeout: u32 },
    Redirect(String),
    Hangup,
}

/// Builds a `<Response>` document verb by verb.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TwimlBuilder {
    verbs: Vec<Verb>,
}

impl TwimlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say(text.into()));
        self
    }

    pub fn pause(mut self, seconds: u32) -> Self {
        self.verbs.push(Verb::Pause(seconds));
        self
    }

    /// Listen for speech for up to `timeout` seconds, then POST the result to `action`.
    pub fn gather_speech(mut self, action: impl Into<String>, timeout: u32) -> Self {
        self.verbs.push(Verb::Gather {
            action: action.into(),
            timeout,
        });
        self
    }

    pub fn redirect(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Redirect(url.into()));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn build(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
        for verb in &self.verbs {
            // Writing to a String cannot fail
            let _ = match verb {
                Verb::Say(text) => write!(xml, "<Say>{}</Say>", escape_xml(text)),
                Verb::Pause(seconds) => write!(xml, r#"<Pause length="{seconds}"/>"#),
                Verb::Gather { action, timeout } => write!(
                    xml,
                    r#"<Gather input="speech" action="{}" method="POST" timeout="{timeout}"/>"#,
                    escape_xml(action)
                ),
                Verb::Redirect(url) => {
                    write!(xml, r#"<Redirect method="POST">{}</Redirect>"#, escape_xml(url))
                }
                Verb::Hangup => write!(xml, "<Hangup/>"),
            };
        }
        xml.push_str("</Response>");
        xml
    }
}

/// Escape the five XML special characters.
pub fn escape_xml(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
