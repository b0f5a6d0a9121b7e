use time::OffsetDateTime;
use tracing::debug;

use super::session::{CallSession, CallSummary, TerminationReason};

/// Prompt used when the caller has not answered but spoke recently.
pub const STILL_THERE_PROMPT: &str = "Are you still there?";

/// Prompt used once the caller has been silent past the long-silence threshold.
pub const LONG_SILENCE_PROMPT: &str = "You've been quiet for a while. Are you still there?";

/// Thresholds driving the termination decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Unanswered prompts in a row after which the call is ended.
    /// Default: 3
    pub max_unanswered_prompts: u32,
    /// Silence since the last utterance that counts as an extra unanswered prompt.
    /// Default: 10s
    pub long_silence: time::Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_unanswered_prompts: 3,
            long_silence: time::Duration::seconds(10),
        }
    }
}

/// One inbound webhook event, already parsed by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    /// Call beginning.
    Start,
    /// The platform recognized speech in this polling interval.
    SpeechRecognized { text: String, confidence: f32 },
    /// No speech in this polling interval.
    Silence,
    /// Operator- or caller-initiated termination.
    ExplicitEnd,
}

impl CallEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            CallEvent::Start => "start",
            CallEvent::SpeechRecognized { .. } => "speech",
            CallEvent::Silence => "silence",
            CallEvent::ExplicitEnd => "explicit_end",
        }
    }
}

/// What the webhook handler should tell the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Greet,
    Acknowledge { text: String },
    Reprompt { message: String },
    Terminate { summary: CallSummary },
}

impl Decision {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Decision::Terminate { .. })
    }
}

/// Converts webhook events into decisions for a single call.
///
/// The tracker never reads the clock: every operation takes `now` so the
/// state machine is deterministic. It never fails; every event in every
/// state yields exactly one decision.
#[derive(Debug, Clone, Default)]
pub struct CallProgressTracker {
    config: TrackerConfig,
    session: Option<CallSession>,
}

impl CallProgressTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// The session in progress, if any.
    pub fn session(&self) -> Option<&CallSession> {
        self.session.as_ref().filter(|s| !s.ended)
    }

    pub fn is_active(&self) -> bool {
        self.session().is_some()
    }

    /// Whether the call in progress has gone without events for `timeout`.
    ///
    /// A tracker with no call in progress is never idle.
    pub fn is_idle(&self, now: OffsetDateTime, timeout: time::Duration) -> bool {
        self.session()
            .is_some_and(|session| session.idle_elapsed(now) >= timeout)
    }

    /// Drop any session state and return to the initial empty state.
    pub fn reset(&mut self) {
        self.session = None;
    }

    pub fn handle_event(&mut self, event: CallEvent, now: OffsetDateTime) -> Decision {
        debug!(event = event.kind(), active = self.is_active(), "Handling call event");

        if !self.is_active() {
            return match event {
                CallEvent::ExplicitEnd => Decision::Terminate {
                    summary: CallSummary::empty(TerminationReason::ExplicitEnd),
                },
                _ => self.start(now),
            };
        }

        if let Some(session) = self.session.as_mut() {
            session.touch(now);
        }

        match event {
            CallEvent::Start => Decision::Greet,
            CallEvent::SpeechRecognized { text, .. } => {
                let text = text.trim();
                if text.is_empty() {
                    return self.on_silence(now);
                }
                if let Some(session) = self.session.as_mut() {
                    session.record_speech(now);
                }
                Decision::Acknowledge {
                    text: text.to_string(),
                }
            }
            CallEvent::Silence => self.on_silence(now),
            CallEvent::ExplicitEnd => Decision::Terminate {
                summary: self.finalize(now, TerminationReason::ExplicitEnd),
            },
        }
    }

    /// Close the current session and return its summary.
    ///
    /// The summary carries the counters as they were at termination; the
    /// tracker is empty afterwards and the next event starts a new call.
    pub fn finalize(&mut self, now: OffsetDateTime, reason: TerminationReason) -> CallSummary {
        let summary = match self.session.as_mut() {
            Some(session) => {
                session.ended = true;
                session.summarize(now, reason)
            }
            None => CallSummary::empty(reason),
        };
        self.reset();
        summary
    }

    fn start(&mut self, now: OffsetDateTime) -> Decision {
        self.session = Some(CallSession::new(now));
        Decision::Greet
    }

    fn on_silence(&mut self, now: OffsetDateTime) -> Decision {
        let threshold = self.config.max_unanswered_prompts;
        let long_silence = self.config.long_silence;

        let Some(session) = self.session.as_mut() else {
            return self.start(now);
        };

        session.record_silence();

        let long_quiet = session.silence_elapsed(now) >= long_silence;
        if long_quiet {
            // A long silence counts as a second unanswered prompt for this event.
            session.consecutive_unanswered += 1;
        }

        if session.consecutive_unanswered >= threshold {
            return Decision::Terminate {
                summary: self.finalize(now, TerminationReason::NoResponse),
            };
        }

        let message = if long_quiet {
            LONG_SILENCE_PROMPT
        } else {
            STILL_THERE_PROMPT
        };
        Decision::Reprompt {
            message: message.to_string(),
        }
    }
}
