use serde::Serialize;
use time::OffsetDateTime;

/// Mutable state tracked for one call between its start and termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSession {
    /// Set on the first event, never changed afterwards.
    pub started_at: OffsetDateTime,
    /// Most recent recognized utterance. Only moves forward.
    pub last_speech_at: OffsetDateTime,
    pub utterance_count: u32,
    pub silence_event_count: u32,
    /// Reset to zero whenever the caller speaks.
    pub consecutive_unanswered: u32,
    /// Most recent event of any kind. Only moves forward.
    pub last_event_at: OffsetDateTime,
    pub ended: bool,
}

impl CallSession {
    /// Initial state of a freshly started call.
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            started_at: now,
            last_speech_at: now,
            utterance_count: 0,
            silence_event_count: 0,
            consecutive_unanswered: 0,
            last_event_at: now,
            ended: false,
        }
    }

    /// Record a recognized utterance.
    pub(crate) fn record_speech(&mut self, now: OffsetDateTime) {
        self.utterance_count += 1;
        self.consecutive_unanswered = 0;
        if now > self.last_speech_at {
            self.last_speech_at = now;
        }
    }

    /// Record one polling interval without recognized speech.
    pub(crate) fn record_silence(&mut self) {
        self.silence_event_count += 1;
        self.consecutive_unanswered += 1;
    }

    pub(crate) fn touch(&mut self, now: OffsetDateTime) {
        if now > self.last_event_at {
            self.last_event_at = now;
        }
    }

    /// Time since the platform last reported anything for this call.
    pub fn idle_elapsed(&self, now: OffsetDateTime) -> time::Duration {
        let elapsed = now - self.last_event_at;
        if elapsed.is_negative() {
            time::Duration::ZERO
        } else {
            elapsed
        }
    }

    /// Time since the caller last spoke. Zero if `now` lags behind.
    pub fn silence_elapsed(&self, now: OffsetDateTime) -> time::Duration {
        let elapsed = now - self.last_speech_at;
        if elapsed.is_negative() {
            time::Duration::ZERO
        } else {
            elapsed
        }
    }

    pub(crate) fn summarize(&self, now: OffsetDateTime, reason: TerminationReason) -> CallSummary {
        let duration = now - self.started_at;
        CallSummary {
            reason,
            duration_seconds: duration.as_seconds_f64().max(0.0),
            silence_event_count: self.silence_event_count,
            consecutive_unanswered: self.consecutive_unanswered,
            utterance_count: self.utterance_count,
        }
    }
}

/// Why a call was terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Operator or caller asked to end the call.
    ExplicitEnd,
    /// Too many prompts went unanswered.
    NoResponse,
    /// No webhook arrived for the call within the idle timeout.
    Abandoned,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::ExplicitEnd => "explicit_end",
            TerminationReason::NoResponse => "no_response",
            TerminationReason::Abandoned => "abandoned",
        }
    }
}

/// Statistics reported when a call terminates.
///
/// Values are captured before the session is reset. The summary is meant for
/// logs and is never spoken to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSummary {
    pub reason: TerminationReason,
    pub duration_seconds: f64,
    pub silence_event_count: u32,
    pub consecutive_unanswered: u32,
    pub utterance_count: u32,
}

impl CallSummary {
    /// Summary for an end request that arrived with no call in progress.
    pub fn empty(reason: TerminationReason) -> Self {
        Self {
            reason,
            duration_seconds: 0.0,
            silence_event_count: 0,
            consecutive_unanswered: 0,
            utterance_count: 0,
        }
    }

    /// Emit the summary as a structured log line.
    pub fn log(&self, call_sid: Option<&str>) {
        tracing::info!(
            call_sid = call_sid.unwrap_or("-"),
            reason = self.reason.as_str(),
            duration_seconds = self.duration_seconds,
            silence_events = self.silence_event_count,
            user_utterances = self.utterance_count,
            unanswered_prompts = self.consecutive_unanswered,
            "Call summary"
        );
    }
}
