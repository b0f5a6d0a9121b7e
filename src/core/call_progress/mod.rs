//! Call-progress tracking for phone bot calls.
//!
//! Each inbound webhook is turned into a [`CallEvent`] and fed to a
//! [`CallProgressTracker`], which answers with a [`Decision`]: greet the
//! caller, acknowledge what they said, prompt them again, or end the call.
//!
//! # State Transitions
//!
//! ```text
//! [Idle] ─── any event ──► Greet ──► [Active]
//!   │
//!   └── ExplicitEnd ──► Terminate (empty summary)
//!
//! [Active] ─── Start ──────────────► Greet (no-op)
//!          ─── SpeechRecognized ───► Acknowledge, unanswered = 0
//!          ─── Silence ────────────► Reprompt while unanswered < max
//!                                    (a silence of 10s or more counts twice)
//!          ─── Silence (max hit) ──► Terminate ──► [Idle]
//!          ─── ExplicitEnd ────────► Terminate ──► [Idle]
//! ```
//!
//! The [`CallRegistry`] owns the trackers, either a single shared one or one
//! per `CallSid`.

mod registry;
mod session;
mod tracker;

pub use registry::{CallRegistry, RegistryError, SessionMode};
pub use session::{CallSession, CallSummary, TerminationReason};
pub use tracker::{
    CallEvent, CallProgressTracker, Decision, LONG_SILENCE_PROMPT, STILL_THERE_PROMPT,
    TrackerConfig,
};
