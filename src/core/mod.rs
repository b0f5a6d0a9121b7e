pub mod call_progress;

// Re-export commonly used types for convenience
pub use call_progress::{
    CallEvent, CallProgressTracker, CallRegistry, CallSession, CallSummary, Decision,
    RegistryError, SessionMode, TerminationReason, TrackerConfig,
};
