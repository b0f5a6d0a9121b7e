use std::str::FromStr;

use dashmap::DashMap;
use parking_lot::Mutex;
use time::OffsetDateTime;
use tracing::{debug, info};

use super::session::TerminationReason;
use super::tracker::{CallEvent, CallProgressTracker, Decision, TrackerConfig};

/// How webhook events are mapped onto call sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// One shared session for the whole process. Events are not told apart by
    /// call identifier, so only one call can be handled at a time.
    #[default]
    Single,
    /// One session per Twilio `CallSid`.
    PerCall,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Single => "single",
            SessionMode::PerCall => "per_call",
        }
    }
}

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(SessionMode::Single),
            "per_call" | "per-call" | "percall" => Ok(SessionMode::PerCall),
            other => Err(format!(
                "Invalid session mode '{other}'. Must be 'single' or 'per_call'"
            )),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("CallSid is required when sessions are tracked per call")]
    MissingCallSid,
}

/// Owns the call trackers and serializes access to each of them.
///
/// A tracker is locked for exactly one event. Nothing inside the lock awaits
/// or performs I/O.
pub struct CallRegistry {
    mode: SessionMode,
    config: TrackerConfig,
    single: Mutex<CallProgressTracker>,
    calls: DashMap<String, CallProgressTracker>,
}

impl CallRegistry {
    pub fn new(mode: SessionMode, config: TrackerConfig) -> Self {
        Self {
            mode,
            config,
            single: Mutex::new(CallProgressTracker::new(config)),
            calls: DashMap::new(),
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Number of calls with a session in progress.
    pub fn active_calls(&self) -> usize {
        match self.mode {
            SessionMode::Single => usize::from(self.single.lock().is_active()),
            SessionMode::PerCall => self.calls.iter().filter(|e| e.is_active()).count(),
        }
    }

    /// Feed one event to the tracker for `call_sid`.
    pub fn handle_event(
        &self,
        call_sid: Option<&str>,
        event: CallEvent,
        now: OffsetDateTime,
    ) -> Result<Decision, RegistryError> {
        self.with_tracker(call_sid, |tracker| tracker.handle_event(event, now))
    }

    /// Start the call if it has no session yet.
    ///
    /// Returns `Some(Decision::Greet)` when a new session was created, `None`
    /// when a call is already in progress.
    pub fn ensure_started(
        &self,
        call_sid: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Option<Decision>, RegistryError> {
        self.with_tracker(call_sid, |tracker| {
            if tracker.is_active() {
                None
            } else {
                Some(tracker.handle_event(CallEvent::Start, now))
            }
        })
    }

    /// End calls that have had no event for `idle_timeout`.
    ///
    /// Twilio does not report a hang-up to the progress webhook, so a call
    /// the caller abandoned would otherwise stay in progress forever. Each
    /// evicted call has its summary logged. Returns how many were evicted.
    pub fn evict_idle(&self, now: OffsetDateTime, idle_timeout: time::Duration) -> usize {
        match self.mode {
            SessionMode::Single => {
                let mut tracker = self.single.lock();
                if tracker.is_idle(now, idle_timeout) {
                    tracker.finalize(now, TerminationReason::Abandoned).log(None);
                    1
                } else {
                    0
                }
            }
            SessionMode::PerCall => {
                let mut evicted = 0;
                self.calls.retain(|call_sid, tracker| {
                    if !tracker.is_active() {
                        return false;
                    }
                    if tracker.is_idle(now, idle_timeout) {
                        tracker
                            .finalize(now, TerminationReason::Abandoned)
                            .log(Some(call_sid.as_str()));
                        evicted += 1;
                        return false;
                    }
                    true
                });
                if evicted > 0 {
                    info!(evicted, remaining = self.calls.len(), "Evicted idle call trackers");
                }
                evicted
            }
        }
    }

    fn with_tracker<T>(
        &self,
        call_sid: Option<&str>,
        f: impl FnOnce(&mut CallProgressTracker) -> T,
    ) -> Result<T, RegistryError> {
        match self.mode {
            SessionMode::Single => {
                let mut tracker = self.single.lock();
                Ok(f(&mut tracker))
            }
            SessionMode::PerCall => {
                let call_sid = call_sid
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or(RegistryError::MissingCallSid)?;

                let (result, finished) = {
                    let mut entry = self.calls.entry(call_sid.to_string()).or_insert_with(|| {
                        debug!(call_sid = %call_sid, "Creating call tracker");
                        CallProgressTracker::new(self.config)
                    });
                    let result = f(entry.value_mut());
                    (result, !entry.is_active())
                };

                if finished
                    && self
                        .calls
                        .remove_if(call_sid, |_, tracker| !tracker.is_active())
                        .is_some()
                {
                    info!(call_sid = %call_sid, "Released call tracker");
                }

                Ok(result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn t0() -> OffsetDateTime {
        datetime!(2024-05-01 12:00:00 UTC)
    }

    #[test]
    fn test_session_mode_parsing() {
        assert_eq!("single".parse::<SessionMode>(), Ok(SessionMode::Single));
        assert_eq!("PER_CALL".parse::<SessionMode>(), Ok(SessionMode::PerCall));
        assert_eq!("per-call".parse::<SessionMode>(), Ok(SessionMode::PerCall));
        assert!("many".parse::<SessionMode>().is_err());
    }

    #[test]
    fn test_single_mode_ignores_call_sid() {
        let registry = CallRegistry::new(SessionMode::Single, TrackerConfig::default());

        assert_eq!(
            registry.ensure_started(Some("CA1"), t0()).unwrap(),
            Some(Decision::Greet)
        );
        // A different CallSid still lands in the shared session
        assert_eq!(registry.ensure_started(Some("CA2"), t0()).unwrap(), None);
        assert_eq!(registry.active_calls(), 1);
    }

    #[test]
    fn test_per_call_mode_requires_call_sid() {
        let registry = CallRegistry::new(SessionMode::PerCall, TrackerConfig::default());

        assert_eq!(
            registry.handle_event(None, CallEvent::Start, t0()),
            Err(RegistryError::MissingCallSid)
        );
        assert_eq!(
            registry.handle_event(Some("  "), CallEvent::Start, t0()),
            Err(RegistryError::MissingCallSid)
        );
    }

    #[test]
    fn test_per_call_sessions_are_independent() {
        let registry = CallRegistry::new(SessionMode::PerCall, TrackerConfig::default());
        let now = t0();

        registry.ensure_started(Some("CA1"), now).unwrap();
        registry.ensure_started(Some("CA2"), now).unwrap();
        assert_eq!(registry.active_calls(), 2);

        for _ in 0..2 {
            let decision = registry
                .handle_event(Some("CA1"), CallEvent::Silence, now)
                .unwrap();
            assert!(matches!(decision, Decision::Reprompt { .. }));
        }

        // CA2 is unaffected by CA1's silence
        let decision = registry
            .handle_event(Some("CA2"), CallEvent::Silence, now)
            .unwrap();
        assert!(matches!(decision, Decision::Reprompt { .. }));

        let decision = registry
            .handle_event(Some("CA1"), CallEvent::Silence, now)
            .unwrap();
        assert!(decision.is_terminal());
        assert_eq!(registry.active_calls(), 1);
    }

    #[test]
    fn test_per_call_tracker_released_after_termination() {
        let registry = CallRegistry::new(SessionMode::PerCall, TrackerConfig::default());

        registry.ensure_started(Some("CA1"), t0()).unwrap();
        let decision = registry
            .handle_event(Some("CA1"), CallEvent::ExplicitEnd, t0())
            .unwrap();

        assert!(decision.is_terminal());
        assert_eq!(registry.active_calls(), 0);
        assert!(registry.calls.is_empty());
    }

    #[test]
    fn test_abandoned_calls_are_evicted() {
        let registry = CallRegistry::new(SessionMode::PerCall, TrackerConfig::default());
        let timeout = time::Duration::minutes(5);

        for i in 0..100 {
            registry.ensure_started(Some(&format!("CA{i}")), t0()).unwrap();
        }
        // CA0 keeps talking; the rest hung up without a final webhook
        registry
            .handle_event(
                Some("CA0"),
                CallEvent::SpeechRecognized {
                    text: "still here".to_string(),
                    confidence: 0.8,
                },
                t0() + time::Duration::minutes(4),
            )
            .unwrap();
        assert_eq!(registry.active_calls(), 100);

        let later = t0() + time::Duration::minutes(6);
        assert_eq!(registry.evict_idle(later, timeout), 99);
        assert_eq!(registry.calls.len(), 1);
        assert_eq!(registry.active_calls(), 1);

        // The survivor is still mid-call, not restarted
        let decision = registry
            .handle_event(Some("CA0"), CallEvent::Silence, later)
            .unwrap();
        assert!(matches!(decision, Decision::Reprompt { .. }));

        assert_eq!(registry.evict_idle(later + timeout, timeout), 1);
        assert!(registry.calls.is_empty());
    }

    #[test]
    fn test_idle_single_call_is_ended() {
        let registry = CallRegistry::new(SessionMode::Single, TrackerConfig::default());
        let timeout = time::Duration::minutes(5);

        registry.ensure_started(None, t0()).unwrap();
        assert_eq!(registry.evict_idle(t0() + time::Duration::minutes(1), timeout), 0);
        assert_eq!(registry.active_calls(), 1);

        assert_eq!(registry.evict_idle(t0() + timeout, timeout), 1);
        assert_eq!(registry.active_calls(), 0);
        // The next caller is greeted as a new call
        assert_eq!(
            registry.ensure_started(None, t0() + timeout).unwrap(),
            Some(Decision::Greet)
        );
    }

    #[test]
    fn test_concurrent_calls_on_shared_registry() {
        use std::sync::Arc;

        let registry = Arc::new(CallRegistry::new(
            SessionMode::PerCall,
            TrackerConfig::default(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let sid = format!("CA{i}");
                    registry.ensure_started(Some(&sid), t0()).unwrap();
                    registry
                        .handle_event(
                            Some(&sid),
                            CallEvent::SpeechRecognized {
                                text: "hi".to_string(),
                                confidence: 0.9,
                            },
                            t0(),
                        )
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            let decision = handle.join().unwrap();
            assert_eq!(
                decision,
                Decision::Acknowledge {
                    text: "hi".to_string()
                }
            );
        }
        assert_eq!(registry.active_calls(), 8);
    }
}
