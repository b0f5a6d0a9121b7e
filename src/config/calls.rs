use crate::core::{SessionMode, TrackerConfig};

/// Call handling settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallsConfig {
    /// Pause directive sent with prompts, in seconds
    /// Default: 5
    pub pause_seconds: u32,
    /// Unanswered prompts in a row before hanging up
    /// Default: 3
    pub max_unanswered_prompts: u32,
    /// Silence since the last utterance that counts as an extra unanswered prompt
    /// Default: 10
    pub long_silence_seconds: u64,
    /// Default: single
    pub session_mode: SessionMode,
    /// A call with no webhook for this long is treated as abandoned
    /// Default: 300
    pub idle_timeout_seconds: u64,
}

impl Default for CallsConfig {
    fn default() -> Self {
        Self {
            pause_seconds: 5,
            max_unanswered_prompts: 3,
            long_silence_seconds: 10,
            session_mode: SessionMode::Single,
            idle_timeout_seconds: 300,
        }
    }
}

impl CallsConfig {
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            max_unanswered_prompts: self.max_unanswered_prompts,
            long_silence: time::Duration::seconds(self.long_silence_seconds as i64),
        }
    }

    pub fn idle_timeout(&self) -> time::Duration {
        time::Duration::seconds(self.idle_timeout_seconds as i64)
    }
}
