use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::MissedTickBehavior;

use crate::config::ServerConfig;
use crate::core::CallRegistry;

/// Application state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    /// Call-progress trackers, one shared or one per `CallSid`
    pub calls: CallRegistry,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let calls = CallRegistry::new(config.calls.session_mode, config.calls.tracker_config());

        tracing::info!(
            session_mode = config.calls.session_mode.as_str(),
            max_unanswered_prompts = config.calls.max_unanswered_prompts,
            long_silence_seconds = config.calls.long_silence_seconds,
            idle_timeout_seconds = config.calls.idle_timeout_seconds,
            "Call registry initialized"
        );

        Arc::new(Self { config, calls })
    }

    /// Seconds the caller gets to answer before a silent poll
    pub fn pause_seconds(&self) -> u32 {
        self.config.calls.pause_seconds
    }

    /// Where TwiML gathers and redirects post back to
    pub fn webhook_action_url(&self) -> String {
        match &self.config.twilio.webhook_base_url {
            Some(base) => format!("{base}/twilio"),
            None => "/twilio".to_string(),
        }
    }

    /// Start the background task that ends calls whose webhooks stopped.
    ///
    /// Runs every half idle timeout, at most once a minute and at least once
    /// a second. The returned handle can be aborted on shutdown.
    pub fn start_idle_call_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let state = Arc::clone(self);
        let idle_timeout = state.config.calls.idle_timeout();
        let period = Duration::from_secs((state.config.calls.idle_timeout_seconds / 2).clamp(1, 60));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                state
                    .calls
                    .evict_idle(OffsetDateTime::now_utc(), idle_timeout);
            }
        })
    }
}
