use std::time::Duration;

use buildwatch_core::{JobId, Msg, PollOutcome};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The poll schedule fired.
    Tick,
    PollCompleted {
        job_id: JobId,
        outcome: PollOutcome,
        checked_at: DateTime<Utc>,
    },
}

impl From<EngineEvent> for Msg {
    fn from(event: EngineEvent) -> Self {
        match event {
            EngineEvent::Tick => Msg::Tick,
            EngineEvent::PollCompleted {
                job_id,
                outcome,
                checked_at,
            } => Msg::PollCompleted {
                job_id,
                outcome,
                checked_at,
            },
        }
    }
}

/// Tunables for the watch service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub poll_interval: Duration,
    /// Hard bound on a single status query, including body download.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Speak terminal transitions aloud as well as showing a notification.
    pub speak: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            speak: true,
        }
    }
}

impl ServiceConfig {
    pub fn client_settings(&self) -> crate::ClientSettings {
        crate::ClientSettings {
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
            ..crate::ClientSettings::default()
        }
    }
}
