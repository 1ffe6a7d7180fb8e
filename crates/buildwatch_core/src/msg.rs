use chrono::{DateTime, Utc};

use crate::{Job, JobId, PollOutcome, Settings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User added a job from a successfully parsed locator.
    JobSubmitted(Job),
    /// User deleted a job.
    RemoveRequested { job_id: JobId },
    /// User saved the settings form.
    SettingsSaved(Settings),
    /// Poll period elapsed.
    Tick,
    /// A status query finished, successfully or not.
    PollCompleted {
        job_id: JobId,
        outcome: PollOutcome,
        checked_at: DateTime<Utc>,
    },
}
