use std::fmt;

use engine_logging::Redacted;

use crate::{Job, JobId, JobStatus, WatchEvent};

pub const NOTIFICATION_TITLE: &str = "Build Monitor";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Query the server for one job's status.
    Poll(PollRequest),
    /// Alert the user that a job reached a terminal status.
    Notify(Notification),
    /// Hand a state change to observers.
    Publish(WatchEvent),
}

#[derive(Clone, PartialEq, Eq)]
pub struct PollRequest {
    pub job_id: JobId,
    pub url: String,
    /// Full `Authorization` header value, if credentials are configured.
    pub authorization: Option<String>,
}

impl fmt::Debug for PollRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollRequest")
            .field("job_id", &self.job_id)
            .field("url", &self.url)
            .field(
                "authorization",
                &self.authorization.as_deref().map(Redacted),
            )
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub job_id: JobId,
    pub build_id: String,
    pub status: JobStatus,
    pub title: String,
    pub subtitle: String,
    pub body: String,
    /// Text for the optional spoken announcement.
    pub spoken: String,
}

impl Notification {
    pub fn for_job(job: &Job) -> Self {
        Self {
            job_id: job.id,
            build_id: job.build_id.clone(),
            status: job.status,
            title: NOTIFICATION_TITLE.to_string(),
            subtitle: format!("Job #{}", job.build_id),
            body: format!("Status: {}", job.status),
            spoken: format!("Job number {} done. Status: {}", job.build_id, job.status),
        }
    }
}
