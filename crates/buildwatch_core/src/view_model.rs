use chrono::{DateTime, Utc};

use crate::{JobId, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackerView {
    pub configured: bool,
    pub server: String,
    pub jobs: Vec<JobRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub name: String,
    pub path: String,
    pub build_id: String,
    pub status: JobStatus,
    pub last_checked: DateTime<Utc>,
    /// A status query for this job is outstanding.
    pub polling: bool,
}
