use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::JobStatus;

pub type JobId = Uuid;

/// One tracked remote build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    /// Canonical path, e.g. `job/dev/job/app/123`.
    pub path: String,
    /// Decimal build number; always the last segment of `path`.
    pub build_id: String,
    pub status: JobStatus,
    pub last_checked: DateTime<Utc>,
}

impl Job {
    pub(crate) fn new(path: String, build_id: String, created: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
            build_id,
            status: JobStatus::Unknown,
            last_checked: created,
        }
    }

    /// Human-readable name: path segments minus the `job` markers and build numbers.
    pub fn display_name(&self) -> String {
        self.path
            .split('/')
            .filter(|segment| *segment != "job" && !is_build_number(segment))
            .collect::<Vec<_>>()
            .join(" / ")
    }

    /// Checks the path/build-id invariant; used when restoring persisted jobs.
    pub(crate) fn is_well_formed(&self) -> bool {
        is_build_number(&self.build_id)
            && self.path.rsplit('/').next() == Some(self.build_id.as_str())
            && !self.path.starts_with('/')
            && !self.path.contains("//")
    }
}

pub(crate) fn is_build_number(segment: &str) -> bool {
    !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && segment.parse::<u64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_skips_job_markers_and_numbers() {
        let job = Job::new(
            "job/development/job/my-job-name/9694".to_string(),
            "9694".to_string(),
            Utc::now(),
        );
        assert_eq!(job.display_name(), "development / my-job-name");
        assert!(job.is_well_formed());
    }

    #[test]
    fn build_numbers_are_plain_digits() {
        assert!(is_build_number("0"));
        assert!(is_build_number("007"));
        assert!(!is_build_number("+5"));
        assert!(!is_build_number("-1"));
        assert!(!is_build_number(""));
        assert!(!is_build_number("12a"));
    }
}
