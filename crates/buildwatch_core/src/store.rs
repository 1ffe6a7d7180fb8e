use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use thiserror::Error;

use crate::persist::{KeyValueStore, JOBS_KEY};
use crate::{Job, JobId, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(JobId),
}

/// Ordered collection of tracked jobs, written through to a key/value store.
///
/// Every mutation saves the whole collection before returning. A failed save is
/// logged and the in-memory change stands; the next successful save catches up.
pub struct JobStore {
    jobs: Vec<Job>,
    persistence: Box<dyn KeyValueStore>,
}

impl fmt::Debug for JobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobStore").field("jobs", &self.jobs).finish()
    }
}

impl JobStore {
    /// Restore the persisted collection. Unreadable or corrupt state loads as empty.
    pub fn load(persistence: Box<dyn KeyValueStore>) -> Self {
        let jobs = match persistence.get(JOBS_KEY) {
            Ok(Some(text)) => match serde_json::from_str::<Vec<Job>>(&text) {
                Ok(jobs) => sanitize(jobs),
                Err(err) => {
                    engine_warn!("Failed to parse persisted jobs, starting empty: {}", err);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                engine_warn!("Failed to read persisted jobs, starting empty: {}", err);
                Vec::new()
            }
        };
        engine_info!("Loaded {} persisted jobs", jobs.len());
        Self { jobs, persistence }
    }

    /// Insert a job. Returns `false` without touching anything if its path is already tracked.
    pub fn add(&mut self, job: Job) -> bool {
        if self.contains_path(&job.path) {
            engine_debug!("Ignoring duplicate job path {}", job.path);
            return false;
        }
        self.jobs.push(job);
        self.persist();
        true
    }

    pub fn remove(&mut self, id: JobId) -> Result<Job, StoreError> {
        let index = self.index_of(id)?;
        let removed = self.jobs.remove(index);
        self.persist();
        Ok(removed)
    }

    /// Record a poll result and return the status it replaced.
    pub fn update(
        &mut self,
        id: JobId,
        status: JobStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<JobStatus, StoreError> {
        let index = self.index_of(id)?;
        let job = &mut self.jobs[index];
        let previous = job.status;
        job.status = status;
        job.last_checked = checked_at;
        self.persist();
        Ok(previous)
    }

    pub fn get(&self, id: JobId) -> Result<&Job, StoreError> {
        self.jobs
            .iter()
            .find(|job| job.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Jobs in insertion order.
    pub fn all(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.jobs.iter().any(|job| job.path == path)
    }

    fn index_of(&self, id: JobId) -> Result<usize, StoreError> {
        self.jobs
            .iter()
            .position(|job| job.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn persist(&self) {
        let content = match serde_json::to_string(&self.jobs) {
            Ok(text) => text,
            Err(err) => {
                engine_error!("Failed to serialize jobs: {}", err);
                return;
            }
        };
        if let Err(err) = self.persistence.set(JOBS_KEY, &content) {
            engine_error!("Failed to persist {} jobs: {}", self.jobs.len(), err);
        }
    }
}

fn sanitize(jobs: Vec<Job>) -> Vec<Job> {
    let mut seen_paths = HashSet::new();
    let mut seen_ids = HashSet::new();
    jobs.into_iter()
        .filter(|job| {
            if !job.is_well_formed() {
                engine_warn!("Dropping malformed persisted job {}", job.path);
                return false;
            }
            if !seen_paths.insert(job.path.clone()) || !seen_ids.insert(job.id) {
                engine_warn!("Dropping duplicate persisted job {}", job.path);
                return false;
            }
            true
        })
        .collect()
}
