use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use engine_logging::{engine_debug, engine_error, engine_info};

use crate::persist::{KeyValueStore, MemoryStore, SecretStore};
use crate::view_model::{JobRowView, TrackerView};
use crate::{
    map_outcome, Effect, Job, JobId, JobStatus, JobStore, Notification, PollOutcome, PollRequest,
    Settings, WatchEvent,
};

/// Everything the tracker owns: jobs, settings and the set of outstanding polls.
pub struct TrackerState {
    store: JobStore,
    settings: Settings,
    values: Arc<dyn KeyValueStore>,
    secrets: Arc<dyn SecretStore>,
    in_flight: HashSet<JobId>,
}

impl fmt::Debug for TrackerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerState")
            .field("store", &self.store)
            .field("settings", &self.settings)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

impl TrackerState {
    /// Restore jobs and settings from the given stores.
    pub fn load(values: Arc<dyn KeyValueStore>, secrets: Arc<dyn SecretStore>) -> Self {
        let store = JobStore::load(Box::new(Arc::clone(&values)));
        let settings = Settings::load(values.as_ref(), secrets.as_ref());
        engine_info!(
            "Tracker loaded: {} jobs, configured={}",
            store.len(),
            settings.is_configured()
        );
        Self {
            store,
            settings,
            values,
            secrets,
            in_flight: HashSet::new(),
        }
    }

    /// Fresh state backed by a throwaway in-memory store.
    pub fn in_memory() -> Self {
        let store = MemoryStore::new();
        Self::load(Arc::new(store.clone()), Arc::new(store))
    }

    pub fn jobs(&self) -> &[Job] {
        self.store.all()
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.store.get(id).ok()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_polling(&self, id: JobId) -> bool {
        self.in_flight.contains(&id)
    }

    pub fn view(&self) -> TrackerView {
        TrackerView {
            configured: self.settings.is_configured(),
            server: self.settings.base_url.clone(),
            jobs: self
                .store
                .all()
                .iter()
                .map(|job| JobRowView {
                    job_id: job.id,
                    name: job.display_name(),
                    path: job.path.clone(),
                    build_id: job.build_id.clone(),
                    status: job.status,
                    last_checked: job.last_checked,
                    polling: self.in_flight.contains(&job.id),
                })
                .collect(),
        }
    }

    pub(crate) fn add_job(&mut self, job: Job) -> Vec<Effect> {
        if !self.store.add(job.clone()) {
            return Vec::new();
        }
        engine_info!("Tracking {} (build {})", job.path, job.build_id);
        let job_id = job.id;
        let mut effects = vec![Effect::Publish(WatchEvent::JobAdded(job))];
        effects.extend(self.schedule_poll(job_id));
        effects
    }

    pub(crate) fn remove_job(&mut self, job_id: JobId) -> Vec<Effect> {
        match self.store.remove(job_id) {
            Ok(job) => {
                self.in_flight.remove(&job_id);
                engine_info!("Stopped tracking {}", job.path);
                vec![Effect::Publish(WatchEvent::JobRemoved(job))]
            }
            Err(err) => {
                engine_debug!("Remove ignored: {}", err);
                Vec::new()
            }
        }
    }

    pub(crate) fn apply_settings(&mut self, settings: Settings) -> Vec<Effect> {
        if let Err(err) = settings.save(self.values.as_ref(), self.secrets.as_ref()) {
            engine_error!("Failed to persist settings: {}", err);
        }
        engine_info!("Settings saved: {:?}", settings);
        self.settings = settings;
        let mut effects = vec![Effect::Publish(WatchEvent::SettingsChanged {
            configured: self.settings.is_configured(),
        })];
        effects.extend(self.schedule_all());
        effects
    }

    /// One poll per eligible job that has no poll outstanding.
    pub(crate) fn schedule_all(&mut self) -> Vec<Effect> {
        if !self.settings.is_configured() {
            return Vec::new();
        }
        let ids: Vec<JobId> = self
            .store
            .all()
            .iter()
            .filter(|job| !job.status.is_terminal())
            .map(|job| job.id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.schedule_poll(id))
            .collect()
    }

    fn schedule_poll(&mut self, job_id: JobId) -> Option<Effect> {
        let job = self.store.get(job_id).ok()?;
        if job.status.is_terminal() {
            return None;
        }
        if self.in_flight.contains(&job_id) {
            engine_debug!("Poll for {} still outstanding; skipping", job.path);
            return None;
        }
        let url = self.settings.status_url(&job.path)?;
        let request = PollRequest {
            job_id,
            url,
            authorization: self.settings.authorization(),
        };
        self.in_flight.insert(job_id);
        Some(Effect::Poll(request))
    }

    pub(crate) fn apply_poll(
        &mut self,
        job_id: JobId,
        outcome: &PollOutcome,
        checked_at: DateTime<Utc>,
    ) -> Vec<Effect> {
        self.in_flight.remove(&job_id);

        let current = match self.store.get(job_id) {
            Ok(job) => job.status,
            Err(_) => {
                engine_debug!("Discarding poll result for removed job {}", job_id);
                return Vec::new();
            }
        };
        if current.is_terminal() {
            engine_debug!("Discarding poll result for finished job {}", job_id);
            return Vec::new();
        }

        if let PollOutcome::Failed(failure) = outcome {
            engine_debug!("Poll for job {} failed: {}", job_id, failure);
        }
        let status = map_outcome(outcome);
        let previous = match self.store.update(job_id, status, checked_at) {
            Ok(previous) => previous,
            Err(err) => {
                engine_error!("Failed to record poll result: {}", err);
                return Vec::new();
            }
        };
        let Ok(job) = self.store.get(job_id).cloned() else {
            return Vec::new();
        };

        let mut effects = Vec::with_capacity(2);
        if previous != status && is_notifiable(status) {
            engine_info!("Build {} finished: {}", job.build_id, status);
            effects.push(Effect::Notify(Notification::for_job(&job)));
        } else if previous != status {
            engine_info!("Build {} is now {}", job.build_id, status);
        }
        effects.push(Effect::Publish(WatchEvent::JobUpdated { job, previous }));
        effects
    }
}

fn is_notifiable(status: JobStatus) -> bool {
    status.is_terminal()
}
