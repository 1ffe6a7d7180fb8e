use std::io;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use buildwatch_core::{
    parse, update, Effect, JobId, KeyValueStore, Msg, Observers, ParseError, SecretStore,
    Settings, TrackerState, TrackerView, WatchEvent,
};
use engine_logging::{engine_debug, engine_info};
use thiserror::Error;

use crate::engine::{ChannelEventSink, EngineHandle};
use crate::fetch::StatusClient;
use crate::notify::{Notifier, Speaker};
use crate::{EngineEvent, ServiceConfig};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("failed to start watch service: {0}")]
    Start(#[from] io::Error),
    #[error("watch service has stopped")]
    Stopped,
}

/// External collaborators the service drives.
pub struct Collaborators {
    pub values: Arc<dyn KeyValueStore>,
    pub secrets: Arc<dyn SecretStore>,
    pub client: Arc<dyn StatusClient>,
    pub notifier: Arc<dyn Notifier>,
    pub speaker: Arc<dyn Speaker>,
}

enum ServiceCommand {
    Msg(Msg),
    Subscribe(mpsc::Sender<WatchEvent>),
    View(mpsc::Sender<TrackerView>),
    Shutdown,
}

impl From<EngineEvent> for ServiceCommand {
    fn from(event: EngineEvent) -> Self {
        ServiceCommand::Msg(event.into())
    }
}

/// Handle to a running watch service.
///
/// All tracker state lives on one service thread. User commands, schedule ticks
/// and poll completions arrive on a single channel and are applied in order,
/// so no two writes to a job ever interleave.
pub struct WatchHandle {
    tx: mpsc::Sender<ServiceCommand>,
    thread: Option<JoinHandle<TrackerState>>,
}

impl WatchHandle {
    pub fn spawn(config: ServiceConfig, collaborators: Collaborators) -> Result<Self, ServiceError> {
        let Collaborators {
            values,
            secrets,
            client,
            notifier,
            speaker,
        } = collaborators;

        let state = TrackerState::load(values, secrets);
        let (tx, rx) = mpsc::channel();
        let sink = Arc::new(ChannelEventSink::new(tx.clone()));
        let engine = EngineHandle::new(client, sink, &config)?;

        let service = ServiceLoop {
            observers: Observers::new(),
            engine,
            notifier,
            speaker,
            speak: config.speak,
        };
        let thread = thread::Builder::new()
            .name("buildwatch-service".to_string())
            .spawn(move || service.run(state, rx))?;

        engine_info!(
            "Watch service started (interval {:?}, timeout {:?})",
            config.poll_interval,
            config.request_timeout
        );
        Ok(Self {
            tx,
            thread: Some(thread),
        })
    }

    /// Parse and start tracking a locator. Re-adding a tracked path is silently ignored.
    pub fn add_locator(&self, raw: &str) -> Result<JobId, ServiceError> {
        let job = parse(raw)?;
        let job_id = job.id;
        self.send(Msg::JobSubmitted(job))?;
        Ok(job_id)
    }

    pub fn remove_job(&self, job_id: JobId) -> Result<(), ServiceError> {
        self.send(Msg::RemoveRequested { job_id })
    }

    /// Persist new settings and re-poll every eligible job straight away.
    pub fn save_settings(&self, settings: Settings) -> Result<(), ServiceError> {
        self.send(Msg::SettingsSaved(settings))
    }

    pub fn subscribe(&self) -> Result<mpsc::Receiver<WatchEvent>, ServiceError> {
        let (tx, rx) = mpsc::channel();
        self.command(ServiceCommand::Subscribe(tx))?;
        Ok(rx)
    }

    /// Snapshot of the current state, taken on the service thread.
    pub fn view(&self) -> Result<TrackerView, ServiceError> {
        let (tx, rx) = mpsc::channel();
        self.command(ServiceCommand::View(tx))?;
        rx.recv().map_err(|_| ServiceError::Stopped)
    }

    /// Stop the service and return its final state.
    pub fn shutdown(mut self) -> Option<TrackerState> {
        let _ = self.tx.send(ServiceCommand::Shutdown);
        self.thread.take().and_then(|thread| thread.join().ok())
    }

    fn send(&self, msg: Msg) -> Result<(), ServiceError> {
        self.command(ServiceCommand::Msg(msg))
    }

    fn command(&self, command: ServiceCommand) -> Result<(), ServiceError> {
        self.tx.send(command).map_err(|_| ServiceError::Stopped)
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            let _ = self.tx.send(ServiceCommand::Shutdown);
        }
    }
}

struct ServiceLoop {
    observers: Observers,
    engine: EngineHandle,
    notifier: Arc<dyn Notifier>,
    speaker: Arc<dyn Speaker>,
    speak: bool,
}

impl ServiceLoop {
    fn run(mut self, mut state: TrackerState, rx: mpsc::Receiver<ServiceCommand>) -> TrackerState {
        while let Ok(command) = rx.recv() {
            match command {
                ServiceCommand::Msg(msg) => {
                    let (next, effects) = update(state, msg);
                    state = next;
                    for effect in effects {
                        self.execute(effect);
                    }
                }
                ServiceCommand::Subscribe(tx) => self.observers.register(tx),
                ServiceCommand::View(reply) => {
                    let _ = reply.send(state.view());
                }
                ServiceCommand::Shutdown => break,
            }
        }
        engine_info!("Watch service stopped");
        state
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Poll(request) => {
                engine_debug!("Dispatching poll for {}", request.url);
                self.engine.poll(request);
            }
            Effect::Notify(notification) => {
                self.notifier.notify(
                    &notification.title,
                    &notification.subtitle,
                    &notification.body,
                );
                if self.speak {
                    self.speaker.speak(&notification.spoken);
                }
            }
            Effect::Publish(event) => self.observers.publish(&event),
        }
    }
}
