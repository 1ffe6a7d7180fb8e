//! Buildwatch engine: status queries, the poll schedule, and the watch service
//! that executes tracker effects.
mod engine;
mod fetch;
mod notify;
mod persist;
mod schedule;
mod secret;
mod service;
mod types;

pub use engine::{poll_with_timeout, ChannelEventSink, EngineHandle, EventSink};
pub use fetch::{ClientSettings, ReqwestStatusClient, StatusClient};
pub use notify::{CommandSpeaker, DesktopNotifier, LogNotifier, Notifier, SilentSpeaker, Speaker};
pub use persist::{ensure_data_dir, AtomicFileWriter, FileStore, STATE_FILENAME};
pub use secret::KeyringSecretStore;
pub use service::{Collaborators, ServiceError, WatchHandle};
pub use types::{EngineEvent, ServiceConfig};
