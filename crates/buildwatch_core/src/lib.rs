//! Buildwatch core: locator parsing, status mapping, the job store and the
//! tracker state machine. No network IO happens here.
mod effect;
mod event;
mod job;
mod locator;
mod msg;
pub mod persist;
mod settings;
mod state;
mod status;
mod store;
mod update;
mod view_model;

pub use effect::{Effect, Notification, PollRequest, NOTIFICATION_TITLE};
pub use event::{Observers, WatchEvent};
pub use job::{Job, JobId};
pub use locator::{collapse_slashes, parse, parse_locator, Locator, ParseError};
pub use msg::Msg;
pub use persist::{KeyValueStore, MemoryStore, PersistError, SecretStore};
pub use settings::Settings;
pub use state::TrackerState;
pub use status::{map_outcome, JobStatus, PollFailure, PollOutcome};
pub use store::{JobStore, StoreError};
pub use update::update;
pub use view_model::{JobRowView, TrackerView};
