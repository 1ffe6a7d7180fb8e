use std::sync::mpsc;

use crate::{Job, JobStatus};

/// Published state changes, as seen by display-layer observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    JobAdded(Job),
    JobUpdated { job: Job, previous: JobStatus },
    JobRemoved(Job),
    SettingsChanged { configured: bool },
}

/// Fan-out of [`WatchEvent`]s to any number of subscribers.
///
/// Subscribers whose receiver has been dropped are pruned on the next publish.
#[derive(Debug, Default)]
pub struct Observers {
    senders: Vec<mpsc::Sender<WatchEvent>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<WatchEvent> {
        let (tx, rx) = mpsc::channel();
        self.register(tx);
        rx
    }

    pub fn register(&mut self, tx: mpsc::Sender<WatchEvent>) {
        self.senders.push(tx);
    }

    pub fn publish(&mut self, event: &WatchEvent) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
