use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use buildwatch_core::{PollFailure, PollOutcome, PollRequest};
use chrono::Utc;
use engine_logging::{engine_debug, engine_trace};
use tokio_util::sync::CancellationToken;

use crate::fetch::StatusClient;
use crate::schedule::run_schedule;
use crate::{EngineEvent, ServiceConfig};

/// Receives engine events; called from runtime worker threads.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Forwards events into a channel, converting them to the receiver's message type.
pub struct ChannelEventSink<T> {
    tx: mpsc::Sender<T>,
}

impl<T> ChannelEventSink<T> {
    pub fn new(tx: mpsc::Sender<T>) -> Self {
        Self { tx }
    }
}

impl<T: From<EngineEvent> + Send> EventSink for ChannelEventSink<T> {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event.into());
    }
}

enum EngineCommand {
    Poll(PollRequest),
}

/// Owns the tokio runtime that runs the poll schedule and status queries.
///
/// Each poll is its own task, bounded by the configured request timeout, so a
/// hung server never delays the schedule or sibling polls. Dropping the handle
/// stops the schedule; outstanding polls are abandoned with the runtime.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    shutdown: CancellationToken,
}

impl EngineHandle {
    pub fn new(
        client: Arc<dyn StatusClient>,
        sink: Arc<dyn EventSink>,
        config: &ServiceConfig,
    ) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("buildwatch-engine")
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let shutdown = CancellationToken::new();
        let request_timeout = config.request_timeout;

        runtime.spawn(run_schedule(
            config.poll_interval,
            Arc::clone(&sink),
            shutdown.clone(),
        ));

        thread::Builder::new()
            .name("buildwatch-dispatch".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    let client = Arc::clone(&client);
                    let sink = Arc::clone(&sink);
                    runtime.spawn(async move {
                        handle_command(client.as_ref(), command, request_timeout, sink.as_ref())
                            .await;
                    });
                }
                engine_debug!("Engine command channel closed; stopping runtime");
                runtime.shutdown_background();
            })?;

        Ok(Self { cmd_tx, shutdown })
    }

    pub fn poll(&self, request: PollRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Poll(request));
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_command(
    client: &dyn StatusClient,
    command: EngineCommand,
    request_timeout: Duration,
    sink: &dyn EventSink,
) {
    match command {
        EngineCommand::Poll(request) => {
            let outcome = poll_with_timeout(client, &request, request_timeout).await;
            sink.emit(EngineEvent::PollCompleted {
                job_id: request.job_id,
                outcome,
                checked_at: Utc::now(),
            });
        }
    }
}

/// Run one query, turning an overrun into [`PollFailure::Timeout`].
pub async fn poll_with_timeout(
    client: &dyn StatusClient,
    request: &PollRequest,
    limit: Duration,
) -> PollOutcome {
    engine_trace!("Polling {}", request.url);
    match tokio::time::timeout(limit, client.fetch(request)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            engine_debug!("Poll for {} timed out after {:?}", request.url, limit);
            PollOutcome::Failed(PollFailure::Timeout)
        }
    }
}
