use std::sync::Arc;
use std::time::Duration;

use engine_logging::engine_debug;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::engine::EventSink;
use crate::EngineEvent;

const MIN_PERIOD: Duration = Duration::from_millis(10);

/// Emit [`EngineEvent::Tick`] every `period` until cancelled. The first tick fires at once.
pub(crate) async fn run_schedule(
    period: Duration,
    sink: Arc<dyn EventSink>,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period.max(MIN_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => sink.emit(EngineEvent::Tick),
        }
    }
    engine_debug!("Poll schedule stopped");
}
