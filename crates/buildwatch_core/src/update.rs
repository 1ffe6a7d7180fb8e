use crate::{Effect, Msg, TrackerState};

/// Applies a message to the tracker and returns the effects to run.
///
/// Store writes happen here, synchronously; everything else (network, alerts,
/// observer fan-out) is returned as an [`Effect`] for the caller to execute.
pub fn update(mut state: TrackerState, msg: Msg) -> (TrackerState, Vec<Effect>) {
    let effects = match msg {
        Msg::JobSubmitted(job) => state.add_job(job),
        Msg::RemoveRequested { job_id } => state.remove_job(job_id),
        Msg::SettingsSaved(settings) => state.apply_settings(settings),
        Msg::Tick => state.schedule_all(),
        Msg::PollCompleted {
            job_id,
            outcome,
            checked_at,
        } => state.apply_poll(job_id, &outcome, checked_at),
    };

    (state, effects)
}
