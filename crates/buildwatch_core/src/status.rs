use std::fmt;

use engine_logging::engine_warn;
use serde::{Deserialize, Serialize};

/// Normalized build status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    Running,
    Success,
    Failure,
    Aborted,
    AuthError,
    NetworkError,
    Unknown,
}

impl JobStatus {
    /// Terminal statuses are sinks: once reached, the job is never polled again.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure | JobStatus::Aborted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failure => "failure",
            JobStatus::Aborted => "aborted",
            JobStatus::AuthError => "authError",
            JobStatus::NetworkError => "networkError",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// What came back from one status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Response { status: u16, body: Vec<u8> },
    Failed(PollFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollFailure {
    Timeout,
    InvalidUrl(String),
    Network(String),
    /// The body exceeded the client's size limit.
    TooLarge { max_bytes: u64 },
}

impl fmt::Display for PollFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollFailure::Timeout => write!(f, "timeout"),
            PollFailure::InvalidUrl(message) => write!(f, "invalid url: {message}"),
            PollFailure::Network(message) => write!(f, "network error: {message}"),
            PollFailure::TooLarge { max_bytes } => {
                write!(f, "response larger than {max_bytes} bytes")
            }
        }
    }
}

const LOGGED_BODY_BYTES: usize = 200;

/// The subset of the server's build JSON we read.
#[derive(Debug, Deserialize)]
struct BuildResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    building: Option<bool>,
}

pub fn map_outcome(outcome: &PollOutcome) -> JobStatus {
    match outcome {
        PollOutcome::Failed(_) => JobStatus::NetworkError,
        PollOutcome::Response { status: 401 | 403, .. } => JobStatus::AuthError,
        PollOutcome::Response { status: 404, .. } => JobStatus::Unknown,
        PollOutcome::Response { status: 200, body } => map_body(body),
        PollOutcome::Response { .. } => JobStatus::NetworkError,
    }
}

fn map_body(body: &[u8]) -> JobStatus {
    let response: BuildResponse = match serde_json::from_slice(body) {
        Ok(response) => response,
        Err(err) => {
            engine_warn!(
                "Failed to decode build response: {} body={}",
                err,
                body_excerpt(body)
            );
            return JobStatus::NetworkError;
        }
    };

    match (response.result.as_deref(), response.building) {
        (Some("SUCCESS"), _) => JobStatus::Success,
        (Some("FAILURE"), _) => JobStatus::Failure,
        (Some("ABORTED"), _) => JobStatus::Aborted,
        (Some(_), _) => JobStatus::Unknown,
        (None, Some(true)) => JobStatus::Running,
        // Queued or just started.
        (None, _) => JobStatus::Running,
    }
}

/// First [`LOGGED_BODY_BYTES`] of a body, lossily decoded, for log lines.
fn body_excerpt(body: &[u8]) -> String {
    if body.len() <= LOGGED_BODY_BYTES {
        return String::from_utf8_lossy(body).into_owned();
    }
    format!(
        "{}... ({} bytes)",
        String::from_utf8_lossy(&body[..LOGGED_BODY_BYTES]),
        body.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bodies_are_cut_for_logging() {
        assert_eq!(body_excerpt(b"<html>"), "<html>");
        let page = vec![b'x'; 5000];
        let excerpt = body_excerpt(&page);
        assert!(excerpt.starts_with(&"x".repeat(LOGGED_BODY_BYTES)));
        assert!(excerpt.ends_with("... (5000 bytes)"));
        assert!(excerpt.len() < 300);
    }
}
