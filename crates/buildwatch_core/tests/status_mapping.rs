use buildwatch_core::{map_outcome, JobStatus, PollFailure, PollOutcome};

fn response(status: u16, body: &str) -> PollOutcome {
    PollOutcome::Response {
        status,
        body: body.as_bytes().to_vec(),
    }
}

fn init_logging() {
    engine_logging::initialize_for_tests();
}

#[test]
fn building_without_result_is_running() {
    assert_eq!(
        map_outcome(&response(200, r#"{"result": null, "building": true}"#)),
        JobStatus::Running
    );
}

#[test]
fn queued_build_is_running() {
    assert_eq!(
        map_outcome(&response(200, r#"{"result": null, "building": false}"#)),
        JobStatus::Running
    );
    assert_eq!(map_outcome(&response(200, "{}")), JobStatus::Running);
}

#[test]
fn terminal_results_map_exactly() {
    assert_eq!(
        map_outcome(&response(200, r#"{"result": "SUCCESS", "building": false}"#)),
        JobStatus::Success
    );
    assert_eq!(
        map_outcome(&response(200, r#"{"result": "FAILURE"}"#)),
        JobStatus::Failure
    );
    assert_eq!(
        map_outcome(&response(200, r#"{"result": "ABORTED", "number": 12}"#)),
        JobStatus::Aborted
    );
}

#[test]
fn unrecognized_results_are_unknown() {
    assert_eq!(
        map_outcome(&response(200, r#"{"result": "WEIRD"}"#)),
        JobStatus::Unknown
    );
    assert_eq!(
        map_outcome(&response(200, r#"{"result": "success"}"#)),
        JobStatus::Unknown
    );
    assert_eq!(
        map_outcome(&response(200, r#"{"result": "UNSTABLE", "building": true}"#)),
        JobStatus::Unknown
    );
}

#[test]
fn auth_rejections_are_auth_errors() {
    assert_eq!(map_outcome(&response(401, "")), JobStatus::AuthError);
    assert_eq!(
        map_outcome(&response(403, r#"{"result": "SUCCESS"}"#)),
        JobStatus::AuthError
    );
}

#[test]
fn missing_build_is_unknown() {
    assert_eq!(map_outcome(&response(404, "Not Found")), JobStatus::Unknown);
}

#[test]
fn other_statuses_and_failures_are_network_errors() {
    assert_eq!(map_outcome(&response(500, "oops")), JobStatus::NetworkError);
    assert_eq!(
        map_outcome(&response(302, r#"{"result": "SUCCESS"}"#)),
        JobStatus::NetworkError
    );
    assert_eq!(
        map_outcome(&PollOutcome::Failed(PollFailure::Timeout)),
        JobStatus::NetworkError
    );
    assert_eq!(
        map_outcome(&PollOutcome::Failed(PollFailure::Network("refused".into()))),
        JobStatus::NetworkError
    );
}

#[test]
fn undecodable_body_is_network_error() {
    init_logging();
    assert_eq!(
        map_outcome(&response(200, "<html>login</html>")),
        JobStatus::NetworkError
    );
    assert_eq!(
        map_outcome(&response(200, r#"{"result": 5}"#)),
        JobStatus::NetworkError
    );
}

#[test]
fn terminal_statuses() {
    let terminal: Vec<_> = [
        JobStatus::Running,
        JobStatus::Success,
        JobStatus::Failure,
        JobStatus::Aborted,
        JobStatus::AuthError,
        JobStatus::NetworkError,
        JobStatus::Unknown,
    ]
    .into_iter()
    .filter(|status| status.is_terminal())
    .collect();
    assert_eq!(
        terminal,
        vec![JobStatus::Success, JobStatus::Failure, JobStatus::Aborted]
    );
}
