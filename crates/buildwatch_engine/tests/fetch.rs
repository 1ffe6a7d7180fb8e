use std::time::Duration;

use buildwatch_core::{map_outcome, JobStatus, PollFailure, PollOutcome, PollRequest, Settings};
use buildwatch_engine::{poll_with_timeout, ClientSettings, ReqwestStatusClient, StatusClient};
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request_for(settings: &Settings, job_path: &str) -> PollRequest {
    PollRequest {
        job_id: Uuid::new_v4(),
        url: settings.status_url(job_path).expect("configured"),
        authorization: settings.authorization(),
    }
}

fn client() -> ReqwestStatusClient {
    ReqwestStatusClient::new(&ClientSettings::default()).expect("client")
}

#[tokio::test]
async fn fetches_build_json_with_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/dev/job/app/123/api/json"))
        .and(header("Authorization", "Basic YWxpY2U6czNjcmV0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"result":"SUCCESS","building":false}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let settings = Settings::new(format!("{}/", server.uri()), "alice", "s3cret");
    let request = request_for(&settings, "job/dev/job/app/123");

    let outcome = client().fetch(&request).await;
    assert_eq!(map_outcome(&outcome), JobStatus::Success);
}

#[tokio::test]
async fn sends_no_credentials_without_secret() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/app/7/api/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"building":true}"#))
        .mount(&server)
        .await;

    let settings = Settings::new(server.uri(), "alice", "");
    let request = request_for(&settings, "job/app/7");
    let outcome = client().fetch(&request).await;
    assert_eq!(map_outcome(&outcome), JobStatus::Running);

    let received = server.received_requests().await.expect("recording enabled");
    assert_eq!(received.len(), 1);
    assert!(!received[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn reports_status_codes_as_responses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/app/8/api/json"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let settings = Settings::new(server.uri(), "", "");
    let outcome = client().fetch(&request_for(&settings, "job/app/8")).await;
    assert_eq!(
        outcome,
        PollOutcome::Response {
            status: 403,
            body: b"forbidden".to_vec(),
        }
    );
    assert_eq!(map_outcome(&outcome), JobStatus::AuthError);
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/app/9/api/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_string(r#"{"result":"SUCCESS"}"#),
        )
        .mount(&server)
        .await;

    let settings = Settings::new(server.uri(), "", "");
    let request = request_for(&settings, "job/app/9");

    // Bounded by the engine's timeout even when the client would wait longer.
    let outcome = poll_with_timeout(&client(), &request, Duration::from_millis(50)).await;
    assert_eq!(outcome, PollOutcome::Failed(PollFailure::Timeout));
    assert_eq!(map_outcome(&outcome), JobStatus::NetworkError);

    // And by the client's own request timeout.
    let quick = ReqwestStatusClient::new(&ClientSettings {
        request_timeout: Duration::from_millis(50),
        ..ClientSettings::default()
    })
    .expect("client");
    let outcome = quick.fetch(&request).await;
    assert_eq!(outcome, PollOutcome::Failed(PollFailure::Timeout));
}

#[tokio::test]
async fn oversized_body_fails_without_buffering() {
    let server = MockServer::start().await;
    let login_page = format!("<html>{}</html>", "x".repeat(4096));
    Mock::given(method("GET"))
        .and(path("/job/app/10/api/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_page))
        .mount(&server)
        .await;

    let settings = Settings::new(server.uri(), "", "");
    let small = ReqwestStatusClient::new(&ClientSettings {
        max_bytes: 1024,
        ..ClientSettings::default()
    })
    .expect("client");
    let outcome = small.fetch(&request_for(&settings, "job/app/10")).await;
    assert_eq!(
        outcome,
        PollOutcome::Failed(PollFailure::TooLarge { max_bytes: 1024 })
    );
    assert_eq!(map_outcome(&outcome), JobStatus::NetworkError);

    // The default limit leaves room for ordinary build JSON and small pages.
    let outcome = client().fetch(&request_for(&settings, "job/app/10")).await;
    assert!(matches!(outcome, PollOutcome::Response { status: 200, .. }));
}

#[tokio::test]
async fn unreachable_server_is_a_network_failure() {
    // Nothing listens on port 9 of localhost in the test environment.
    let settings = Settings::new("http://127.0.0.1:9", "", "");
    let outcome = client().fetch(&request_for(&settings, "job/app/1")).await;
    assert!(matches!(outcome, PollOutcome::Failed(_)));
    assert_eq!(map_outcome(&outcome), JobStatus::NetworkError);
}
