use std::sync::Mutex;

use pretty_assertions::assert_eq;
use serde_json::json;
use summarizer_core::JobFailureReason;
use summarizer_engine::{HttpBackendSettings, HttpSummarizer, ProgressSink, Summarizer};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingSink {
    seen: Mutex<Vec<u8>>,
}

impl ProgressSink for RecordingSink {
    fn emit(&self, progress: u8) {
        self.seen.lock().unwrap().push(progress);
    }
}

fn summarizer(server: &MockServer) -> HttpSummarizer {
    HttpSummarizer::new(HttpBackendSettings {
        base_url: format!("{}/", server.uri()),
        poll_interval_ms: 1,
        request_timeout_ms: 2_000,
    })
}

async fn mount_submit(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(body_json(json!({ "videoUrl": "https://youtu.be/x" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobId": "r-1" })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn polls_until_completed_and_reports_progress() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    Mock::given(method("GET"))
        .and(path("/jobs/r-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "progress": 0, "status": "queued" })),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/r-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "progress": 55, "status": "running" })),
        )
        .up_to_n_times(1)
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/r-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "progress": 100,
            "status": "completed",
            "resultUrl": "https://cdn.example/r-1.mp4"
        })))
        .with_priority(3)
        .mount(&server)
        .await;

    let sink = RecordingSink::default();
    let result = summarizer(&server)
        .summarize(1, "https://youtu.be/x", &sink)
        .await;

    assert_eq!(result, Ok("https://cdn.example/r-1.mp4".to_string()));
    assert_eq!(*sink.seen.lock().unwrap(), vec![0, 55]);
}

#[tokio::test]
async fn backend_failure_carries_its_reason() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    Mock::given(method("GET"))
        .and(path("/jobs/r-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "progress": 40,
            "status": "failed",
            "reason": "transcode failed"
        })))
        .mount(&server)
        .await;

    let result = summarizer(&server)
        .summarize(1, "https://youtu.be/x", &RecordingSink::default())
        .await;
    assert_eq!(
        result,
        Err(JobFailureReason::Backend("transcode failed".into()))
    );
}

#[tokio::test]
async fn rejected_submission_is_a_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = summarizer(&server)
        .summarize(1, "https://youtu.be/x", &RecordingSink::default())
        .await;
    assert_eq!(
        result,
        Err(JobFailureReason::Backend("http status 503".into()))
    );
}

#[tokio::test]
async fn completion_without_result_url_is_rejected() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    Mock::given(method("GET"))
        .and(path("/jobs/r-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "progress": 100, "status": "completed" })),
        )
        .mount(&server)
        .await;

    let result = summarizer(&server)
        .summarize(1, "https://youtu.be/x", &RecordingSink::default())
        .await;
    assert_eq!(
        result,
        Err(JobFailureReason::Backend("completed without resultUrl".into()))
    );
}

#[tokio::test]
async fn malformed_status_body_is_reported() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    Mock::given(method("GET"))
        .and(path("/jobs/r-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = summarizer(&server)
        .summarize(1, "https://youtu.be/x", &RecordingSink::default())
        .await;
    match result {
        Err(JobFailureReason::Backend(detail)) => {
            assert!(detail.starts_with("invalid response"), "{detail}")
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn finished_job_is_seen_on_the_first_poll() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    Mock::given(method("GET"))
        .and(path("/jobs/r-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "progress": 100,
            "status": "completed",
            "resultUrl": "https://cdn.example/r-1.mp4"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // A poll interval far longer than the test timeout.
    let summarizer = HttpSummarizer::new(HttpBackendSettings {
        base_url: server.uri(),
        poll_interval_ms: 60_000,
        request_timeout_ms: 2_000,
    });
    let result = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        summarizer.summarize(1, "https://youtu.be/x", &RecordingSink::default()),
    )
    .await
    .expect("no wait before the first poll");
    assert_eq!(result, Ok("https://cdn.example/r-1.mp4".to_string()));
}
