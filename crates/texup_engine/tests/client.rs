use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use texup_engine::{
    ClientSettings, ConversionApi, FailureKind, ReqwestClient, ServerEvent, StreamSink, TextMode,
    UploadFile,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<ServerEvent>>>,
}

impl TestSink {
    fn take(&self) -> Vec<ServerEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl StreamSink for TestSink {
    fn on_event(&self, event: ServerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn settings(server: &MockServer) -> ClientSettings {
    ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    }
}

fn scan_pdf() -> UploadFile {
    UploadFile {
        name: "scan.pdf".to_string(),
        media_type: "application/pdf".to_string(),
        bytes: Arc::from(&b"%PDF-1.7 body"[..]),
    }
}

#[tokio::test]
async fn upload_posts_multipart_and_returns_task_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verbatim"))
        .and(header_exists("content-type"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"scan.pdf\""))
        .and(body_string_contains("%PDF-1.7 body"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "tid": "abc" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ReqwestClient::new(settings(&server)).unwrap();
    let tid = client.upload(&scan_pdf()).await.expect("upload ok");
    assert_eq!(tid, "abc");
}

#[tokio::test]
async fn upload_uses_text_mode_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summarizing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "tid": 5 })))
        .mount(&server)
        .await;

    let client = ReqwestClient::new(ClientSettings {
        text_mode: TextMode::Summarizing,
        ..settings(&server)
    })
    .unwrap();
    assert_eq!(client.upload(&scan_pdf()).await.unwrap(), "5");
}

#[tokio::test]
async fn upload_reports_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verbatim"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = ReqwestClient::new(settings(&server)).unwrap();
    let err = client.upload(&scan_pdf()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
}

#[tokio::test]
async fn upload_rejects_body_without_task_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verbatim"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = ReqwestClient::new(settings(&server)).unwrap();
    let err = client.upload(&scan_pdf()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidResponse);
}

#[tokio::test]
async fn submit_ignores_response_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/verbatim"))
        .respond_with(ResponseTemplate::new(202).set_body_string("accepted"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ReqwestClient::new(settings(&server)).unwrap();
    client.submit(&scan_pdf()).await.expect("submit ok");
}

#[tokio::test]
async fn status_reads_status_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/abc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "pending" })),
        )
        .mount(&server)
        .await;

    let client = ReqwestClient::new(settings(&server)).unwrap();
    assert_eq!(client.status("abc").await.unwrap(), "pending");
}

#[tokio::test]
async fn status_with_wrong_shape_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "state": 1 })))
        .mount(&server)
        .await;

    let client = ReqwestClient::new(settings(&server)).unwrap();
    let err = client.status("abc").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidResponse);
}

#[tokio::test]
async fn status_times_out_on_slow_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(serde_json::json!({ "status": "done" })),
        )
        .mount(&server)
        .await;

    let client = ReqwestClient::new(ClientSettings {
        request_timeout: Duration::from_millis(50),
        ..settings(&server)
    })
    .unwrap();
    let err = client.status("slow").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn download_returns_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dl/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\\documentclass{article}".to_vec()))
        .mount(&server)
        .await;

    let client = ReqwestClient::new(settings(&server)).unwrap();
    let bytes = client.download("abc").await.unwrap();
    assert_eq!(bytes, b"\\documentclass{article}".to_vec());
}

#[tokio::test]
async fn download_fails_on_missing_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dl/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = ReqwestClient::new(settings(&server)).unwrap();
    let err = client.download("missing").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn download_rejects_oversized_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dl/big"))
        .respond_with(ResponseTemplate::new(200).set_body_string("01234567890"))
        .mount(&server)
        .await;

    let client = ReqwestClient::new(ClientSettings {
        max_download_bytes: 10,
        ..settings(&server)
    })
    .unwrap();
    let err = client.download("big").await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn stream_forwards_messages_and_returns_end() {
    let server = MockServer::start().await;
    let body = "event: message\r\ndata: what\r\nretry: 15000\r\n\r\n\
                event: message\r\ndata: bro\r\nretry: 15000\r\n\r\n\
                event: end\r\ndata: ok done\r\nretry: 15000\r\n\r\n";
    Mock::given(method("POST"))
        .and(path("/api/process"))
        .and(body_string_contains("filename=\"scan.pdf\""))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = ReqwestClient::new(settings(&server)).unwrap();
    let sink = TestSink::default();
    let end = client
        .stream(&scan_pdf(), &sink, &CancellationToken::new())
        .await
        .unwrap()
        .expect("end event");

    assert_eq!(end.data, "ok done");
    let data: Vec<String> = sink.take().into_iter().map(|e| e.data).collect();
    assert_eq!(data, vec!["what".to_string(), "bro".to_string()]);
}

#[tokio::test]
async fn stream_without_end_event_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("data: only\n\n", "text/event-stream"))
        .mount(&server)
        .await;

    let client = ReqwestClient::new(settings(&server)).unwrap();
    let sink = TestSink::default();
    let err = client
        .stream(&scan_pdf(), &sink, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidResponse);
    assert_eq!(sink.take().len(), 1);
}

#[tokio::test]
async fn cancelled_stream_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_raw("event: end\ndata: late\n\n", "text/event-stream"),
        )
        .mount(&server)
        .await;

    let client = ReqwestClient::new(settings(&server)).unwrap();
    let sink = TestSink::default();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = client.stream(&scan_pdf(), &sink, &cancel).await.unwrap();
    assert!(outcome.is_none());
}

#[tokio::test]
async fn stream_reports_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = ReqwestClient::new(settings(&server)).unwrap();
    let err = client
        .stream(&scan_pdf(), &TestSink::default(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
}
