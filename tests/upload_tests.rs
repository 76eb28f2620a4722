//! Upload, duplicate detection and completion polling against a mock service.

mod auth_support;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::{client, token, InMemoryTokenStore};
use document_insighter::client::{DocumentInsighter, PollPolicy};
use document_insighter::error::InsighterError;
use document_insighter::types::ChannelLogId;
use document_insighter::util::md5_hex;

const CONTENT: &[u8] = b"%PDF-1.4 quarterly report";
const UPLOAD_PATH: &str = "/api/documents/common/upload";

fn document(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("report.pdf");
    std::fs::write(&path, CONTENT).expect("write document");
    path
}

fn fast_client(server: &MockServer) -> DocumentInsighter {
    let store = Arc::new(InMemoryTokenStore::seeded(token("live")));
    client(&server.uri(), store).with_poll_policy(
        PollPolicy::default()
            .with_interval(Duration::from_millis(20))
            .with_timeout(Duration::from_secs(5)),
    )
}

async fn mount_no_duplicates(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/api/document-channel-logs/md5-checksum/{}/uuids",
            md5_hex(CONTENT)
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

async fn mount_upload(server: &MockServer, channel_log_id: &str) {
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "id": channel_log_id, "status": "UPLOADING" }])),
        )
        .expect(1)
        .mount(server)
        .await;
}

fn status_path(id: &str) -> String {
    format!("/api/document-channel-logs/{id}/status")
}

fn extractions_path(id: &str) -> String {
    format!("/api/extraction-exporting/document-channel-logs/{id}/extractions")
}

#[tokio::test]
async fn duplicate_checksum_aborts_before_upload() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    Mock::given(method("GET"))
        .and(path(format!(
            "/api/document-channel-logs/md5-checksum/{}/uuids",
            md5_hex(CONTENT)
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["log-1", 42])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = fast_client(&server)
        .upload_document("BR", document(&dir), None, false)
        .await
        .unwrap_err();

    match err {
        InsighterError::DuplicateDocument {
            checksum,
            channel_log_ids,
        } => {
            assert_eq!(checksum, md5_hex(CONTENT));
            assert_eq!(channel_log_ids, vec!["log-1".to_string(), "42".to_string()]);
        }
        other => panic!("expected DuplicateDocument, got {other:?}"),
    }
}

#[tokio::test]
async fn upload_sends_multipart_with_category_and_metadata() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    Mock::given(method("GET"))
        .and(path(format!(
            "/api/document-channel-logs/md5-checksum/{}/uuids",
            md5_hex(CONTENT)
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["log-1"])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(query_param("category", "NB_COA"))
        .and(query_param("syncExtractionMetadata", "true"))
        .and(header("authorization", "Bearer live"))
        .and(body_string_contains("name=\"fields\""))
        .and(body_string_contains(r#"[{"source":"email"}]"#))
        .and(body_string_contains("filename=\"report.pdf\""))
        .and(body_string_contains("quarterly report"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": 7, "status": "UPLOADING" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let log = fast_client(&server)
        .upload_document("NB_COA", document(&dir), Some(json!({"source": "email"})), true)
        .await
        .expect("upload")
        .expect("channel log");

    assert_eq!(log.id, ChannelLogId::new("7"));
}

#[tokio::test]
async fn upload_without_metadata_sends_empty_object() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    mount_no_duplicates(&server).await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(body_string_contains("[{}]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let log = fast_client(&server)
        .upload_document("BR", document(&dir), None, false)
        .await
        .expect("upload");
    assert!(log.is_none());
}

#[tokio::test]
async fn upload_and_poll_waits_for_completion() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    mount_no_duplicates(&server).await;
    mount_upload(&server, "log-9").await;
    Mock::given(method("GET"))
        .and(path(status_path("log-9")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "UPLOADING"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(status_path("log-9")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "PROCESSING"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(status_path("log-9")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "COMPLETED"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(extractions_path("log-9")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "id": "e1", "category": "BR" }, { "id": "e2" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let started = Instant::now();
    let extractions = fast_client(&server)
        .upload_and_poll("BR", document(&dir), None, None)
        .await
        .expect("extractions");

    // Two non-terminal polls mean two full intervals of sleep.
    assert!(started.elapsed() >= Duration::from_millis(40));
    assert_eq!(extractions.len(), 2);
    assert_eq!(extractions[0]["id"], "e1");
}

#[tokio::test]
async fn failed_status_still_returns_extractions() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    mount_no_duplicates(&server).await;
    mount_upload(&server, "log-f").await;
    Mock::given(method("GET"))
        .and(path(status_path("log-f")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "FAILED"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(extractions_path("log-f")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let extractions = fast_client(&server)
        .upload_and_poll("BR", document(&dir), None, None)
        .await
        .expect("extractions");
    assert!(extractions.is_empty());
}

#[tokio::test]
async fn polling_times_out_when_status_never_finishes() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    mount_no_duplicates(&server).await;
    mount_upload(&server, "log-slow").await;
    Mock::given(method("GET"))
        .and(path(status_path("log-slow")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "PROCESSING"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(extractions_path("log-slow")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let timeout = Duration::from_millis(200);
    let started = Instant::now();
    let err = fast_client(&server)
        .upload_and_poll("BR", document(&dir), None, Some(timeout))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    match err {
        InsighterError::PollTimeout {
            channel_log_id,
            timeout: reported,
        } => {
            assert_eq!(channel_log_id, "log-slow");
            assert_eq!(reported, timeout);
        }
        other => panic!("expected PollTimeout, got {other:?}"),
    }
    assert!(elapsed >= timeout, "gave up after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "overran the deadline: {elapsed:?}");
}

#[tokio::test]
async fn default_interval_gives_up_between_timeout_and_one_extra_interval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(status_path("log-slow")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "PROCESSING"})))
        .mount(&server)
        .await;
    let store = Arc::new(InMemoryTokenStore::seeded(token("live")));
    let client = client(&server.uri(), store);

    let started = Instant::now();
    let err = client
        .wait_for_terminal(
            &ChannelLogId::new("log-slow"),
            PollPolicy::default().with_timeout(Duration::from_secs(2)),
        )
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, InsighterError::PollTimeout { .. }));
    assert!(elapsed >= Duration::from_secs(2), "gave up after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "overran the deadline: {elapsed:?}");
}

#[tokio::test]
async fn upload_server_error_propagates_as_http_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    mount_no_duplicates(&server).await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = fast_client(&server)
        .upload_and_poll("BR", document(&dir), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn missing_document_is_an_io_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("tempdir");
    let err = fast_client(&server)
        .upload_document("BR", dir.path().join("nope.pdf"), None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, InsighterError::Io(_)));
}
