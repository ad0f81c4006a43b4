//! Integration tests for the three-step resumable upload protocol

mod common;

use std::io::Write;

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{fast_retry, rpc_body, test_session};
use nlm::error::NlmError;
use nlm::NotebookClient;

const BATCH_PATH: &str = "/_/LabsTailwindUi/data/batchexecute";
const UPLOAD_PATH: &str = "/upload/_/";

fn client_for(server: &MockServer) -> NotebookClient {
    NotebookClient::new(test_session())
        .unwrap()
        .with_base_url(server.uri())
        .with_retry_policy(fast_retry())
}

fn write_temp_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents).unwrap();
    path
}

#[tokio::test]
async fn test_full_upload_flow() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file_path = write_temp_file(&dir, "notes.txt", b"hello notebook");

    // Step 1: registration RPC yields the SOURCE_ID (nested; the engine
    // takes the first string found depth-first).
    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .and(query_param("rpcids", "o4cbdc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rpc_body(
            "o4cbdc",
            "[[[\"source-abc\"]],null]",
        )))
        .expect(1)
        .mount(&server)
        .await;

    // Step 2: upload session start; the per-upload URL comes back in a
    // response header.
    let session_url = format!("{}/upload-session/xyz", server.uri());
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(header("x-goog-upload-protocol", "resumable"))
        .and(header("x-goog-upload-command", "start"))
        .and(header("x-goog-upload-header-content-length", "14"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("x-goog-upload-url", session_url.as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Step 3: streamed bytes with the finalize command.
    Mock::given(method("POST"))
        .and(path("/upload-session/xyz"))
        .and(header("x-goog-upload-command", "upload, finalize"))
        .and(header("x-goog-upload-offset", "0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let uploaded = client.add_file_source("nb-1", &file_path).await.unwrap();

    assert_eq!(uploaded.id, "source-abc");
    assert_eq!(uploaded.title, "notes.txt");

    // The streamed body must match the file contents.
    let requests = server.received_requests().await.unwrap();
    let stream_request = requests
        .iter()
        .find(|r| r.url.path() == "/upload-session/xyz")
        .unwrap();
    assert_eq!(stream_request.body, b"hello notebook");
}

#[tokio::test]
async fn test_empty_file_rejected_before_any_network_call() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file_path = write_temp_file(&dir, "empty.pdf", b"");

    let client = client_for(&server);
    let err = client.add_file_source("nb-1", &file_path).await.unwrap_err();

    match err.downcast_ref::<NlmError>() {
        Some(NlmError::Validation(msg)) => assert!(msg.contains("empty")),
        other => panic!("expected Validation, got {:?}", other),
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unsupported_extension_rejected_before_register_rpc() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file_path = write_temp_file(&dir, "malware.exe", b"MZ");

    let client = client_for(&server);
    let err = client.add_file_source("nb-1", &file_path).await.unwrap_err();

    match err.downcast_ref::<NlmError>() {
        Some(NlmError::Validation(msg)) => assert!(msg.contains("Unsupported file type")),
        other => panic!("expected Validation, got {:?}", other),
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_upload_url_header_is_hard_failure() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file_path = write_temp_file(&dir, "notes.md", b"# notes");

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(rpc_body("o4cbdc", "[[[\"source-abc\"]]]")),
        )
        .mount(&server)
        .await;

    // Step 2 responds 200 but without the x-goog-upload-url header.
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.add_file_source("nb-1", &file_path).await.unwrap_err();

    match err.downcast_ref::<NlmError>() {
        Some(NlmError::Upload { details, .. }) => {
            assert!(details.contains("upload URL"))
        }
        other => panic!("expected Upload, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transient_error_on_session_start_is_retried() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file_path = write_temp_file(&dir, "notes.csv", b"a,b\n1,2\n");

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(rpc_body("o4cbdc", "[[[\"source-retry\"]]]")),
        )
        .mount(&server)
        .await;

    let session_url = format!("{}/upload-session/r1", server.uri());
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(
            ResponseTemplate::new(200).insert_header("x-goog-upload-url", session_url.as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload-session/r1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let uploaded = client.add_file_source("nb-1", &file_path).await.unwrap();
    assert_eq!(uploaded.id, "source-retry");
}
