//! Integration tests for the RPC transport and auth recovery ladder

mod common;

use async_trait::async_trait;
use std::sync::Arc;

use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{fast_retry, page_html, rpc_body, rpc_error_16_body, test_session};
use nlm::auth::{LoginFlow, ProfileStore, Session};
use nlm::error::NlmError;
use nlm::NotebookClient;

const BATCH_PATH: &str = "/_/LabsTailwindUi/data/batchexecute";

fn client_for(server: &MockServer) -> NotebookClient {
    NotebookClient::new(test_session())
        .unwrap()
        .with_base_url(server.uri())
        .with_retry_policy(fast_retry())
}

/// Matches requests whose body does NOT contain the given substring.
struct BodyLacks(&'static str);

impl wiremock::Match for BodyLacks {
    fn matches(&self, request: &wiremock::Request) -> bool {
        !String::from_utf8_lossy(&request.body).contains(self.0)
    }
}

#[tokio::test]
async fn test_call_rpc_returns_decoded_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .and(query_param("rpcids", "wXbhsf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(rpc_body("wXbhsf", "[[\"nb-1\",\"My Notebook\"]]")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .call_rpc("wXbhsf", serde_json::json!([null, 1]), "/")
        .await
        .unwrap();

    assert_eq!(result[0][0], "nb-1");
    assert_eq!(result[0][1], "My Notebook");
}

#[tokio::test]
async fn test_request_body_is_double_encoded_form() {
    let server = MockServer::start().await;

    // The envelope is percent-encoded in full: the literal `[[[` opener
    // arrives as %5B%5B%5B and the body keeps its trailing ampersand.
    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .and(body_string_contains("f.req=%5B%5B%5B%22wXbhsf%22"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rpc_body("wXbhsf", "[]")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .call_rpc("wXbhsf", serde_json::json!([]), "/")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_server_errors_are_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(rpc_body("gArtLc", "[[]]")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .call_rpc("gArtLc", serde_json::json!([[2], "nb-1"]), "/")
        .await
        .unwrap();
    assert!(result.is_array());
}

#[tokio::test]
async fn test_retries_exhausted_surfaces_http_status() {
    let server = MockServer::start().await;

    // max_retries = 3 means exactly 4 attempts.
    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .call_rpc("gArtLc", serde_json::json!([]), "/")
        .await
        .unwrap_err();
    match err.downcast_ref::<NlmError>() {
        Some(NlmError::HttpStatus { status, .. }) => assert_eq!(*status, 503),
        other => panic!("expected HttpStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_retryable_status_fails_after_one_attempt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .call_rpc("gArtLc", serde_json::json!([]), "/")
        .await
        .unwrap_err();
    match err.downcast_ref::<NlmError>() {
        Some(NlmError::HttpStatus { status, .. }) => assert_eq!(*status, 404),
        other => panic!("expected HttpStatus, got {:?}", other),
    }
}

/// 401 on the first attempt, a token refresh via a non-redirecting page
/// fetch, then success: the call returns the payload and the session's
/// CSRF token is updated in place.
#[tokio::test]
async fn test_auth_recovery_refreshes_token_and_retries() {
    let server = MockServer::start().await;

    // Refreshed calls carry the scraped token in the `at=` field.
    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .and(body_string_contains("at=fresh-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(rpc_body("wXbhsf", "[[\"nb-1\"]]")),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Anything without the fresh token is unauthorized.
    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .and(BodyLacks("at=fresh-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    // The recovery page fetch serves fresh tokens.
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(page_html("fresh-token", "sid-42")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.session().csrf_token.is_none());

    let result = client
        .call_rpc("wXbhsf", serde_json::json!([null, 1]), "/")
        .await
        .unwrap();
    assert_eq!(result[0][0], "nb-1");

    let session = client.session();
    assert_eq!(session.csrf_token.as_deref(), Some("fresh-token"));
    assert_eq!(session.session_id.as_deref(), Some("sid-42"));
}

/// The in-band error-16 signature routes into recovery exactly like an
/// HTTP 401; with every layer unavailable the terminal error carries the
/// remediation hint.
#[tokio::test]
async fn test_error_16_exhausted_recovery_is_terminal_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(rpc_error_16_body("wXbhsf")))
        .mount(&server)
        .await;

    // Page fetch succeeds but carries no scrapeable token, so layer 1
    // fails; no profile store, no login flow.
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>stub page</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .call_rpc("wXbhsf", serde_json::json!([]), "/")
        .await
        .unwrap_err();

    match err.downcast_ref::<NlmError>() {
        Some(NlmError::Authentication(msg)) => assert!(msg.contains("nlm login")),
        other => panic!("expected Authentication, got {:?}", other),
    }
}

/// Disk reload (layer 2) runs after a failed refresh and before the
/// terminal error; each layer is attempted at most once.
#[tokio::test]
async fn test_recovery_ladder_attempts_each_layer_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_html("scraped", "sid")))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = ProfileStore::new(dir.path());
    store.save("default", &test_session(), None).unwrap();

    let client = NotebookClient::new(test_session())
        .unwrap()
        .with_base_url(server.uri())
        .with_retry_policy(fast_retry())
        .with_profile_store(store, "default");

    let err = client
        .call_rpc("wXbhsf", serde_json::json!([]), "/")
        .await
        .unwrap_err();
    assert!(nlm::error::is_auth_error(&err));

    // Ladder: initial call, post-refresh retry, post-reload retry = 3 RPCs.
    let rpc_calls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == BATCH_PATH)
        .count();
    assert_eq!(rpc_calls, 3);
}

struct FakeLogin {
    session: Session,
}

#[async_trait]
impl LoginFlow for FakeLogin {
    async fn acquire_session(&self) -> nlm::Result<Session> {
        Ok(self.session.clone())
    }
}

/// Headless re-auth (layer 3) produces a working session after the
/// earlier layers fail.
#[tokio::test]
async fn test_recovery_ladder_reaches_login_flow() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .and(body_string_contains("at=relogin-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rpc_body("wXbhsf", "[\"ok\"]")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .and(BodyLacks("at=relogin-token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    // Page fetch yields no tokens, so refresh fails both times it runs.
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>no tokens</html>"))
        .mount(&server)
        .await;

    let relogin_session = test_session().with_tokens(Some("relogin-token".to_string()), None);
    let client = NotebookClient::new(test_session())
        .unwrap()
        .with_base_url(server.uri())
        .with_retry_policy(fast_retry())
        .with_login_flow(Arc::new(FakeLogin {
            session: relogin_session,
        }));

    let result = client
        .call_rpc("wXbhsf", serde_json::json!([]), "/")
        .await
        .unwrap();
    assert_eq!(result[0], "ok");
    assert_eq!(client.session().csrf_token.as_deref(), Some("relogin-token"));
}
