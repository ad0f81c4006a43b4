//! RPC transport with automatic authentication recovery
//!
//! [`NotebookClient`] owns exactly one session and turns `(rpc_id, params)`
//! pairs into decoded results. Transient server errors (5xx/429) are
//! retried with bounded backoff *inside* a single attempt; auth failures
//! (HTTP 401/403 or the in-band error-16 signature) then climb a strictly
//! ordered, cheapest-first recovery ladder:
//!
//! 1. token refresh (page fetch + scrape), retry once
//! 2. reload the on-disk profile (another process may have re-authed),
//!    clear tokens so they re-derive, retry once
//! 3. headless re-auth via the login-flow collaborator, retry once
//!
//! Each layer runs at most once per originating call, so recovery depth is
//! bounded. Recovery installs a whole new session value (and a rebuilt
//! HTTP client) rather than mutating token fields in place.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde_json::Value;

use crate::auth::login::LoginFlow;
use crate::auth::profile::ProfileStore;
use crate::auth::recovery::{self, RefreshFailure};
use crate::auth::session::Session;
use crate::error::{is_auth_error, NlmError, Result};
use crate::rpc::envelope::{self, BASE_URL};
use crate::rpc::response;
use crate::rpc::retry::RetryPolicy;

/// Default per-request timeout for most RPC operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Extended timeout for source-add operations (the counterpart fetches and
/// indexes the source synchronously).
pub const SOURCE_ADD_TIMEOUT: Duration = Duration::from_secs(120);

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Cap stored error bodies; the login page is hundreds of kilobytes.
const ERROR_BODY_LIMIT: usize = 2000;

struct ClientState {
    http: reqwest::Client,
    session: Session,
}

/// Client for the batchexecute RPC endpoint.
pub struct NotebookClient {
    state: RwLock<ClientState>,
    base_url: String,
    upload_base_url: String,
    retry: RetryPolicy,
    store: Option<ProfileStore>,
    profile_name: String,
    login: Option<Arc<dyn LoginFlow>>,
}

impl NotebookClient {
    /// Create a client for the given session.
    pub fn new(session: Session) -> Result<Self> {
        let http = build_rpc_client(&session)?;
        Ok(Self {
            state: RwLock::new(ClientState { http, session }),
            base_url: BASE_URL.to_string(),
            upload_base_url: BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            store: None,
            profile_name: crate::auth::profile::DEFAULT_PROFILE.to_string(),
            login: None,
        })
    }

    /// Override the application origin (tests point this at a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self.upload_base_url = self.base_url.clone();
        self
    }

    /// Override the upload host separately from the RPC host.
    pub fn with_upload_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.upload_base_url = base_url.into();
        self
    }

    /// Attach a profile store used for disk-reload recovery and for
    /// persisting refreshed tokens.
    pub fn with_profile_store(mut self, store: ProfileStore, profile_name: impl Into<String>) -> Self {
        self.store = Some(store);
        self.profile_name = profile_name.into();
        self
    }

    /// Attach the headless login collaborator (recovery layer 3).
    pub fn with_login_flow(mut self, login: Arc<dyn LoginFlow>) -> Self {
        self.login = Some(login);
        self
    }

    /// Replace the retry policy (tests shrink the delays to zero).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Application origin this client targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload host this client targets.
    pub fn upload_base_url(&self) -> &str {
        &self.upload_base_url
    }

    /// Retry policy shared with the upload engine.
    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Snapshot of the current session (tests inspect refreshed tokens).
    pub fn session(&self) -> Session {
        self.state.read().expect("session lock poisoned").session.clone()
    }

    /// Execute an RPC with the default timeout.
    pub async fn call_rpc(&self, rpc_id: &str, params: Value, source_path: &str) -> Result<Value> {
        self.call(rpc_id, &params, source_path, DEFAULT_TIMEOUT).await
    }

    /// Execute an RPC with an explicit timeout (source-add operations).
    pub async fn call_rpc_with_timeout(
        &self,
        rpc_id: &str,
        params: Value,
        source_path: &str,
        timeout: Duration,
    ) -> Result<Value> {
        self.call(rpc_id, &params, source_path, timeout).await
    }

    async fn call(
        &self,
        rpc_id: &str,
        params: &Value,
        source_path: &str,
        timeout: Duration,
    ) -> Result<Value> {
        tracing::debug!("RPC call {} (source-path {})", rpc_id, source_path);

        let first = self.call_once(rpc_id, params, source_path, timeout).await;
        let err = match first {
            Ok(value) => return Ok(value),
            Err(e) if is_auth_error(&e) => e,
            Err(e) => return Err(e),
        };
        tracing::warn!("Auth failure on RPC {}, entering recovery: {}", rpc_id, err);

        // Layer 1: refresh tokens from a page fetch.
        match self.refresh_tokens().await {
            Ok(()) => {
                match self.call_once(rpc_id, params, source_path, timeout).await {
                    Ok(value) => return Ok(value),
                    Err(e) if is_auth_error(&e) => {
                        tracing::warn!("RPC {} still unauthorized after token refresh", rpc_id)
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(failure) => tracing::debug!("Token refresh failed: {}", failure),
        }

        // Layer 2: another process may have re-authenticated; reload the
        // profile from disk and re-derive tokens.
        if self.reload_from_disk() {
            if let Err(failure) = self.refresh_tokens().await {
                tracing::debug!("Token refresh after disk reload failed: {}", failure);
            }
            match self.call_once(rpc_id, params, source_path, timeout).await {
                Ok(value) => return Ok(value),
                Err(e) if is_auth_error(&e) => {
                    tracing::warn!("RPC {} still unauthorized after disk reload", rpc_id)
                }
                Err(e) => return Err(e),
            }
        }

        // Layer 3: headless re-auth through the login collaborator.
        if let Some(login) = self.login.clone() {
            match login.acquire_session().await {
                Ok(session) => {
                    if self.install_session(session, true).is_ok() {
                        match self.call_once(rpc_id, params, source_path, timeout).await {
                            Ok(value) => return Ok(value),
                            Err(e) if is_auth_error(&e) => tracing::warn!(
                                "RPC {} still unauthorized after headless re-auth",
                                rpc_id
                            ),
                            Err(e) => return Err(e),
                        }
                    }
                }
                Err(e) => tracing::warn!("Headless re-auth failed: {}", e),
            }
        }

        Err(NlmError::Authentication(
            "Authentication expired. Run `nlm login` to re-authenticate.".to_string(),
        )
        .into())
    }

    /// One transport attempt with backoff: transient server errors are
    /// retried here; auth failures bubble up untouched.
    async fn call_once(
        &self,
        rpc_id: &str,
        params: &Value,
        source_path: &str,
        timeout: Duration,
    ) -> Result<Value> {
        self.retry
            .execute(|| self.post_and_extract(rpc_id, params, source_path, timeout))
            .await
    }

    /// POST the envelope, parse the chunked response, extract the result.
    async fn post_and_extract(
        &self,
        rpc_id: &str,
        params: &Value,
        source_path: &str,
        timeout: Duration,
    ) -> Result<Value> {
        let (http, body, url, csrf) = {
            let state = self.state.read().expect("session lock poisoned");
            let body = envelope::build_request_body(
                rpc_id,
                params,
                state.session.csrf_token.as_deref(),
            );
            let url = envelope::build_url(
                &self.base_url,
                rpc_id,
                source_path,
                state.session.session_id.as_deref(),
            );
            (
                state.http.clone(),
                body,
                url,
                state.session.csrf_token.clone(),
            )
        };

        let mut request = http
            .post(&url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded;charset=UTF-8",
            )
            .timeout(timeout)
            .body(body);
        if let Some(token) = csrf {
            request = request.header("X-Goog-Csrf-Token", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NlmError::Transport(format!("RPC request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| NlmError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let body: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(NlmError::HttpStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let chunks = response::parse_response(&text);
        let result = response::extract_result(&chunks, rpc_id)?;
        Ok(result.unwrap_or(Value::Null))
    }

    /// Recovery layer 1: derive fresh tokens from a page fetch and install
    /// the refreshed session.
    async fn refresh_tokens(&self) -> std::result::Result<(), RefreshFailure> {
        let session = self.session();
        let page_client = build_page_client(&session)
            .map_err(|e| RefreshFailure::Fetch(e.to_string()))?;

        let refreshed = recovery::refresh_session(&page_client, &self.base_url, &session).await?;
        self.install_session(refreshed, true)
            .map_err(|e| RefreshFailure::Fetch(e.to_string()))
    }

    /// Recovery layer 2: re-read the on-disk profile. The in-memory tokens
    /// are known-bad, so the reloaded session starts token-less.
    fn reload_from_disk(&self) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        if !store.exists(&self.profile_name) {
            return false;
        }
        match store.load(&self.profile_name) {
            Ok(profile) => {
                tracing::info!("Reloaded profile '{}' from disk", self.profile_name);
                self.install_session(profile.session.without_tokens(), false)
                    .is_ok()
            }
            Err(e) => {
                tracing::warn!("Failed to reload profile '{}': {}", self.profile_name, e);
                false
            }
        }
    }

    /// Swap in a new session value, rebuilding the HTTP client (cookie jars
    /// are immutable once handed to reqwest). Optionally persists the
    /// session to the profile store, best-effort.
    fn install_session(&self, session: Session, persist: bool) -> Result<()> {
        let http = build_rpc_client(&session)?;

        if persist {
            if let Some(store) = &self.store {
                let email = store
                    .load(&self.profile_name)
                    .ok()
                    .and_then(|p| p.email);
                if let Err(e) = store.save(&self.profile_name, &session, email.as_deref()) {
                    tracing::debug!("Failed to persist refreshed session: {}", e);
                }
            }
        }

        let mut state = self.state.write().expect("session lock poisoned");
        *state = ClientState { http, session };
        Ok(())
    }

    /// Client for streaming artifact downloads: cookie jar across both
    /// domains, redirect following, connect timeout only (per-chunk
    /// timeouts are enforced by the download engine).
    pub(crate) fn streaming_client(&self) -> Result<reqwest::Client> {
        let session = self.session();
        let client = reqwest::Client::builder()
            .cookie_provider(session.cookie_jar()?)
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NlmError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(client)
    }

    /// Client for the resumable-upload endpoints.
    pub(crate) fn upload_client(&self, timeout: Duration) -> Result<reqwest::Client> {
        let session = self.session();
        let client = reqwest::Client::builder()
            .cookie_provider(session.cookie_jar()?)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| NlmError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(client)
    }
}

fn build_rpc_client(session: &Session) -> Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ORIGIN,
        reqwest::header::HeaderValue::from_static(BASE_URL),
    );
    headers.insert(
        reqwest::header::REFERER,
        reqwest::header::HeaderValue::from_static("https://notebooklm.google.com/"),
    );
    headers.insert(
        "X-Same-Domain",
        reqwest::header::HeaderValue::from_static("1"),
    );

    reqwest::Client::builder()
        .cookie_provider(session.cookie_jar()?)
        .default_headers(headers)
        .user_agent(USER_AGENT)
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .map_err(|e| NlmError::Transport(format!("Failed to build HTTP client: {}", e)).into())
}

fn build_page_client(session: &Session) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .cookie_provider(session.cookie_jar()?)
        .timeout(Duration::from_secs(15))
        .build()
        .map_err(|e| NlmError::Transport(format!("Failed to build HTTP client: {}", e)).into())
}
