//! Scriptable HTTP server for tests.
//!
//! [`TestServer`] listens on a real loopback port and answers every request
//! with the next status code and body from its [`Script`], repeating the last
//! entry of each sequence once it is reached. After each request the handler
//! records the request path and query along with what happened when the body
//! was written, so tests can assert on both sides of the exchange.
//!
//! Always build request URLs from [`TestServer::url`] so tests never reach
//! out to real hosts.
//!
//! 204 and 304 responses do not allow a body. Scripting a body for them is
//! not an error at the HTTP level; the failure lands in
//! [`Observation::body_write_error`], so check it in tests. A scripted 1xx
//! status is informational only: the final answer is 200 with the body.
//!
//! # Concurrency
//!
//! Script and observation share one mutex, held only while the handler picks
//! the next response and records the outcome. Tests are expected to issue one
//! request at a time; overlapping requests against the same server still race
//! on which request's metadata is kept and in which order sequences advance.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{Result, TestUtilError};
use crate::query::{parse_query, QueryValues};
use crate::script::{Script, ScriptConfig};
use crate::sequence::Sequence;
use crate::writer::{BufferedWriter, ResponseWriter, WriteError};

type SharedState = Arc<Mutex<ServerState>>;

/// The parts of an incoming request the script cares about
#[derive(Debug, Clone, PartialEq)]
pub struct RequestInfo {
    /// HTTP method
    pub method: Method,
    /// URL path, percent-decoded
    pub path: String,
    /// Decoded query parameters
    pub query: QueryValues,
}

impl RequestInfo {
    /// Splits a request URI into a decoded path and query
    pub fn from_uri(method: Method, uri: &Uri) -> Self {
        Self {
            method,
            path: percent_decode_str(uri.path()).decode_utf8_lossy().into_owned(),
            query: parse_query(uri.query()),
        }
    }
}

/// One request served by the test server
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: Method,
    /// URL path
    pub path: String,
    /// Decoded query parameters
    pub query: QueryValues,
    /// Status the server answered with
    pub status: StatusCode,
    /// When the request was handled
    pub received_at: DateTime<Utc>,
}

/// What the server saw and did for the most recent request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    /// Path in the request URL
    pub request_path: String,
    /// Query received in the request
    pub request_query: QueryValues,
    /// Whether the body write was flushed. Stays set once any request flushed.
    pub flushed: bool,
    /// Number of body bytes written
    pub body_write_bytes: usize,
    /// Error from writing the body
    pub body_write_error: Option<WriteError>,
    /// Requests served so far
    pub request_count: usize,
    /// Every request served, oldest first
    pub requests: Vec<RecordedRequest>,
}

/// Script plus observations, shared between the handler and the test
#[derive(Debug, Default)]
pub struct ServerState {
    /// Responses to hand out
    pub script: Script,
    /// Metadata captured from handled requests
    pub observed: Observation,
}

impl ServerState {
    /// Creates state that answers from `script`
    pub fn new(script: Script) -> Self {
        Self {
            script,
            observed: Observation::default(),
        }
    }

    /// Answers one request through `writer` and records the outcome.
    ///
    /// Returns the final status of the response.
    pub fn respond<W: ResponseWriter + ?Sized>(
        &mut self,
        request: &RequestInfo,
        writer: &mut W,
    ) -> StatusCode {
        let status = self.script.next_status(&request.path);
        let body = self.script.next_body(&request.path);

        writer.write_header(status);
        self.observed.request_path = request.path.clone();
        self.observed.request_query = request.query.clone();

        match writer.write(body.as_bytes()) {
            Ok(written) => {
                self.observed.body_write_bytes = written;
                self.observed.body_write_error = None;
            }
            Err(e) => {
                warn!("body write for {} failed: {}", request.path, e);
                self.observed.body_write_bytes = 0;
                self.observed.body_write_error = Some(e);
            }
        }

        if let Some(flusher) = writer.as_flusher() {
            flusher.flush();
            self.observed.flushed = true;
        }

        let status = writer.status();
        self.observed.request_count += 1;
        self.observed.requests.push(RecordedRequest {
            method: request.method.clone(),
            path: request.path.clone(),
            query: request.query.clone(),
            status,
            received_at: Utc::now(),
        });

        status
    }

    /// Forgets everything observed so far, leaving the script alone
    pub fn reset_observation(&mut self) {
        self.observed = Observation::default();
    }
}

async fn serve_scripted(State(state): State<SharedState>, method: Method, uri: Uri) -> Response {
    let request = RequestInfo::from_uri(method, &uri);
    let mut writer = BufferedWriter::new();
    let status = state.lock().await.respond(&request, &mut writer);
    debug!("{} {} -> {}", request.method, uri, status);
    writer.into_response()
}

/// Handle for a running scripted server.
///
/// Call [`TestServer::close`] when the test is done; dropping the handle only
/// signals shutdown without waiting for it.
pub struct TestServer {
    addr: SocketAddr,
    url: String,
    client: reqwest::Client,
    state: SharedState,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl TestServer {
    /// Starts a server on an ephemeral loopback port answering 200 with an empty body
    pub async fn start() -> Result<Self> {
        Self::with_config(ServerConfig::default()).await
    }

    /// Starts a server with the given configuration
    pub async fn with_config(config: ServerConfig) -> Result<Self> {
        let timeout = config.client_timeout();
        let script = config.script.into_script()?;

        let mut builder = reqwest::Client::builder().no_proxy();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let listener = TcpListener::bind(config.bind_addr).await?;
        let addr = listener.local_addr()?;
        let url = format!("http://{}", addr);

        let state: SharedState = Arc::new(Mutex::new(ServerState::new(script)));
        let app: Router = Router::new()
            .fallback(serve_scripted)
            .with_state(Arc::clone(&state));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!("Scripted test server listening on {}", url);

        Ok(Self {
            addr,
            url,
            client,
            state,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Base URL of the server, without a trailing slash
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Full URL for `path` on this server
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }

    /// Socket address the server is bound to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// HTTP client to use against this server
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Issues a GET for `path` with the server's client
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.get(self.endpoint(path)).send().await?)
    }

    /// Locks the shared state for reading observations or editing the script
    pub async fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().await
    }

    /// Snapshot of what was observed so far
    pub async fn observation(&self) -> Observation {
        self.state.lock().await.observed.clone()
    }

    /// Replaces the default status sequence
    pub async fn set_statuses(&self, statuses: impl IntoIterator<Item = StatusCode>) {
        self.state.lock().await.script.statuses = Sequence::new(statuses);
    }

    /// Replaces the default body sequence
    pub async fn set_bodies<S: Into<String>>(&self, bodies: impl IntoIterator<Item = S>) {
        self.state.lock().await.script.bodies = bodies.into_iter().map(Into::into).collect();
    }

    /// Sets the status sequence for requests to `path`
    pub async fn set_path_statuses(
        &self,
        path: &str,
        statuses: impl IntoIterator<Item = StatusCode>,
    ) {
        self.state
            .lock()
            .await
            .script
            .status_overrides
            .insert(path.to_string(), Sequence::new(statuses));
    }

    /// Sets the body sequence for requests to `path`
    pub async fn set_path_bodies<S: Into<String>>(
        &self,
        path: &str,
        bodies: impl IntoIterator<Item = S>,
    ) {
        self.state
            .lock()
            .await
            .script
            .body_overrides
            .insert(path.to_string(), bodies.into_iter().map(Into::into).collect());
    }

    /// Replaces the whole script
    pub async fn load_script(&self, config: ScriptConfig) -> Result<()> {
        let script = config.into_script()?;
        self.state.lock().await.script = script;
        Ok(())
    }

    /// Stops accepting connections and waits for the server to finish
    pub async fn close(mut self) -> Result<()> {
        self.signal_shutdown();
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| TestUtilError::Server(format!("server task failed: {}", e)))??;
        }
        info!("Scripted test server on {} closed", self.url);
        Ok(())
    }

    fn signal_shutdown(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.signal_shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    /// Writer without flush support that records what it was given
    #[derive(Default)]
    struct PlainWriter {
        status: Option<StatusCode>,
        body: Vec<u8>,
    }

    impl ResponseWriter for PlainWriter {
        fn write_header(&mut self, status: StatusCode) {
            self.status.get_or_insert(status);
        }

        fn status(&self) -> StatusCode {
            self.status.unwrap_or(StatusCode::OK)
        }

        fn write(&mut self, data: &[u8]) -> std::result::Result<usize, WriteError> {
            self.body.extend_from_slice(data);
            Ok(data.len())
        }
    }

    fn get(path_and_query: &str) -> RequestInfo {
        let uri: Uri = path_and_query.parse().unwrap();
        RequestInfo::from_uri(Method::GET, &uri)
    }

    #[test]
    fn test_request_info_from_uri() {
        let info = get("/test/path?key=v1&key=v2");
        assert_eq!(info.path, "/test/path");
        assert_eq!(info.query["key"], vec!["v1", "v2"]);
    }

    #[test]
    fn test_request_path_is_decoded() {
        let info = get("/a%20b/caf%C3%A9?x=%2F");
        assert_eq!(info.path, "/a b/café");
        assert_eq!(info.query["x"], vec!["/"]);
    }

    #[test]
    fn test_encoded_path_matches_decoded_override() {
        let mut state = ServerState::default();
        state
            .script
            .body_overrides
            .insert("/a b".into(), Sequence::from(["decoded-match".to_string()]));

        let mut writer = BufferedWriter::new();
        state.respond(&get("/a%20b"), &mut writer);

        assert_eq!(state.observed.request_path, "/a b");
        assert_eq!(writer.frames(), &[Bytes::from_static(b"decoded-match")]);
    }

    #[test]
    fn test_respond_records_observation() {
        let mut state = ServerState::default();
        state.script.bodies = Sequence::from(["hello".to_string()]);

        let mut writer = BufferedWriter::new();
        let status = state.respond(&get("/a?x=1"), &mut writer);

        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.observed.request_path, "/a");
        assert_eq!(state.observed.request_query["x"], vec!["1"]);
        assert_eq!(state.observed.body_write_bytes, 5);
        assert_eq!(state.observed.body_write_error, None);
        assert!(state.observed.flushed);
        assert_eq!(state.observed.request_count, 1);
        assert_eq!(state.observed.requests[0].status, StatusCode::OK);
        assert_eq!(writer.frames().len(), 1);
    }

    #[test]
    fn test_flushed_flag_sticks_for_writers_without_flush() {
        let mut state = ServerState::default();
        state.respond(&get("/"), &mut BufferedWriter::new());
        assert!(state.observed.flushed);

        let mut plain = PlainWriter::default();
        state.respond(&get("/"), &mut plain);
        assert!(state.observed.flushed);
        assert_eq!(plain.status, Some(StatusCode::OK));

        state.reset_observation();
        state.respond(&get("/"), &mut PlainWriter::default());
        assert!(!state.observed.flushed);
    }

    #[test]
    fn test_body_not_allowed_is_captured() {
        let mut state = ServerState::default();
        state.script.statuses = Sequence::from([StatusCode::NO_CONTENT]);
        state.script.bodies = Sequence::from(["not allowed".to_string()]);

        let mut writer = BufferedWriter::new();
        let status = state.respond(&get("/"), &mut writer);

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.observed.body_write_bytes, 0);
        assert_eq!(
            state.observed.body_write_error,
            Some(WriteError::BodyNotAllowed(StatusCode::NO_CONTENT))
        );
        assert!(writer.frames().is_empty());
    }

    #[test]
    fn test_informational_status_answers_ok_with_body() {
        let mut state = ServerState::default();
        state.script.statuses = Sequence::from([StatusCode::CONTINUE]);
        state.script.bodies = Sequence::from(["x".to_string()]);

        let mut writer = BufferedWriter::new();
        let status = state.respond(&get("/"), &mut writer);

        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.observed.body_write_error, None);
        assert_eq!(state.observed.body_write_bytes, 1);
        assert_eq!(state.observed.requests[0].status, StatusCode::OK);
        assert_eq!(writer.informational(), &[StatusCode::CONTINUE]);
    }

    #[test]
    fn test_write_error_cleared_by_next_request() {
        let mut state = ServerState::default();
        state.script.statuses = Sequence::from([StatusCode::NOT_MODIFIED, StatusCode::OK]);
        state.script.bodies = Sequence::from(["x".to_string()]);

        state.respond(&get("/"), &mut BufferedWriter::new());
        assert!(state.observed.body_write_error.is_some());

        state.respond(&get("/"), &mut BufferedWriter::new());
        assert_eq!(state.observed.body_write_error, None);
        assert_eq!(state.observed.body_write_bytes, 1);
    }

    #[test]
    fn test_history_keeps_every_request() {
        let mut state = ServerState::default();
        state
            .script
            .status_overrides
            .insert("/b".into(), Sequence::from([StatusCode::ACCEPTED]));

        state.respond(&get("/a"), &mut BufferedWriter::new());
        state.respond(&get("/b?q=1"), &mut BufferedWriter::new());

        let paths: Vec<_> = state.observed.requests.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/a", "/b"]);
        assert_eq!(state.observed.requests[1].status, StatusCode::ACCEPTED);
        assert_eq!(state.observed.request_path, "/b");
        assert_eq!(state.observed.request_count, 2);
    }

    #[tokio::test]
    async fn test_start_and_close() -> Result<()> {
        let server = TestServer::start().await?;
        assert!(server.addr().ip().is_loopback());
        assert_ne!(server.addr().port(), 0);
        assert!(server.url().starts_with("http://127.0.0.1:"));
        assert_eq!(server.endpoint("/x"), format!("{}/x", server.url()));
        server.close().await
    }

    #[tokio::test]
    async fn test_with_config_rejects_bad_script() {
        let mut config = ServerConfig::default();
        config.script.statuses = vec![7];
        assert!(matches!(
            TestServer::with_config(config).await,
            Err(TestUtilError::Config(_))
        ));
    }
}
