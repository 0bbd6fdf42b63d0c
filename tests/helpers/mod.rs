//! Test helper utilities: an in-process mock of the verification service

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::task::JoinHandle;

use mediscan_client::services::client::VerificationClient;
use mediscan_client::services::progress::ProgressConfig;
use mediscan_client::workflow::WorkflowController;

/// One multipart part as received by the mock `/verify` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

/// How the mock answers `POST /verify`.
#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl MockBehavior {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            body: json!({ "detail": "Internal error" }).to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
struct MockState {
    behavior: MockBehavior,
    requests: Arc<Mutex<Vec<Vec<ReceivedPart>>>>,
}

/// Mock verification service bound to an ephemeral local port.
///
/// The server task is aborted when the backend is dropped.
pub struct MockBackend {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Vec<ReceivedPart>>>>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start(behavior: MockBehavior) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            behavior,
            requests: Arc::clone(&requests),
        };

        let app = Router::new()
            .route("/verify", post(verify))
            .route("/health", get(health))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock backend failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
            handle,
        }
    }

    /// Every `/verify` request received so far, as its ordered list of parts.
    pub fn requests(&self) -> Vec<Vec<ReceivedPart>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn client(&self) -> VerificationClient {
        VerificationClient::new(&self.base_url, Duration::from_secs(10))
            .expect("Failed to build client")
    }

    pub fn controller(&self) -> WorkflowController {
        WorkflowController::new(self.client(), fast_progress())
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Progress intervals short enough to observe within a test.
pub fn fast_progress() -> ProgressConfig {
    ProgressConfig {
        tick: Duration::from_millis(5),
        stage_advance: Duration::from_millis(20),
    }
}

async fn verify(State(state): State<MockState>, mut multipart: Multipart) -> Response {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            size,
        });
    }
    state.requests.lock().unwrap().push(parts);

    if !state.behavior.delay.is_zero() {
        tokio::time::sleep(state.behavior.delay).await;
    }

    (
        state.behavior.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.behavior.body.clone(),
    )
        .into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": "1.0.0",
        "tesseract_configured": true
    }))
}
