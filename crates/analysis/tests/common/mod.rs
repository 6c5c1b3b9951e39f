//! In-process fake of the analysis backend for client tests.
//!
//! Serves the task routes under `/apiv2/tasks` on an ephemeral port and
//! records every multipart upload it receives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;

pub const BASE_PATH: &str = "/apiv2/tasks";

/// One multipart field received by a creation route.
#[derive(Debug, Clone)]
pub struct Upload {
    pub route: &'static str,
    pub field: String,
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Scripted responses plus recorded requests.
#[derive(Default)]
pub struct FakeState {
    /// Creation responses keyed by route (`"static"` or `"file"`).
    pub create: HashMap<&'static str, (StatusCode, String)>,
    /// Status responses keyed by task id.
    pub status: HashMap<String, (StatusCode, String)>,
    /// Report bodies keyed by task id.
    pub reports: HashMap<String, serde_json::Value>,
    pub uploads: Vec<Upload>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn on_create(&self, route: &'static str, status: StatusCode, body: serde_json::Value) {
        self.state
            .lock()
            .unwrap()
            .create
            .insert(route, (status, body.to_string()));
    }

    pub fn on_status(&self, task_id: &str, status: StatusCode, body: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .status
            .insert(task_id.to_string(), (status, body.into()));
    }

    pub fn on_report(&self, task_id: &str, body: serde_json::Value) {
        self.state
            .lock()
            .unwrap()
            .reports
            .insert(task_id.to_string(), body);
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.state.lock().unwrap().uploads.clone()
    }

    /// Bind to `127.0.0.1:0`, serve in the background, and return the
    /// API base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route(&format!("{BASE_PATH}/create/static/"), post(create_static))
            .route(&format!("{BASE_PATH}/create/file/"), post(create_file))
            .route(&format!("{BASE_PATH}/status/{{id}}"), get(status))
            .route(&format!("{BASE_PATH}/report/{{id}}"), get(report))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}{BASE_PATH}")
    }
}

async fn create_static(State(fake): State<FakeBackend>, multipart: Multipart) -> (StatusCode, String) {
    create(fake, "static", multipart).await
}

async fn create_file(State(fake): State<FakeBackend>, multipart: Multipart) -> (StatusCode, String) {
    create(fake, "file", multipart).await
}

async fn create(fake: FakeBackend, route: &'static str, mut multipart: Multipart) -> (StatusCode, String) {
    let mut received = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.unwrap_or_default().to_vec();
        received.push(Upload {
            route,
            field: name,
            file_name,
            bytes,
        });
    }

    let mut state = fake.state.lock().unwrap();
    state.uploads.extend(received);
    state
        .create
        .get(route)
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, "{}".to_string()))
}

async fn status(State(fake): State<FakeBackend>, Path(id): Path<String>) -> (StatusCode, String) {
    fake.state
        .lock()
        .unwrap()
        .status
        .get(&id)
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, r#"{"error": true}"#.to_string()))
}

async fn report(State(fake): State<FakeBackend>, Path(id): Path<String>) -> (StatusCode, String) {
    match fake.state.lock().unwrap().reports.get(&id) {
        Some(body) => (StatusCode::OK, body.to_string()),
        None => (StatusCode::NOT_FOUND, r#"{"error": "not found"}"#.to_string()),
    }
}
