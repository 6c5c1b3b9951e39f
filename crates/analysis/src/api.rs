//! REST API client for the analysis backend.
//!
//! Wraps the task endpoints (creation, status, report) using
//! [`reqwest`]. All paths are relative to a configurable base URL such as
//! `http://127.0.0.1:8000/apiv2/tasks`.

use std::time::Duration;

use malviz_core::artifact::{Artifact, ARTIFACT_FIELD_NAME};
use malviz_core::job::JobKind;
use malviz_core::status::StatusResponse;
use malviz_core::types::TaskId;
use serde::Deserialize;

/// Default timeout for a single HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Task-creation path for a job kind, relative to the API base URL.
///
/// The dynamic pipeline is the backend's generic file task.
pub fn create_path(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Static => "create/static/",
        JobKind::Dynamic => "create/file/",
    }
}

/// HTTP client for one analysis backend.
#[derive(Debug, Clone)]
pub struct AnalysisApi {
    client: reqwest::Client,
    api_url: String,
    report_api_url: String,
}

/// Body returned by the task-creation endpoints.
///
/// Shape: `{ "data": { "task_ids": [<id>, ...] } }`. Identifiers may be
/// numbers or strings.
#[derive(Debug, Deserialize)]
pub struct CreateTaskResponse {
    pub data: CreateTaskData,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskData {
    #[serde(default)]
    pub task_ids: Vec<serde_json::Value>,
}

impl CreateTaskResponse {
    /// The first task identifier, normalised to a string.
    pub fn first_task_id(&self) -> Option<TaskId> {
        match self.data.task_ids.first()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Errors from the analysis REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Analysis API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The body did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A base URL cannot be extended with a task path.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl AnalysisApi {
    /// Create a client with its own connection pool and the given
    /// per-request timeout.
    ///
    /// * `api_url`        - base URL for task creation and status.
    /// * `report_api_url` - base URL for report retrieval (often the same).
    pub fn new(
        api_url: impl Into<String>,
        report_api_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, AnalysisApiError> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self::with_client(client, api_url, report_api_url))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        report_api_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: trim_base(api_url.into()),
            report_api_url: trim_base(report_api_url.into()),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn report_api_url(&self) -> &str {
        &self.report_api_url
    }

    /// Submit an artifact to the creation endpoint for `kind`.
    ///
    /// Sends a multipart `POST` with every artifact part under the `file`
    /// field and returns the first task identifier from the response.
    pub async fn create_task(
        &self,
        kind: JobKind,
        artifact: &Artifact,
    ) -> Result<TaskId, AnalysisApiError> {
        let mut form = reqwest::multipart::Form::new();
        for part in artifact.parts() {
            let file = reqwest::multipart::Part::bytes(part.bytes.clone())
                .file_name(part.file_name.clone());
            form = form.part(ARTIFACT_FIELD_NAME, file);
        }

        let url = format!("{}/{}", self.api_url, create_path(kind));
        tracing::debug!(%kind, url = %url, files = artifact.parts().len(), "Creating analysis task");

        let response = self.client.post(url).multipart(form).send().await?;
        let created: CreateTaskResponse = Self::parse_response(response).await?;

        created.first_task_id().ok_or_else(|| {
            AnalysisApiError::MalformedResponse("creation response has no task_ids".to_string())
        })
    }

    /// Query the status of a task via `GET /status/{task_id}`.
    pub async fn task_status(&self, task_id: &str) -> Result<StatusResponse, AnalysisApiError> {
        let url = task_url(&self.api_url, "status", task_id)?;
        let response = self.client.get(url).send().await?;

        Self::parse_response(response).await
    }

    /// Retrieve the raw report JSON via `GET /report/{task_id}`.
    pub async fn get_report(&self, task_id: &str) -> Result<serde_json::Value, AnalysisApiError> {
        let url = task_url(&self.report_api_url, "report", task_id)?;
        let response = self.client.get(url).send().await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`AnalysisApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, AnalysisApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(AnalysisApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    ///
    /// Shape mismatches surface as [`AnalysisApiError::MalformedResponse`]
    /// rather than as transport errors.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AnalysisApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| AnalysisApiError::MalformedResponse(e.to_string()))
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// `{base}/{endpoint}/{task_id}` with the identifier percent-encoded as a
/// single path segment.
fn task_url(base: &str, endpoint: &str, task_id: &str) -> Result<url::Url, AnalysisApiError> {
    let invalid = |reason: String| AnalysisApiError::InvalidUrl {
        url: base.to_string(),
        reason,
    };
    let mut url = url::Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be a base".to_string()))?
        .pop_if_empty()
        .push(endpoint)
        .push(task_id);
    Ok(url)
}
