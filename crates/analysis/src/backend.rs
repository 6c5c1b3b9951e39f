//! The seam between the orchestrator and the analysis service.
//!
//! [`AnalysisBackend`] is implemented by [`AnalysisApi`] for real HTTP
//! traffic and by scripted fakes in tests.

use async_trait::async_trait;
use malviz_core::artifact::Artifact;
use malviz_core::job::JobKind;
use malviz_core::status::StatusResponse;
use malviz_core::types::TaskId;

use crate::api::{AnalysisApi, AnalysisApiError};

#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Create a task of `kind` for `artifact`, returning its identifier.
    async fn create_task(&self, kind: JobKind, artifact: &Artifact) -> Result<TaskId, AnalysisApiError>;

    /// Current status of a task.
    async fn task_status(&self, task_id: &str) -> Result<StatusResponse, AnalysisApiError>;

    /// Raw report JSON of a finished task.
    async fn get_report(&self, task_id: &str) -> Result<serde_json::Value, AnalysisApiError>;
}

#[async_trait]
impl AnalysisBackend for AnalysisApi {
    async fn create_task(&self, kind: JobKind, artifact: &Artifact) -> Result<TaskId, AnalysisApiError> {
        AnalysisApi::create_task(self, kind, artifact).await
    }

    async fn task_status(&self, task_id: &str) -> Result<StatusResponse, AnalysisApiError> {
        AnalysisApi::task_status(self, task_id).await
    }

    async fn get_report(&self, task_id: &str) -> Result<serde_json::Value, AnalysisApiError> {
        AnalysisApi::get_report(self, task_id).await
    }
}
