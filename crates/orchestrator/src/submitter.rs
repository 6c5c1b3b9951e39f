//! Task creation for one job track.

use malviz_analysis::AnalysisBackend;
use malviz_core::artifact::Artifact;
use malviz_core::job::Job;
use malviz_core::types::TaskId;
use tokio::time::Instant;

use crate::error::{SubmissionError, SubmissionFailure};

/// Submit `artifact` as a task of the job's kind.
///
/// The start instant is taken before the request is sent, so progress
/// estimation counts upload time. On success the job is `Submitted` and
/// carries the returned identifier. On failure the job is left untouched
/// and nothing is retried.
pub async fn submit_job(
    backend: &dyn AnalysisBackend,
    artifact: &Artifact,
    job: &mut Job,
) -> Result<TaskId, SubmissionError> {
    let kind = job.kind();
    let started_at = Instant::now();

    let task_id = backend
        .create_task(kind, artifact)
        .await
        .map_err(|e| SubmissionError::new(kind, e))?;

    job.mark_submitted(task_id.clone(), started_at)
        .map_err(|e| SubmissionError::new(kind, SubmissionFailure::Malformed(e.to_string())))?;

    tracing::info!(%kind, task_id = %task_id, "Analysis job submitted");
    Ok(task_id)
}
