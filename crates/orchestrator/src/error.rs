//! Error types for submission and polling.

use malviz_analysis::AnalysisApiError;
use malviz_core::job::JobKind;
use malviz_core::types::TaskId;

/// Why a task-creation request did not yield a task identifier.
///
/// Cloneable so it can travel on the session event channel and inside
/// [`crate::outcome::RunOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionFailure {
    /// The backend answered with a non-success status.
    #[error("backend rejected the submission ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The backend answered 2xx but without a usable task identifier.
    #[error("unexpected creation response: {0}")]
    Malformed(String),

    /// The request never got an answer.
    #[error("request failed: {0}")]
    Transport(String),
}

impl From<AnalysisApiError> for SubmissionFailure {
    fn from(err: AnalysisApiError) -> Self {
        match err {
            AnalysisApiError::ApiError { status, body } => Self::Rejected { status, body },
            AnalysisApiError::MalformedResponse(msg) => Self::Malformed(msg),
            AnalysisApiError::Request(e) => Self::Transport(e.to_string()),
            e @ AnalysisApiError::InvalidUrl { .. } => Self::Transport(e.to_string()),
        }
    }
}

/// A failed submission of one job kind. Fatal for the whole session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} submission failed: {failure}")]
pub struct SubmissionError {
    pub kind: JobKind,
    pub failure: SubmissionFailure,
}

impl SubmissionError {
    pub fn new(kind: JobKind, failure: impl Into<SubmissionFailure>) -> Self {
        Self {
            kind,
            failure: failure.into(),
        }
    }
}

/// A status query that failed. Logged and retried; never changes job
/// status.
#[derive(Debug, thiserror::Error)]
#[error("status query for task {task_id} failed: {source}")]
pub struct TransientPollError {
    pub task_id: TaskId,
    pub source: AnalysisApiError,
}

/// Why a session ended without both identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunSessionFailure {
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// The session was abandoned or superseded by a newer one.
    #[error("session cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_failures() {
        let rejected: SubmissionFailure = AnalysisApiError::ApiError {
            status: 500,
            body: "boom".into(),
        }
        .into();
        assert_eq!(
            rejected,
            SubmissionFailure::Rejected {
                status: 500,
                body: "boom".into()
            }
        );

        let malformed: SubmissionFailure =
            AnalysisApiError::MalformedResponse("no task_ids".into()).into();
        assert_eq!(malformed, SubmissionFailure::Malformed("no task_ids".into()));
    }

    #[test]
    fn submission_error_display_names_kind() {
        let err = SubmissionError::new(
            JobKind::Static,
            SubmissionFailure::Transport("connection refused".into()),
        );
        assert_eq!(
            err.to_string(),
            "static submission failed: request failed: connection refused"
        );
        let failure: RunSessionFailure = err.into();
        assert!(failure.to_string().starts_with("static submission failed"));
    }
}
