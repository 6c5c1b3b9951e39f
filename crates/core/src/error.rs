use crate::job::{JobKind, JobStatus};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid {kind} job transition: {from} -> {to}")]
    InvalidTransition {
        kind: JobKind,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Malformed hand-off target: {0}")]
    MalformedTarget(String),
}
