//! Turning a session outcome into what the user sees next.

use malviz_core::handoff::HandOffTarget;

use crate::error::RunSessionFailure;
use crate::outcome::RunOutcome;

/// Message shown when a session fails.
pub const FAILURE_ALERT: &str = "Failed to upload or analyze file(s).";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandOff {
    /// Open the reporting view for both tasks.
    Navigate(HandOffTarget),
    /// Tell the user the submission failed and stay put.
    Alert(String),
    /// Nothing to do; the session was abandoned.
    Stay,
}

/// Resolve an outcome. Navigation happens only with both identifiers.
pub fn resolve(outcome: &RunOutcome, result_path: &str) -> HandOff {
    match outcome {
        RunOutcome::Success {
            static_id,
            dynamic_id,
        } => HandOff::Navigate(HandOffTarget::new(
            result_path,
            static_id.clone(),
            Some(dynamic_id.clone()),
        )),
        RunOutcome::Failure(RunSessionFailure::Submission(_)) => HandOff::Alert(FAILURE_ALERT.to_string()),
        RunOutcome::Failure(RunSessionFailure::Cancelled) => HandOff::Stay,
    }
}
