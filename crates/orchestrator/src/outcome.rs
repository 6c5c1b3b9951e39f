//! Terminal result of a run session.

use malviz_core::types::TaskId;

use crate::error::RunSessionFailure;

/// Exactly one of these is produced per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Both jobs reached a terminal-complete status.
    Success { static_id: TaskId, dynamic_id: TaskId },
    Failure(RunSessionFailure),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Failure(RunSessionFailure::Cancelled))
    }
}
