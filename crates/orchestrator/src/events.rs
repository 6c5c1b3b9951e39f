//! Session events published by the orchestrator.
//!
//! These are the observable state changes of a run session: what a
//! progress display or a log sink needs to follow both tracks. They are
//! produced only while their session is active, so a superseded session
//! never reaches subscribers.

use malviz_core::handoff::HandOffTarget;
use malviz_core::job::JobKind;
use malviz_core::types::{Percent, TaskId};
use serde::Serialize;
use uuid::Uuid;

/// Broadcast channel capacity. Progress is only published when the
/// estimate grows, so one session stays well below this.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The backend accepted a job and assigned it an identifier.
    Submitted {
        session_id: Uuid,
        kind: JobKind,
        task_id: TaskId,
    },

    /// The time-based estimate for a job grew.
    Progress {
        session_id: Uuid,
        kind: JobKind,
        /// Estimated completion percentage (0-100).
        percent: Percent,
    },

    /// A job reached a terminal-complete status.
    Completed {
        session_id: Uuid,
        kind: JobKind,
        task_id: TaskId,
    },

    /// Both jobs completed; the results view can be opened.
    HandOff { session_id: Uuid, target: HandOffTarget },

    /// The session failed. Emitted at most once per session.
    Failed { session_id: Uuid, reason: String },
}

impl SessionEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            Self::Submitted { session_id, .. }
            | Self::Progress { session_id, .. }
            | Self::Completed { session_id, .. }
            | Self::HandOff { session_id, .. }
            | Self::Failed { session_id, .. } => *session_id,
        }
    }

    /// The job kind this event is about, if it concerns a single track.
    pub fn kind(&self) -> Option<JobKind> {
        match self {
            Self::Submitted { kind, .. } | Self::Progress { kind, .. } | Self::Completed { kind, .. } => {
                Some(*kind)
            }
            Self::HandOff { .. } | Self::Failed { .. } => None,
        }
    }
}
