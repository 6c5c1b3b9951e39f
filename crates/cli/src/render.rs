//! Text progress bars for a running session.
//!
//! [`ProgressBoard`] folds [`SessionEvent`]s into one bar per job kind.
//! The binary redraws [`ProgressBoard::line`] on stderr after every
//! change.

use malviz_core::job::JobKind;
use malviz_core::progress::PROGRESS_COMPLETE;
use malviz_core::types::{Percent, TaskId};
use malviz_orchestrator::events::SessionEvent;

const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Default, PartialEq)]
struct TrackView {
    task_id: Option<TaskId>,
    percent: Percent,
    done: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressBoard {
    tracks: [TrackView; 2],
}

impl ProgressBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the board. Returns whether anything visible
    /// changed.
    pub fn apply(&mut self, event: &SessionEvent) -> bool {
        let Some(kind) = event.kind() else {
            return false;
        };
        let view = &mut self.tracks[kind.index()];
        let before = view.clone();
        match event {
            SessionEvent::Submitted { task_id, .. } => view.task_id = Some(task_id.clone()),
            SessionEvent::Progress { percent, .. } => view.percent = view.percent.max(*percent),
            SessionEvent::Completed { task_id, .. } => {
                view.task_id = Some(task_id.clone());
                view.percent = PROGRESS_COMPLETE;
                view.done = true;
            }
            SessionEvent::HandOff { .. } | SessionEvent::Failed { .. } => {}
        }
        *view != before
    }

    pub fn percent(&self, kind: JobKind) -> Percent {
        self.tracks[kind.index()].percent
    }

    pub fn is_done(&self, kind: JobKind) -> bool {
        self.tracks[kind.index()].done
    }

    /// Both bars on one line.
    pub fn line(&self) -> String {
        JobKind::ALL
            .iter()
            .map(|kind| self.bar(*kind))
            .collect::<Vec<_>>()
            .join("  ")
    }

    /// One bar, e.g. `Static Analysis [#####---------------]  25%`, or
    /// `Done` in place of the percentage once the job completed.
    pub fn bar(&self, kind: JobKind) -> String {
        let view = &self.tracks[kind.index()];
        let filled = ((view.percent / PROGRESS_COMPLETE) * BAR_WIDTH as f64).floor() as usize;
        let filled = filled.min(BAR_WIDTH);
        let status = if view.done {
            "Done".to_string()
        } else {
            format!("{:>3}%", view.percent.floor() as u32)
        };
        format!(
            "{} [{}{}] {}",
            kind.label(),
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled),
            status
        )
    }
}
