//! Job state for one analysis track (static or dynamic).
//!
//! A [`Job`] is owned by exactly one track task. Status only moves
//! forward and the progress estimate never
//! decreases within a run. Once a job is `Completed` its progress is
//! pinned at 100; once it is `Failed` the last estimate is frozen.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::CoreError;
use crate::progress::{estimate_progress, PROGRESS_COMPLETE};
use crate::types::{Percent, TaskId};

// ---------------------------------------------------------------------------
// JobKind
// ---------------------------------------------------------------------------

/// Which backend analysis pipeline a job runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Static,
    Dynamic,
}

impl JobKind {
    /// Both kinds, in hand-off parameter order.
    pub const ALL: [JobKind; 2] = [JobKind::Static, JobKind::Dynamic];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }

    /// Human-readable label for progress displays.
    pub fn label(self) -> &'static str {
        match self {
            Self::Static => "Static Analysis",
            Self::Dynamic => "Dynamic Analysis",
        }
    }

    /// Slot index used by fixed-size per-kind arrays.
    pub fn index(self) -> usize {
        match self {
            Self::Static => 0,
            Self::Dynamic => 1,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a single job.
///
/// Transient poll failures never change the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Unsubmitted,
    Submitted,
    Polling,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the progress estimator should be sampling in this state.
    pub fn is_sampling(self) -> bool {
        matches!(self, Self::Submitted | Self::Polling)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unsubmitted => "unsubmitted",
            Self::Submitted => "submitted",
            Self::Polling => "polling",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One backend analysis task tracked from submission to terminal status.
#[derive(Debug, Clone)]
pub struct Job {
    kind: JobKind,
    identifier: Option<TaskId>,
    status: JobStatus,
    progress_estimate: Percent,
    started_at: Option<Instant>,
    expected_duration: Duration,
}

impl Job {
    pub fn new(kind: JobKind, expected_duration: Duration) -> Self {
        Self {
            kind,
            identifier: None,
            status: JobStatus::Unsubmitted,
            progress_estimate: 0.0,
            started_at: None,
            expected_duration,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress_estimate(&self) -> Percent {
        self.progress_estimate
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn expected_duration(&self) -> Duration {
        self.expected_duration
    }

    /// Record a successful submission. `started_at` is the instant the
    /// creation request was issued and is the sole input to progress
    /// estimation.
    pub fn mark_submitted(&mut self, identifier: TaskId, started_at: Instant) -> Result<(), CoreError> {
        self.transition(JobStatus::Unsubmitted, JobStatus::Submitted)?;
        self.identifier = Some(identifier);
        self.started_at = Some(started_at);
        Ok(())
    }

    pub fn mark_polling(&mut self) -> Result<(), CoreError> {
        self.transition(JobStatus::Submitted, JobStatus::Polling)
    }

    /// Mark the job completed and pin its progress at 100.
    pub fn mark_completed(&mut self) -> Result<(), CoreError> {
        if !self.status.is_sampling() {
            return Err(self.invalid(JobStatus::Completed));
        }
        self.status = JobStatus::Completed;
        self.progress_estimate = PROGRESS_COMPLETE;
        Ok(())
    }

    /// Mark the job failed. The last progress estimate is retained.
    pub fn mark_failed(&mut self) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(self.invalid(JobStatus::Failed));
        }
        self.status = JobStatus::Failed;
        Ok(())
    }

    /// Take a progress sample at `now`.
    ///
    /// Returns the (non-decreasing) estimate, or `None` when the job is not
    /// in a sampling state and the estimate was left untouched.
    pub fn record_progress(&mut self, now: Instant) -> Option<Percent> {
        if !self.status.is_sampling() {
            return None;
        }
        let started_at = self.started_at?;
        let elapsed = now.saturating_duration_since(started_at);
        let estimate = estimate_progress(elapsed, self.expected_duration);
        if estimate > self.progress_estimate {
            self.progress_estimate = estimate;
        }
        Some(self.progress_estimate)
    }

    fn transition(&mut self, from: JobStatus, to: JobStatus) -> Result<(), CoreError> {
        if self.status != from {
            return Err(self.invalid(to));
        }
        self.status = to;
        Ok(())
    }

    fn invalid(&self, to: JobStatus) -> CoreError {
        CoreError::InvalidTransition {
            kind: self.kind,
            from: self.status,
            to,
        }
    }
}
