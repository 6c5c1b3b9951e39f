//! Status polling for one submitted task.
//!
//! [`StatusPoller::run`] queries the task on a fixed delay until the
//! terminal predicate matches or the session is cancelled. A failed query
//! is logged and retried on the same cadence; it never changes the job's
//! status and never ends the track. There is no attempt limit.

use std::sync::Arc;
use std::time::Duration;

use malviz_analysis::AnalysisBackend;
use malviz_core::job::JobKind;
use malviz_core::status::{StatusResponse, TerminalPredicate};
use malviz_core::track::TrackConfig;
use malviz_core::types::TaskId;
use tokio_util::sync::CancellationToken;

use crate::error::TransientPollError;
use crate::schedule::RepeatingTimer;

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The terminal predicate matched. `attempts` counts every query,
    /// including failed ones.
    Completed { response: StatusResponse, attempts: u64 },
    Cancelled,
}

pub struct StatusPoller {
    backend: Arc<dyn AnalysisBackend>,
    kind: JobKind,
    task_id: TaskId,
    interval: Duration,
    terminal: TerminalPredicate,
    cancel: CancellationToken,
}

impl StatusPoller {
    pub fn new(
        backend: Arc<dyn AnalysisBackend>,
        track: &TrackConfig,
        task_id: TaskId,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            kind: track.kind,
            task_id,
            interval: track.poll_interval,
            terminal: track.terminal,
            cancel,
        }
    }

    /// Poll until complete or cancelled.
    ///
    /// The first query is issued immediately. Consuming `self` means a
    /// poller reports completion at most once.
    pub async fn run(self) -> PollOutcome {
        let mut timer = RepeatingTimer::fixed_delay(self.interval, self.cancel.clone());
        let mut attempts = 0u64;

        loop {
            attempts = attempts.saturating_add(1);
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return PollOutcome::Cancelled,
                result = self.poll_once() => result,
            };

            match result {
                Ok(response) if (self.terminal)(&response) => {
                    tracing::info!(
                        kind = %self.kind,
                        task_id = %self.task_id,
                        attempts,
                        "Analysis task complete",
                    );
                    return PollOutcome::Completed { response, attempts };
                }
                Ok(response) => {
                    tracing::debug!(
                        kind = %self.kind,
                        task_id = %self.task_id,
                        status = ?response.status,
                        data = ?response.data,
                        "Analysis task still running",
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        kind = %self.kind,
                        attempt = attempts,
                        error = %e,
                        "Status poll failed, retrying",
                    );
                }
            }

            if !timer.tick().await {
                return PollOutcome::Cancelled;
            }
        }
    }

    async fn poll_once(&self) -> Result<StatusResponse, TransientPollError> {
        self.backend
            .task_status(&self.task_id)
            .await
            .map_err(|source| TransientPollError {
                task_id: self.task_id.clone(),
                source,
            })
    }
}
