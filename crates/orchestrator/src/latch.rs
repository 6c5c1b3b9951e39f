//! Rendezvous of the static and dynamic tracks.
//!
//! [`CompletionLatch`] holds one write-once identifier slot per job kind
//! and a first-failure slot. [`CompletionLatch::wait`] resolves exactly
//! once: with both identifiers after both slots are filled, or with the
//! first submission failure. Arrival order does not matter.

use malviz_core::job::JobKind;
use malviz_core::types::TaskId;
use tokio::sync::watch;

use crate::error::SubmissionError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LatchError {
    #[error("{0} completion already recorded")]
    AlreadyCompleted(JobKind),
    #[error("latch already settled by a failure")]
    Failed,
}

/// What [`CompletionLatch::wait`] resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendezvous {
    Both { static_id: TaskId, dynamic_id: TaskId },
    Failed(SubmissionError),
}

#[derive(Debug, Clone, Default)]
struct LatchState {
    completed: [Option<TaskId>; 2],
    failure: Option<SubmissionError>,
}

impl LatchState {
    fn settled(&self) -> Option<Rendezvous> {
        if let Some(err) = &self.failure {
            return Some(Rendezvous::Failed(err.clone()));
        }
        match &self.completed {
            [Some(static_id), Some(dynamic_id)] => Some(Rendezvous::Both {
                static_id: static_id.clone(),
                dynamic_id: dynamic_id.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct CompletionLatch {
    state: watch::Sender<LatchState>,
}

impl Default for CompletionLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionLatch {
    pub fn new() -> Self {
        let (state, _) = watch::channel(LatchState::default());
        Self { state }
    }

    /// Record that the `kind` job completed with `task_id`.
    pub fn complete(&self, kind: JobKind, task_id: TaskId) -> Result<(), LatchError> {
        let mut result = Ok(());
        self.state.send_if_modified(|state| {
            if state.failure.is_some() {
                result = Err(LatchError::Failed);
                return false;
            }
            let slot = &mut state.completed[kind.index()];
            if slot.is_some() {
                result = Err(LatchError::AlreadyCompleted(kind));
                return false;
            }
            *slot = Some(task_id);
            true
        });
        result
    }

    /// Record a submission failure. Only the first failure is kept, and a
    /// latch that already has both identifiers ignores it.
    ///
    /// Returns whether this call settled the latch.
    pub fn fail(&self, err: SubmissionError) -> bool {
        self.state.send_if_modified(|state| {
            if state.settled().is_some() {
                return false;
            }
            state.failure = Some(err);
            true
        })
    }

    /// The settled result, if any, without waiting.
    pub fn peek(&self) -> Option<Rendezvous> {
        self.state.borrow().settled()
    }

    /// Wait until the latch settles.
    pub async fn wait(&self) -> Rendezvous {
        let mut rx = self.state.subscribe();
        loop {
            if let Some(settled) = rx.borrow_and_update().settled() {
                return settled;
            }
            // The sender lives in `self`, so the channel cannot close here.
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use futures::FutureExt;

    use super::*;
    use crate::error::SubmissionFailure;

    fn rejected(kind: JobKind) -> SubmissionError {
        SubmissionError::new(
            kind,
            SubmissionFailure::Rejected {
                status: 500,
                body: "boom".into(),
            },
        )
    }

    fn both(s: &str, d: &str) -> Rendezvous {
        Rendezvous::Both {
            static_id: s.into(),
            dynamic_id: d.into(),
        }
    }

    #[tokio::test]
    async fn one_completion_does_not_settle() {
        let latch = CompletionLatch::new();
        latch.complete(JobKind::Static, "7".into()).unwrap();
        assert!(latch.peek().is_none());
        assert!(latch.wait().now_or_never().is_none());
    }

    #[tokio::test]
    async fn completion_order_is_irrelevant() {
        let forward = CompletionLatch::new();
        forward.complete(JobKind::Static, "7".into()).unwrap();
        forward.complete(JobKind::Dynamic, "8".into()).unwrap();

        let reverse = CompletionLatch::new();
        reverse.complete(JobKind::Dynamic, "8".into()).unwrap();
        reverse.complete(JobKind::Static, "7".into()).unwrap();

        assert_eq!(forward.wait().await, both("7", "8"));
        assert_eq!(reverse.wait().await, both("7", "8"));
    }

    #[tokio::test]
    async fn waiter_wakes_on_second_completion() {
        let latch = Arc::new(CompletionLatch::new());
        let waiter = tokio::spawn({
            let latch = Arc::clone(&latch);
            async move { latch.wait().await }
        });

        latch.complete(JobKind::Dynamic, "8".into()).unwrap();
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        latch.complete(JobKind::Static, "7".into()).unwrap();
        assert_eq!(waiter.await.unwrap(), both("7", "8"));
    }

    #[test]
    fn slots_are_write_once() {
        let latch = CompletionLatch::new();
        latch.complete(JobKind::Static, "7".into()).unwrap();
        assert_eq!(
            latch.complete(JobKind::Static, "9".into()),
            Err(LatchError::AlreadyCompleted(JobKind::Static))
        );
        latch.complete(JobKind::Dynamic, "8".into()).unwrap();
        assert_eq!(latch.peek(), Some(both("7", "8")));
    }

    #[test]
    fn first_failure_wins() {
        let latch = CompletionLatch::new();
        assert!(latch.fail(rejected(JobKind::Static)));
        assert!(!latch.fail(rejected(JobKind::Dynamic)));
        assert_matches!(latch.peek(), Some(Rendezvous::Failed(err)) if err.kind == JobKind::Static);
    }

    #[test]
    fn failure_blocks_later_completion() {
        let latch = CompletionLatch::new();
        latch.complete(JobKind::Dynamic, "8".into()).unwrap();
        latch.fail(rejected(JobKind::Static));
        assert_eq!(latch.complete(JobKind::Static, "7".into()), Err(LatchError::Failed));
        assert_matches!(latch.peek(), Some(Rendezvous::Failed(_)));
    }

    #[test]
    fn failure_after_success_is_ignored() {
        let latch = CompletionLatch::new();
        latch.complete(JobKind::Static, "7".into()).unwrap();
        latch.complete(JobKind::Dynamic, "8".into()).unwrap();
        assert!(!latch.fail(rejected(JobKind::Dynamic)));
        assert_eq!(latch.peek(), Some(both("7", "8")));
    }
}
