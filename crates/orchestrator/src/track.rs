//! One job track: submit, then poll and sample progress until complete.
//!
//! A track task owns its [`Job`]. The only state it shares with the rest
//! of the session is the [`CompletionLatch`] and the event channel, and
//! both are touched only while the session is active.

use std::sync::Arc;
use std::time::Duration;

use malviz_analysis::AnalysisBackend;
use malviz_core::artifact::Artifact;
use malviz_core::job::Job;
use malviz_core::progress::PROGRESS_COMPLETE;
use malviz_core::track::TrackConfig;
use tokio::time::Instant;

use crate::context::SessionContext;
use crate::events::SessionEvent;
use crate::latch::CompletionLatch;
use crate::poller::{PollOutcome, StatusPoller};
use crate::schedule::RepeatingTimer;
use crate::submitter::submit_job;

/// Everything a track needs besides its session context.
#[derive(Clone)]
pub struct TrackRun {
    pub backend: Arc<dyn AnalysisBackend>,
    pub artifact: Arc<Artifact>,
    pub config: TrackConfig,
    pub sample_interval: Duration,
    pub latch: Arc<CompletionLatch>,
}

/// Drive one track to completion, failure, or cancellation.
///
/// Returns the job in the state it ended in.
pub async fn run_track(ctx: SessionContext, run: TrackRun) -> Job {
    let kind = run.config.kind;
    let mut job = Job::new(kind, run.config.expected_duration);

    let submitted = tokio::select! {
        biased;
        _ = ctx.cancelled() => None,
        result = submit_job(run.backend.as_ref(), &run.artifact, &mut job) => Some(result),
    };
    let Some(submitted) = submitted else {
        tracing::debug!(session_id = %ctx.id(), %kind, "Track cancelled during submission");
        return job;
    };
    if !ctx.is_active() {
        return job;
    }

    let task_id = match submitted {
        Ok(task_id) => task_id,
        Err(err) => {
            tracing::error!(session_id = %ctx.id(), %kind, error = %err, "Submission failed");
            if let Err(e) = job.mark_failed() {
                tracing::error!(session_id = %ctx.id(), %kind, error = %e, "Unexpected job state");
            }
            run.latch.fail(err);
            return job;
        }
    };

    ctx.emit(SessionEvent::Submitted {
        session_id: ctx.id(),
        kind,
        task_id: task_id.clone(),
    });
    if let Err(e) = job.mark_polling() {
        tracing::error!(session_id = %ctx.id(), %kind, error = %e, "Unexpected job state");
        return job;
    }

    let poller = StatusPoller::new(
        Arc::clone(&run.backend),
        &run.config,
        task_id.clone(),
        ctx.cancel_token().clone(),
    );
    let poll = poller.run();
    tokio::pin!(poll);

    let mut sampler = RepeatingTimer::fixed_rate(run.sample_interval, ctx.cancel_token().clone());
    let mut reported = job.progress_estimate();

    let outcome = loop {
        tokio::select! {
            outcome = &mut poll => break outcome,
            ticked = sampler.tick() => {
                if !ticked || !ctx.is_active() {
                    break PollOutcome::Cancelled;
                }
                if let Some(percent) = job.record_progress(Instant::now()) {
                    if percent > reported {
                        reported = percent;
                        ctx.emit(SessionEvent::Progress {
                            session_id: ctx.id(),
                            kind,
                            percent,
                        });
                    }
                }
            }
        }
    };

    match outcome {
        PollOutcome::Completed { .. } if ctx.is_active() => {
            if let Err(e) = job.mark_completed() {
                tracing::error!(session_id = %ctx.id(), %kind, error = %e, "Unexpected job state");
                return job;
            }
            if reported < PROGRESS_COMPLETE {
                ctx.emit(SessionEvent::Progress {
                    session_id: ctx.id(),
                    kind,
                    percent: PROGRESS_COMPLETE,
                });
            }
            ctx.emit(SessionEvent::Completed {
                session_id: ctx.id(),
                kind,
                task_id: task_id.clone(),
            });
            if let Err(e) = run.latch.complete(kind, task_id) {
                tracing::warn!(session_id = %ctx.id(), %kind, error = %e, "Completion not recorded");
            }
        }
        _ => {
            tracing::debug!(session_id = %ctx.id(), %kind, task_id = %task_id, "Track stopped before completion");
        }
    }

    job
}
