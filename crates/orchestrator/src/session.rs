//! Run sessions: both tracks for one artifact, from submission to
//! hand-off.
//!
//! [`Orchestrator::start_session`] spawns a driver task that runs the
//! static and dynamic tracks concurrently and waits on their
//! [`CompletionLatch`]. The first submission failure ends the whole
//! session and stops the other track; success requires both identifiers.
//! Starting a new session supersedes the previous one, and dropping a
//! [`SessionHandle`] abandons its session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use malviz_analysis::AnalysisBackend;
use malviz_core::artifact::Artifact;
use malviz_core::error::CoreError;
use malviz_core::handoff::DEFAULT_RESULT_PATH;
use malviz_core::job::JobKind;
use malviz_core::track::{TrackConfig, PROGRESS_SAMPLE_INTERVAL};
use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use crate::context::SessionContext;
use crate::error::RunSessionFailure;
use crate::events::{SessionEvent, EVENT_CHANNEL_CAPACITY};
use crate::handoff::{resolve, HandOff};
use crate::latch::{CompletionLatch, Rendezvous};
use crate::outcome::RunOutcome;
use crate::track::{run_track, TrackRun};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub static_track: TrackConfig,
    pub dynamic_track: TrackConfig,
    pub progress_sample_interval: Duration,
    /// Path of the reporting view used for hand-off targets.
    pub result_path: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            static_track: TrackConfig::defaults_for(JobKind::Static),
            dynamic_track: TrackConfig::defaults_for(JobKind::Dynamic),
            progress_sample_interval: PROGRESS_SAMPLE_INTERVAL,
            result_path: DEFAULT_RESULT_PATH.to_string(),
        }
    }
}

impl OrchestratorConfig {
    pub fn track(&self, kind: JobKind) -> &TrackConfig {
        match kind {
            JobKind::Static => &self.static_track,
            JobKind::Dynamic => &self.dynamic_track,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        for kind in JobKind::ALL {
            let track = self.track(kind);
            if track.kind != kind {
                return Err(CoreError::Validation(format!(
                    "{kind} track is configured as {}",
                    track.kind
                )));
            }
            track.validate()?;
        }
        if self.progress_sample_interval.is_zero() {
            return Err(CoreError::Validation(
                "progress sample interval must be greater than zero".into(),
            ));
        }
        if self.result_path.is_empty() {
            return Err(CoreError::Validation("result path must not be empty".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Starts and supervises run sessions against one analysis backend.
///
/// At most one session is active at a time. Session events from every
/// session go to the same broadcast channel; see [`Orchestrator::subscribe`].
pub struct Orchestrator {
    backend: Arc<dyn AnalysisBackend>,
    config: Arc<OrchestratorConfig>,
    event_tx: broadcast::Sender<SessionEvent>,
    /// Generation of the newest session. Older sessions compare unequal
    /// and go quiet.
    generation: Arc<AtomicU64>,
    active: Mutex<Option<CancellationToken>>,
    /// Parent of every session token; cancelled on shutdown.
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn AnalysisBackend>, config: OrchestratorConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            backend,
            config: Arc::new(config),
            event_tx,
            generation: Arc::new(AtomicU64::new(0)),
            active: Mutex::new(None),
            cancel: CancellationToken::new(),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Submit `artifact` to both pipelines and track it to a single
    /// outcome. Any session still running is cancelled first.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_session(&self, artifact: Artifact) -> SessionHandle {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let cancel = self.cancel.child_token();
        if let Some(previous) = self.lock_active().replace(cancel.clone()) {
            previous.cancel();
        }

        let ctx = SessionContext::new(
            generation,
            Arc::clone(&self.generation),
            cancel.clone(),
            self.event_tx.clone(),
        );
        let id = ctx.id();

        tracing::info!(
            session_id = %id,
            generation,
            files = ?artifact.file_names(),
            bytes = artifact.total_bytes(),
            "Starting analysis session",
        );

        let driver = tokio::spawn(drive_session(
            ctx,
            Arc::clone(&self.backend),
            Arc::clone(&self.config),
            Arc::new(artifact),
        ));

        SessionHandle {
            id,
            cancel: cancel.clone(),
            driver,
            _abandon_on_drop: cancel.drop_guard(),
        }
    }

    /// Cancel the active session, if any.
    pub fn cancel_active(&self) {
        if let Some(active) = self.lock_active().take() {
            active.cancel();
        }
    }

    /// Cancel every session and refuse to run further ones.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down orchestrator");
        self.cancel.cancel();
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Handle to a running session. Dropping it cancels the session.
pub struct SessionHandle {
    id: Uuid,
    cancel: CancellationToken,
    driver: JoinHandle<RunOutcome>,
    _abandon_on_drop: DropGuard,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Abandon the session. Its outcome becomes
    /// `Failure(RunSessionFailure::Cancelled)`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the session's outcome.
    ///
    /// Dropping this future before it resolves abandons the session.
    pub async fn outcome(self) -> RunOutcome {
        let Self {
            id,
            driver,
            _abandon_on_drop,
            ..
        } = self;
        match driver.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(session_id = %id, error = %e, "Session driver task failed");
                RunOutcome::Failure(RunSessionFailure::Cancelled)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

async fn drive_session(
    ctx: SessionContext,
    backend: Arc<dyn AnalysisBackend>,
    config: Arc<OrchestratorConfig>,
    artifact: Arc<Artifact>,
) -> RunOutcome {
    let latch = Arc::new(CompletionLatch::new());
    let mut tracks = JoinSet::new();
    for kind in JobKind::ALL {
        let run = TrackRun {
            backend: Arc::clone(&backend),
            artifact: Arc::clone(&artifact),
            config: *config.track(kind),
            sample_interval: config.progress_sample_interval,
            latch: Arc::clone(&latch),
        };
        tracks.spawn(run_track(ctx.clone(), run));
    }

    let mut outcome = tokio::select! {
        biased;
        _ = ctx.cancelled() => RunOutcome::Failure(RunSessionFailure::Cancelled),
        rendezvous = latch.wait() => match rendezvous {
            Rendezvous::Both { static_id, dynamic_id } => RunOutcome::Success { static_id, dynamic_id },
            Rendezvous::Failed(err) => RunOutcome::Failure(err.into()),
        },
    };
    if !ctx.is_active() {
        outcome = RunOutcome::Failure(RunSessionFailure::Cancelled);
    }

    match (&outcome, resolve(&outcome, &config.result_path)) {
        (_, HandOff::Navigate(target)) => {
            tracing::info!(session_id = %ctx.id(), target = %target, "Analysis session complete");
            ctx.emit(SessionEvent::HandOff {
                session_id: ctx.id(),
                target,
            });
        }
        (RunOutcome::Failure(err), HandOff::Alert(_)) => {
            tracing::warn!(session_id = %ctx.id(), error = %err, "Analysis session failed");
            ctx.emit(SessionEvent::Failed {
                session_id: ctx.id(),
                reason: err.to_string(),
            });
        }
        _ => {
            tracing::info!(session_id = %ctx.id(), "Analysis session cancelled");
        }
    }

    // Stop whichever track is still running.
    ctx.cancel_token().cancel();
    while let Some(joined) = tracks.join_next().await {
        match joined {
            Ok(job) => tracing::debug!(
                session_id = %ctx.id(),
                kind = %job.kind(),
                status = %job.status(),
                progress = job.progress_estimate(),
                "Track finished",
            ),
            Err(e) => tracing::error!(session_id = %ctx.id(), error = %e, "Track task failed"),
        }
    }

    outcome
}
