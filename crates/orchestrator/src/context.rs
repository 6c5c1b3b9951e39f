//! Per-session context shared by the tracks of one run session.
//!
//! A session is active while its cancellation token is untouched and its
//! generation is still the orchestrator's current one. Every state change
//! that is visible outside a track (events, the completion latch) is
//! gated on [`SessionContext::is_active`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::events::SessionEvent;

#[derive(Debug, Clone)]
pub struct SessionContext {
    id: Uuid,
    generation: u64,
    current_generation: Arc<AtomicU64>,
    cancel: CancellationToken,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionContext {
    pub fn new(
        generation: u64,
        current_generation: Arc<AtomicU64>,
        cancel: CancellationToken,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            generation,
            current_generation,
            cancel,
            events,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Resolves once the session is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
            && self.current_generation.load(Ordering::Acquire) == self.generation
    }

    /// Publish an event if the session is still active.
    ///
    /// Returns `false` when the event was dropped because the session is
    /// no longer active. Having no subscribers is not an error.
    pub fn emit(&self, event: SessionEvent) -> bool {
        if !self.is_active() {
            tracing::debug!(session_id = %self.id, ?event, "Dropping event of inactive session");
            return false;
        }
        let _ = self.events.send(event);
        true
    }
}
