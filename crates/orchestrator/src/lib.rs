//! Submission-and-polling orchestrator for paired malware analysis jobs.
//!
//! One [`session::Orchestrator`] drives a static and a dynamic analysis
//! track for the same artifact:
//!
//! - [`submitter`]: create the backend task for one kind.
//! - [`poller`]: poll a task's status on a fixed cadence until it is
//!   complete, absorbing transient failures.
//! - [`track`]: one kind from submission to completion, with progress
//!   sampling.
//! - [`latch`]: two write-once completion slots joined into one result.
//! - [`session`]: run both tracks and produce exactly one
//!   [`outcome::RunOutcome`] per session.
//! - [`handoff`]: turn an outcome into navigation or an alert.
//!
//! Progress and lifecycle updates are published as [`events::SessionEvent`]s
//! on a broadcast channel.

pub mod context;
pub mod error;
pub mod events;
pub mod handoff;
pub mod latch;
pub mod outcome;
pub mod poller;
pub mod schedule;
pub mod session;
pub mod submitter;
pub mod track;

#[cfg(test)]
pub(crate) mod testing;

pub use outcome::RunOutcome;
pub use session::{Orchestrator, OrchestratorConfig, SessionHandle};
