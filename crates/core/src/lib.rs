//! Domain types and pure logic for the malviz submission orchestrator.
//!
//! Nothing in this crate performs I/O. The HTTP client lives in
//! `malviz-analysis` and the concurrent job tracks in
//! `malviz-orchestrator`; both build on the types defined here.

pub mod artifact;
pub mod error;
pub mod handoff;
pub mod hashing;
pub mod job;
pub mod progress;
pub mod status;
pub mod track;
pub mod types;
