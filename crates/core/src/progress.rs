//! Time-based progress estimation.
//!
//! The backend exposes no progress signal, so the estimate is derived
//! purely from wall-clock time since submission against a per-kind
//! expected duration. It is cosmetic and must never decide completion.

use std::time::Duration;

use crate::types::Percent;

/// Progress value of a completed job.
pub const PROGRESS_COMPLETE: Percent = 100.0;

/// Estimate progress as `min(100, 100 * elapsed / expected)`.
///
/// A zero `expected` duration is treated as already complete.
pub fn estimate_progress(elapsed: Duration, expected: Duration) -> Percent {
    if expected.is_zero() {
        return PROGRESS_COMPLETE;
    }
    let ratio = elapsed.as_secs_f64() / expected.as_secs_f64();
    (ratio * PROGRESS_COMPLETE).clamp(0.0, PROGRESS_COMPLETE)
}
