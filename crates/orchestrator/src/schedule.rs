//! Cancellable repeating timers.
//!
//! Both the status poller and the progress sampler wake up periodically
//! until their session ends. A [`RepeatingTimer`] owns the cadence and a
//! session's cancellation token, so waiting for the next tick and
//! noticing cancellation are the same operation.

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
enum Cadence {
    /// Ticks on a fixed grid measured from creation.
    Rate(Interval),
    /// Ticks a fixed delay after each call to `tick`.
    Delay(Duration),
}

#[derive(Debug)]
pub struct RepeatingTimer {
    cadence: Cadence,
    cancel: CancellationToken,
}

impl RepeatingTimer {
    /// Fixed-rate timer whose first tick is one `period` from now. Missed
    /// ticks are not replayed in a burst.
    pub fn fixed_rate(period: Duration, cancel: CancellationToken) -> Self {
        let start = tokio::time::Instant::now() + period;
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            cadence: Cadence::Rate(interval),
            cancel,
        }
    }

    /// Fixed-delay timer: every tick waits `delay` from the moment it is
    /// requested, so slow work between ticks pushes the schedule back.
    pub fn fixed_delay(delay: Duration, cancel: CancellationToken) -> Self {
        Self {
            cadence: Cadence::Delay(delay),
            cancel,
        }
    }

    /// Wait for the next tick.
    ///
    /// Returns `false` if the timer was cancelled before or while waiting.
    pub async fn tick(&mut self) -> bool {
        let Self { cadence, cancel } = self;
        if cancel.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = wait(cadence) => true,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

async fn wait(cadence: &mut Cadence) {
    match cadence {
        Cadence::Rate(interval) => {
            interval.tick().await;
        }
        Cadence::Delay(delay) => tokio::time::sleep(*delay).await,
    }
}
