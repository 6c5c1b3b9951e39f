//! Per-kind track parameters: poll cadence, expected duration, and the
//! terminal predicate.
//!
//! The defaults reflect the backend's observed behaviour: static analysis
//! finishes in roughly half a minute and is polled every second, dynamic
//! analysis takes three to five minutes and is polled every two seconds.
//! These are heuristics, not guarantees.

use std::time::Duration;

use crate::error::CoreError;
use crate::job::JobKind;
use crate::status::{is_terminal_complete, TerminalPredicate};

pub const STATIC_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DYNAMIC_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub const STATIC_EXPECTED_DURATION: Duration = Duration::from_secs(30);
pub const DYNAMIC_EXPECTED_DURATION: Duration = Duration::from_secs(240);

/// How often the progress estimate is resampled while a job is running.
pub const PROGRESS_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Configuration for one job track.
#[derive(Debug, Clone, Copy)]
pub struct TrackConfig {
    pub kind: JobKind,
    pub poll_interval: Duration,
    pub expected_duration: Duration,
    pub terminal: TerminalPredicate,
}

impl TrackConfig {
    /// Default parameters for a job kind.
    pub fn defaults_for(kind: JobKind) -> Self {
        let (poll_interval, expected_duration) = match kind {
            JobKind::Static => (STATIC_POLL_INTERVAL, STATIC_EXPECTED_DURATION),
            JobKind::Dynamic => (DYNAMIC_POLL_INTERVAL, DYNAMIC_EXPECTED_DURATION),
        };
        Self {
            kind,
            poll_interval,
            expected_duration,
            terminal: is_terminal_complete,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_expected_duration(mut self, expected_duration: Duration) -> Self {
        self.expected_duration = expected_duration;
        self
    }

    /// Reject zero intervals (a busy poll loop) and zero expected durations.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.poll_interval.is_zero() {
            return Err(CoreError::Validation(format!(
                "{} poll interval must be greater than zero",
                self.kind
            )));
        }
        if self.expected_duration.is_zero() {
            return Err(CoreError::Validation(format!(
                "{} expected duration must be greater than zero",
                self.kind
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusResponse;

    #[test]
    fn static_defaults() {
        let cfg = TrackConfig::defaults_for(JobKind::Static);
        assert_eq!(cfg.poll_interval, Duration::from_secs(1));
        assert_eq!(cfg.expected_duration, Duration::from_secs(30));
    }

    #[test]
    fn dynamic_defaults() {
        let cfg = TrackConfig::defaults_for(JobKind::Dynamic);
        assert_eq!(cfg.poll_interval, Duration::from_secs(2));
        assert_eq!(cfg.expected_duration, Duration::from_secs(240));
    }

    #[test]
    fn default_predicate_is_shared() {
        let cfg = TrackConfig::defaults_for(JobKind::Dynamic);
        let done = StatusResponse {
            status: None,
            data: Some(serde_json::json!("reported")),
        };
        assert!((cfg.terminal)(&done));
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let cfg = TrackConfig::defaults_for(JobKind::Static).with_poll_interval(Duration::ZERO);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_expected_duration_rejected() {
        let cfg = TrackConfig::defaults_for(JobKind::Dynamic).with_expected_duration(Duration::ZERO);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("dynamic"));
    }

    #[test]
    fn defaults_validate() {
        for kind in JobKind::ALL {
            assert!(TrackConfig::defaults_for(kind).validate().is_ok());
        }
    }
}
