//! Client configuration loaded from environment variables.

use std::time::Duration;

use malviz_core::error::CoreError;
use malviz_core::handoff::DEFAULT_RESULT_PATH;
use malviz_core::job::JobKind;
use malviz_core::track::TrackConfig;
use malviz_orchestrator::OrchestratorConfig;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/apiv2/tasks";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Everything the CLI needs to talk to one backend deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub report_api_url: String,
    pub result_path: String,
    pub request_timeout: Duration,
    pub static_poll_interval: Duration,
    pub dynamic_poll_interval: Duration,
    pub static_expected: Duration,
    pub dynamic_expected: Duration,
    pub progress_sample_interval: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                             |
    /// |--------------------------------|-------------------------------------|
    /// | `MALVIZ_API_URL`               | `http://127.0.0.1:8000/apiv2/tasks` |
    /// | `MALVIZ_REPORT_API_URL`        | value of `MALVIZ_API_URL`           |
    /// | `MALVIZ_RESULT_PATH`           | `/result`                           |
    /// | `MALVIZ_REQUEST_TIMEOUT_SECS`  | `30`                                |
    /// | `MALVIZ_STATIC_POLL_MS`        | `1000`                              |
    /// | `MALVIZ_DYNAMIC_POLL_MS`       | `2000`                              |
    /// | `MALVIZ_STATIC_EXPECTED_SECS`  | `30`                                |
    /// | `MALVIZ_DYNAMIC_EXPECTED_SECS` | `240`                               |
    /// | `MALVIZ_PROGRESS_SAMPLE_MS`    | `500`                               |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("MALVIZ_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let report_api_url = lookup("MALVIZ_REPORT_API_URL").unwrap_or_else(|| api_url.clone());
        let result_path =
            lookup("MALVIZ_RESULT_PATH").unwrap_or_else(|| DEFAULT_RESULT_PATH.into());

        let config = Self {
            request_timeout: Duration::from_secs(number(&lookup, "MALVIZ_REQUEST_TIMEOUT_SECS", 30)?),
            static_poll_interval: Duration::from_millis(number(&lookup, "MALVIZ_STATIC_POLL_MS", 1000)?),
            dynamic_poll_interval: Duration::from_millis(number(&lookup, "MALVIZ_DYNAMIC_POLL_MS", 2000)?),
            static_expected: Duration::from_secs(number(&lookup, "MALVIZ_STATIC_EXPECTED_SECS", 30)?),
            dynamic_expected: Duration::from_secs(number(&lookup, "MALVIZ_DYNAMIC_EXPECTED_SECS", 240)?),
            progress_sample_interval: Duration::from_millis(number(
                &lookup,
                "MALVIZ_PROGRESS_SAMPLE_MS",
                500,
            )?),
            api_url,
            report_api_url,
            result_path,
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the backend URLs, e.g. from command-line flags.
    pub fn with_urls(mut self, api_url: Option<String>, report_api_url: Option<String>) -> Result<Self, ConfigError> {
        if let Some(api_url) = api_url {
            if report_api_url.is_none() && self.report_api_url == self.api_url {
                self.report_api_url = api_url.clone();
            }
            self.api_url = api_url;
        }
        if let Some(report_api_url) = report_api_url {
            self.report_api_url = report_api_url;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            static_track: TrackConfig::defaults_for(JobKind::Static)
                .with_poll_interval(self.static_poll_interval)
                .with_expected_duration(self.static_expected),
            dynamic_track: TrackConfig::defaults_for(JobKind::Dynamic)
                .with_poll_interval(self.dynamic_poll_interval)
                .with_expected_duration(self.dynamic_expected),
            progress_sample_interval: self.progress_sample_interval,
            result_path: self.result_path.clone(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_url("MALVIZ_API_URL", &self.api_url)?;
        check_url("MALVIZ_REPORT_API_URL", &self.report_api_url)?;
        if self.request_timeout.is_zero() {
            return Err(invalid("MALVIZ_REQUEST_TIMEOUT_SECS", "0", "must be greater than zero"));
        }
        self.orchestrator_config().validate()?;
        Ok(())
    }
}

fn number(lookup: &impl Fn(&str) -> Option<String>, var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| invalid(var, &raw, &e.to_string())),
    }
}

fn check_url(var: &'static str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| invalid(var, value, &e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(var, value, &format!("unsupported scheme {other}"))),
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
