//! Task status responses and the terminal-state predicate.
//!
//! The backend reports completion with inconsistent vocabulary: the
//! `status` field may say `"completed"` or `"finished"`, while the `data`
//! field may say `"reported"` with no `status` at all. All call sites go
//! through [`is_terminal_complete`].

use serde::{Deserialize, Serialize};

/// `status` values that mean the task is finished.
pub const COMPLETE_STATUS_VALUES: &[&str] = &["completed", "finished"];

/// `data` value that means the report has been produced.
pub const REPORTED_DATA_VALUE: &str = "reported";

/// Body of `GET /status/{identifier}`.
///
/// Both fields are optional and kept as raw JSON: the backend also uses
/// them for non-string payloads, and an unexpected `status` must not hide
/// a `data` field that reports completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl StatusResponse {
    /// The `status` field, if it is a string.
    pub fn status_str(&self) -> Option<&str> {
        self.status.as_ref().and_then(|v| v.as_str())
    }

    /// The `data` field, if it is a string.
    pub fn data_str(&self) -> Option<&str> {
        self.data.as_ref().and_then(|v| v.as_str())
    }
}

/// Signature shared by terminal predicates, so a track can be configured
/// with an alternative vocabulary.
pub type TerminalPredicate = fn(&StatusResponse) -> bool;

/// Whether a status response reports the task as complete.
pub fn is_terminal_complete(response: &StatusResponse) -> bool {
    let status_done = response
        .status_str()
        .is_some_and(|s| COMPLETE_STATUS_VALUES.contains(&s));
    status_done || response.data_str() == Some(REPORTED_DATA_VALUE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> StatusResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn completed_status_is_terminal() {
        assert!(is_terminal_complete(&parse(serde_json::json!({"status": "completed"}))));
    }

    #[test]
    fn finished_status_is_terminal() {
        assert!(is_terminal_complete(&parse(serde_json::json!({"status": "finished"}))));
    }

    #[test]
    fn reported_data_without_status_is_terminal() {
        let resp = parse(serde_json::json!({"data": "reported"}));
        assert!(resp.status.is_none());
        assert!(is_terminal_complete(&resp));
    }

    #[test]
    fn running_values_are_not_terminal() {
        for json in [
            serde_json::json!({"status": "running"}),
            serde_json::json!({"status": "pending", "data": "running"}),
            serde_json::json!({"data": "completed"}),
            serde_json::json!({"status": "reported"}),
            serde_json::json!({}),
        ] {
            assert!(!is_terminal_complete(&parse(json.clone())), "{json}");
        }
    }

    #[test]
    fn values_are_case_sensitive() {
        assert!(!is_terminal_complete(&parse(serde_json::json!({"status": "Completed"}))));
    }

    #[test]
    fn non_string_data_is_ignored() {
        let resp = parse(serde_json::json!({"data": {"state": "reported"}}));
        assert!(resp.data_str().is_none());
        assert!(!is_terminal_complete(&resp));
    }

    #[test]
    fn non_string_status_does_not_mask_reported_data() {
        let resp = parse(serde_json::json!({"status": 1, "data": "reported"}));
        assert!(resp.status_str().is_none());
        assert!(is_terminal_complete(&resp));

        let resp = parse(serde_json::json!({"status": {"code": 3}}));
        assert!(!is_terminal_complete(&resp));
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let resp = parse(serde_json::json!({"error": false, "data": "reported", "extra": 1}));
        assert!(is_terminal_complete(&resp));
    }
}
