//! Navigation target handed to the reporting view.
//!
//! Both task identifiers travel as query parameters: `id` for the static
//! task and `dynamicId` for the dynamic one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::TaskId;

/// Default path of the reporting view.
pub const DEFAULT_RESULT_PATH: &str = "/result";

pub const STATIC_ID_PARAM: &str = "id";
pub const DYNAMIC_ID_PARAM: &str = "dynamicId";

/// Where the reporting view should be opened and which tasks it shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandOffTarget {
    pub path: String,
    pub static_id: TaskId,
    pub dynamic_id: Option<TaskId>,
}

impl HandOffTarget {
    pub fn new(path: impl Into<String>, static_id: TaskId, dynamic_id: Option<TaskId>) -> Self {
        Self {
            path: path.into(),
            static_id,
            dynamic_id,
        }
    }

    /// Query string without the leading `?`, identifiers percent-encoded.
    pub fn query(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair(STATIC_ID_PARAM, &self.static_id);
        if let Some(dynamic_id) = &self.dynamic_id {
            query.append_pair(DYNAMIC_ID_PARAM, dynamic_id);
        }
        query.finish()
    }

    /// Parse a target such as `/result?id=7&dynamicId=8`.
    ///
    /// Anything before the `?` is taken as the path, so absolute URLs are
    /// accepted too. `id` is required, `dynamicId` is optional.
    pub fn parse(target: &str) -> Result<Self, CoreError> {
        let (path, query) = target
            .split_once('?')
            .ok_or_else(|| CoreError::MalformedTarget(format!("missing query string in '{target}'")))?;

        let mut static_id = None;
        let mut dynamic_id = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                STATIC_ID_PARAM => static_id = Some(value.into_owned()),
                DYNAMIC_ID_PARAM => dynamic_id = Some(value.into_owned()),
                _ => {}
            }
        }

        let static_id = static_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CoreError::MalformedTarget(format!("missing '{STATIC_ID_PARAM}' in '{target}'")))?;

        Ok(Self {
            path: path.to_string(),
            static_id,
            dynamic_id: dynamic_id.filter(|id| !id.is_empty()),
        })
    }
}

impl fmt::Display for HandOffTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?{}", self.path, self.query())
    }
}
