//! Long-polling response shapes

use serde::{Deserialize, Serialize};

use super::Cursor;
use crate::{Error, Result};

/// Review outcome for one submitted attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptResult {
    /// Whether the reviewer sent the work back
    pub is_negative: bool,
    /// Title of the lesson the attempt belongs to
    pub lesson_title: String,
    /// Link to the lesson page
    pub lesson_url: String,
}

/// Body of a long-polling response, keyed on its `status` field
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PollResponse {
    /// New review results are available
    Found {
        #[serde(rename = "new_attempts", default)]
        attempts: Vec<AttemptResult>,
        #[serde(rename = "last_attempt_timestamp")]
        resume_cursor: Cursor,
    },
    /// Nothing happened before the server-side wait expired
    Timeout {
        #[serde(rename = "timestamp_to_request")]
        resume_cursor: Cursor,
    },
}

impl PollResponse {
    /// Parse a raw response body
    ///
    /// A body without `status`, with an unrecognized status, or without the
    /// matching cursor field is reported as [`Error::MalformedResponse`].
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| Error::MalformedResponse(e.to_string()))
    }

    /// Cursor the next poll should start from
    pub fn resume_cursor(&self) -> Cursor {
        match self {
            PollResponse::Found { resume_cursor, .. } => *resume_cursor,
            PollResponse::Timeout { resume_cursor } => *resume_cursor,
        }
    }

    /// Short status name, matching the wire value
    pub fn status(&self) -> &'static str {
        match self {
            PollResponse::Found { .. } => "found",
            PollResponse::Timeout { .. } => "timeout",
        }
    }
}
