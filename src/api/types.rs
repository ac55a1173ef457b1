//! API request and response types

use serde::{Deserialize, Deserializer, Serialize};

/// One chat turn from the page
#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub message: String,
    /// `None` when the key is absent, `Some(None)` for an explicit `null`
    #[serde(default, deserialize_with = "present")]
    pub subject: Option<Option<String>>,
}

impl AskRequest {
    /// Subject to look up. An absent key takes `default`; an explicit
    /// `null` names no subject at all.
    #[must_use]
    pub fn subject_or<'a>(&'a self, default: &'a str) -> Option<&'a str> {
        match &self.subject {
            None => Some(default),
            Some(subject) => subject.as_deref(),
        }
    }
}

/// Marks a key as present, even when its value is `null`
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Reply to a chat turn
#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub reply: String,
}

/// Subjects available in the current rule table
#[derive(Debug, Serialize)]
pub struct SubjectsResponse {
    pub subjects: Vec<String>,
    pub default: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
