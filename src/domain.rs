use serde::Deserialize;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lower bound (Unix seconds) of the next query window.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor(pub i64);

impl Cursor {
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self(i64::try_from(secs).unwrap_or(i64::MAX))
    }

    /// The cursor never moves backwards.
    pub fn advance(self, current_date: Option<i64>) -> Self {
        match current_date {
            Some(d) => self.max(Self(d)),
            None => self,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ChatId(pub String);

impl std::fmt::Debug for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ChatId").field(&"<redacted>").finish()
    }
}

/// A validated response of the review service.
#[derive(Debug)]
pub struct ApiResponse {
    /// Records are kept raw; each one is checked when it is diffed.
    pub homeworks: Vec<Value>,
    pub current_date: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct HomeworkRecord {
    pub homework_name: Option<String>,
    pub status: Option<String>,
}
