use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted line-level failure from a rejected upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InvalidRecord {
    pub id: i64,
    pub line_number: i32,
    pub error_message: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A validation failure tied to the line it was found on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub line_number: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line_number: usize, message: impl Into<String>) -> Self {
        Self {
            line_number,
            message: message.into(),
        }
    }

    pub fn stored_line_number(&self) -> i32 {
        i32::try_from(self.line_number).unwrap_or(i32::MAX)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line_number, self.message)
    }
}
