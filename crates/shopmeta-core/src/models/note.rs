//! Customer note model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ListItem;

/// Key of a note: the creation time in Unix milliseconds.
///
/// Keys are unique within one list; `NoteKey::next` bumps past the newest
/// existing key when two notes land in the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteKey(i64);

impl NoteKey {
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Next free key for a list, based on `now`.
    #[must_use]
    pub fn next(existing: &[Note], now: DateTime<Utc>) -> Self {
        let now_ms = now.timestamp_millis();
        let newest = existing.iter().map(|note| note.id.0).max();
        match newest {
            Some(newest) if newest >= now_ms => Self(newest.saturating_add(1)),
            _ => Self(now_ms),
        }
    }
}

impl fmt::Display for NoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteKey {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// A note attached to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteKey,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Note {
    /// Create a note keyed after the existing notes of the same list.
    #[must_use]
    pub fn new(
        existing: &[Self],
        content: impl Into<String>,
        author: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NoteKey::next(existing, now),
            content: content.into(),
            created_at: now,
            edited_at: None,
            author,
        }
    }

    /// Copy with new content and an edit timestamp.
    #[must_use]
    pub fn edited(&self, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            edited_at: Some(now),
            ..self.clone()
        }
    }

    /// Most recent change time.
    #[must_use]
    pub fn last_changed(&self) -> DateTime<Utc> {
        self.edited_at.unwrap_or(self.created_at)
    }
}

impl ListItem for Note {
    type Key = NoteKey;

    fn key(&self) -> &NoteKey {
        &self.id
    }
}
