//! Product quicklink model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{Entity, ListItem};

/// Stable quicklink identifier.
///
/// New links get a UUID v7. Entries written before ids existed have none;
/// decoding derives a UUID v5 from their position and content, so the same
/// stored list always yields the same ids, and the next write-back persists
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuicklinkId(Uuid);

impl QuicklinkId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

/// Namespace for ids derived from id-less stored entries.
const LEGACY_NAMESPACE: Uuid = Uuid::from_u128(0x6f0c_2a4e_9b1d_4c3e_8a57_1e2d_3c4b_5a69);

impl QuicklinkId {
    /// Id for the entry stored at `index` without one.
    #[must_use]
    pub fn legacy(index: usize, title: &str, link: &str) -> Self {
        let name = format!("{index}\u{1f}{title}\u{1f}{link}");
        Self(Uuid::new_v5(&LEGACY_NAMESPACE, name.as_bytes()))
    }
}

impl Default for QuicklinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QuicklinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QuicklinkId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// What a quicklink points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuicklinkKind {
    Custom,
    Product,
    Collection,
}

impl fmt::Display for QuicklinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Custom => "custom",
            Self::Product => "product",
            Self::Collection => "collection",
        })
    }
}

/// A link shown on a product page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quicklink {
    pub id: QuicklinkId,
    pub title: String,
    pub link: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: QuicklinkKind,
}

const fn default_kind() -> QuicklinkKind {
    QuicklinkKind::Custom
}

/// Stored shape, where `id` may be missing.
#[derive(Deserialize)]
struct StoredQuicklink {
    #[serde(default)]
    id: Option<QuicklinkId>,
    title: String,
    link: String,
    #[serde(rename = "type", default = "default_kind")]
    kind: QuicklinkKind,
}

impl Quicklink {
    #[must_use]
    pub fn custom(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            id: QuicklinkId::new(),
            title: title.into(),
            link: link.into(),
            kind: QuicklinkKind::Custom,
        }
    }

    /// Link to another product or collection.
    ///
    /// Returns `None` for other entity kinds.
    #[must_use]
    pub fn to_entity(target: &Entity) -> Option<Self> {
        let kind = match target.kind {
            super::EntityKind::Product => QuicklinkKind::Product,
            super::EntityKind::Collection => QuicklinkKind::Collection,
            super::EntityKind::Customer => return None,
        };
        let slug = target
            .handle
            .as_deref()
            .filter(|handle| !handle.trim().is_empty())
            .unwrap_or_else(|| target.id.as_str());
        Some(Self {
            id: QuicklinkId::new(),
            title: target.display_name().to_string(),
            link: format!("/{}/{}", target.kind.plural(), slug),
            kind,
        })
    }
}

impl ListItem for Quicklink {
    type Key = QuicklinkId;

    fn key(&self) -> &QuicklinkId {
        &self.id
    }

    fn decode_item(value: &Value, index: usize) -> serde_json::Result<Self> {
        let stored = StoredQuicklink::deserialize(value)?;
        let id = stored
            .id
            .unwrap_or_else(|| QuicklinkId::legacy(index, &stored.title, &stored.link));
        Ok(Self {
            id,
            title: stored.title,
            link: stored.link,
            kind: stored.kind,
        })
    }
}
