//! Data models for shopmeta

mod entity;
mod note;
mod quicklink;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use entity::{Entity, EntityId, EntityKind, EntityVersion, Metadata};
pub use note::{Note, NoteKey};
pub use quicklink::{Quicklink, QuicklinkId, QuicklinkKind};

/// An element of a list mirrored into one metadata field.
pub trait ListItem: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Identity that stays the same across edits.
    type Key: Clone + PartialEq + fmt::Display + Send + Sync;

    fn key(&self) -> &Self::Key;

    /// Decode the element stored at `index` of a persisted list.
    fn decode_item(value: &Value, _index: usize) -> serde_json::Result<Self> {
        Self::deserialize(value)
    }
}
