//! Admin widgets built on the metadata synchronizers.
//!
//! Each widget binds one synchronizer to its subject entity and validates
//! user input before anything reaches the remote API.

mod notes;
mod password;
mod quicklinks;

use thiserror::Error;

use crate::models::EntityId;
use crate::navigation::entity_id_from_path;

pub use notes::{NotesWidget, NOTES_FIELD};
pub use password::{FlagChange, PasswordRestrictionWidget, CAN_CHANGE_PASSWORD_FIELD};
pub use quicklinks::{QuicklinksWidget, QUICKLINKS_FIELD};

/// Errors raised by widget adapters.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    Sync(#[from] crate::Error),
    #[error("Note content cannot be empty")]
    EmptyContent,
    #[error("Quicklink {0} cannot be empty")]
    EmptyField(&'static str),
    #[error("No {marker} id found in path '{path}'")]
    NoEntityInPath { marker: &'static str, path: String },
    #[error("No item with id {0}")]
    UnknownItem(String),
    #[error("{0} cannot be a quicklink target")]
    InvalidTarget(String),
}

impl WidgetError {
    /// Whether the underlying write lost an optimistic-concurrency race.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Sync(error) if error.is_conflict())
    }
}

pub type WidgetResult<T> = Result<T, WidgetError>;

fn subject_from_path(path: &str, marker: &'static str) -> WidgetResult<EntityId> {
    entity_id_from_path(path, marker).ok_or_else(|| WidgetError::NoEntityInPath {
        marker,
        path: path.to_string(),
    })
}

/// Trimmed text, or `None` when blank.
fn non_blank(value: &str) -> Option<String> {
    crate::util::normalize_text_option(Some(value.to_string()))
}
