//! Customer notes widget.

use chrono::Utc;

use super::{non_blank, subject_from_path, WidgetError, WidgetResult};
use crate::codec::DecodeError;
use crate::models::{Entity, EntityId, EntityKind, Note, NoteKey};
use crate::remote::EntityApi;
use crate::sync::MetadataList;

/// Metadata key holding a customer's notes.
pub const NOTES_FIELD: &str = "notes";

/// Notes attached to one customer.
pub struct NotesWidget<A> {
    list: MetadataList<A, Note>,
    customer: Entity,
    recovered: Option<DecodeError>,
}

impl<A: EntityApi> NotesWidget<A> {
    /// Load the notes of `customer_id`.
    pub async fn mount(api: A, customer_id: &EntityId) -> WidgetResult<Self> {
        let list = MetadataList::new(api, EntityKind::Customer, NOTES_FIELD);
        let outcome = list.load(customer_id).await?;
        Ok(Self {
            list,
            customer: outcome.entity,
            recovered: outcome.recovered,
        })
    }

    /// Load the notes of the customer named in an admin path.
    pub async fn mount_from_path(api: A, path: &str) -> WidgetResult<Self> {
        let customer_id = subject_from_path(path, EntityKind::Customer.plural())?;
        Self::mount(api, &customer_id).await
    }

    pub const fn customer(&self) -> &Entity {
        &self.customer
    }

    /// Decode problem hit while mounting, if the stored notes were unreadable.
    pub const fn recovered(&self) -> Option<&DecodeError> {
        self.recovered.as_ref()
    }

    pub async fn notes(&self) -> Vec<Note> {
        self.list.items().await
    }

    /// Add a note; blank content is rejected without a remote call.
    pub async fn add(&self, content: &str, author: Option<String>) -> WidgetResult<Note> {
        let content = non_blank(content).ok_or(WidgetError::EmptyContent)?;
        let author = author.and_then(|author| non_blank(&author));
        let now = Utc::now();
        let items = self
            .list
            .append_with(move |existing| Note::new(existing, content, author, now))
            .await?;
        items
            .last()
            .cloned()
            .ok_or_else(|| WidgetError::UnknownItem("new note".to_string()))
    }

    /// Replace a note's content and stamp the edit time.
    pub async fn edit(&self, key: NoteKey, content: &str) -> WidgetResult<Note> {
        let content = non_blank(content).ok_or(WidgetError::EmptyContent)?;
        self.require(key).await?;
        let now = Utc::now();
        let items = self
            .list
            .update_by_key(&key, |note| note.edited(content.clone(), now))
            .await?;
        find(&items, key)
    }

    /// Delete a note.
    ///
    /// Unknown keys fail with `WidgetError::UnknownItem` before any remote
    /// call, unlike `MetadataList::remove_by_key`, which writes the list back
    /// even when the key is absent.
    pub async fn delete(&self, key: NoteKey) -> WidgetResult<Note> {
        let existing = self.require(key).await?;
        self.list.remove_by_key(&key).await?;
        Ok(existing)
    }

    async fn require(&self, key: NoteKey) -> WidgetResult<Note> {
        find(&self.list.items().await, key)
    }
}

fn find(notes: &[Note], key: NoteKey) -> WidgetResult<Note> {
    notes
        .iter()
        .find(|note| note.id == key)
        .cloned()
        .ok_or_else(|| WidgetError::UnknownItem(key.to_string()))
}
