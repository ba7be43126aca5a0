//! Ordered list mirrored into one JSON-encoded metadata field.

use serde_json::Value;
use tokio::sync::Mutex;

use super::write_field;
use crate::codec::{decode_list, encode_list, DecodeError};
use crate::models::{Entity, EntityId, EntityKind, ListItem};
use crate::remote::EntityApi;
use crate::{Error, Result};

/// Result of `MetadataList::load`.
#[derive(Debug)]
pub struct LoadOutcome<T> {
    pub entity: Entity,
    pub items: Vec<T>,
    /// Set when the stored value could not be decoded and the list was
    /// reset to empty.
    pub recovered: Option<DecodeError>,
}

#[derive(Debug)]
struct ListState<T> {
    entity_id: EntityId,
    items: Vec<T>,
    /// Field value as last confirmed by the store
    confirmed: Option<Value>,
    /// Undecodable value seen on load, preserved on the next write
    unreadable: Option<Value>,
}

/// Local mirror of a typed list stored under `field` of one remote entity.
///
/// Mutations are serialized: each holds the state lock for the whole
/// fetch-merge-update sequence and commits locally only after the store
/// confirms the write. A write is refused with `Error::Conflict` when the
/// field changed remotely since it was last loaded or written.
pub struct MetadataList<A, T: ListItem> {
    api: A,
    kind: EntityKind,
    field: String,
    state: Mutex<Option<ListState<T>>>,
}

impl<A: EntityApi, T: ListItem> MetadataList<A, T> {
    pub fn new(api: A, kind: EntityKind, field: impl Into<String>) -> Self {
        Self {
            api,
            kind,
            field: field.into(),
            state: Mutex::new(None),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Metadata key that receives an undecodable value before it is
    /// overwritten.
    pub fn backup_field(&self) -> String {
        format!("{}_corrupt_backup", self.field)
    }

    /// Fetch the entity and decode the list.
    ///
    /// Undecodable content is logged and yields an empty list; only the
    /// fetch itself can fail.
    pub async fn load(&self, entity_id: &EntityId) -> Result<LoadOutcome<T>> {
        let mut guard = self.state.lock().await;
        let entity = self
            .api
            .retrieve(self.kind, entity_id)
            .await
            .inspect_err(|error| {
                tracing::error!(kind = %self.kind, id = %entity_id, %error, "Failed to load entity");
            })?;

        let raw = entity.metadata_value(&self.field).cloned();
        let (items, recovered) = match decode_list::<T>(raw.as_ref()) {
            Ok(items) => (items, None),
            Err(error) => {
                tracing::warn!(
                    kind = %self.kind,
                    id = %entity_id,
                    field = %self.field,
                    %error,
                    "Stored list is unreadable; starting from an empty list"
                );
                (Vec::new(), Some(error))
            }
        };

        tracing::debug!(field = %self.field, id = %entity_id, count = items.len(), "Loaded list");
        *guard = Some(ListState {
            entity_id: entity_id.clone(),
            items: items.clone(),
            unreadable: recovered.as_ref().and(raw.clone()),
            confirmed: raw,
        });

        Ok(LoadOutcome {
            entity,
            items,
            recovered,
        })
    }

    /// Current confirmed items (empty before `load`).
    pub async fn items(&self) -> Vec<T> {
        self.state
            .lock()
            .await
            .as_ref()
            .map(|state| state.items.clone())
            .unwrap_or_default()
    }

    /// Entity the list was loaded from.
    pub async fn entity_id(&self) -> Option<EntityId> {
        self.state
            .lock()
            .await
            .as_ref()
            .map(|state| state.entity_id.clone())
    }

    /// Append `item` at the end.
    pub async fn append(&self, item: T) -> Result<Vec<T>> {
        self.commit(move |items| {
            let mut next = items.to_vec();
            next.push(item);
            next
        })
        .await
    }

    /// Append an item built from the current list, e.g. to derive its key.
    pub async fn append_with<F>(&self, build: F) -> Result<Vec<T>>
    where
        F: FnOnce(&[T]) -> T + Send,
    {
        self.commit(move |items| {
            let item = build(items);
            let mut next = items.to_vec();
            next.push(item);
            next
        })
        .await
    }

    /// Remove every item with `key`. An absent key still writes back.
    pub async fn remove_by_key(&self, key: &T::Key) -> Result<Vec<T>> {
        self.commit(|items| {
            items
                .iter()
                .filter(|item| item.key() != key)
                .cloned()
                .collect()
        })
        .await
    }

    /// Replace the item with `key` by `mutator(item)`. An absent key still
    /// writes back the unchanged list.
    pub async fn update_by_key<F>(&self, key: &T::Key, mutator: F) -> Result<Vec<T>>
    where
        F: Fn(&T) -> T + Send,
    {
        self.commit(move |items| {
            items
                .iter()
                .map(|item| {
                    if item.key() == key {
                        mutator(item)
                    } else {
                        item.clone()
                    }
                })
                .collect()
        })
        .await
    }

    async fn commit<F>(&self, edit: F) -> Result<Vec<T>>
    where
        F: FnOnce(&[T]) -> Vec<T> + Send,
    {
        let mut guard = self.state.lock().await;
        let state = guard
            .as_mut()
            .ok_or_else(|| Error::NotLoaded(self.field.clone()))?;

        let next = edit(&state.items);
        let encoded = encode_list(&next)?;

        let extra = state
            .unreadable
            .clone()
            .map(|raw| (self.backup_field(), raw))
            .into_iter()
            .collect::<Vec<_>>();

        let kind = self.kind;
        let field = self.field.as_str();
        let confirmed = state.confirmed.clone();
        let updated = write_field(
            &self.api,
            kind,
            &state.entity_id,
            field,
            encoded.clone(),
            extra,
            move |latest| {
                if latest.metadata_value(field) == confirmed.as_ref() {
                    Ok(())
                } else {
                    Err(Error::Conflict {
                        kind,
                        id: latest.id.clone(),
                        reason: format!("metadata field '{field}' changed since it was loaded"),
                    })
                }
            },
        )
        .await?;

        if state.unreadable.take().is_some() {
            tracing::warn!(
                field = %self.field,
                backup = %self.backup_field(),
                "Preserved unreadable list value before overwriting it"
            );
        }
        state.confirmed = Some(
            updated
                .metadata_value(&self.field)
                .cloned()
                .unwrap_or(encoded),
        );
        state.items.clone_from(&next);
        tracing::info!(
            kind = %self.kind,
            id = %state.entity_id,
            field = %self.field,
            count = next.len(),
            "Committed list write-back"
        );
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::models::{Metadata, Note, NoteKey, Quicklink};
    use crate::remote::{Fault, InMemoryEntityApi};

    fn customer(api: &InMemoryEntityApi, metadata: Metadata) -> EntityId {
        let id = EntityId::new("cus_01").unwrap();
        api.insert(Entity::new(EntityKind::Customer, id.clone()).with_metadata(metadata));
        id
    }

    fn note(existing: &[Note], content: &str, ms: i64) -> Note {
        Note::new(
            existing,
            content,
            None,
            Utc.timestamp_millis_opt(ms).unwrap(),
        )
    }

    fn notes_list(api: &InMemoryEntityApi) -> MetadataList<InMemoryEntityApi, Note> {
        MetadataList::new(api.clone(), EntityKind::Customer, "notes")
    }

    fn stored_notes(api: &InMemoryEntityApi, id: &EntityId) -> Option<Value> {
        api.get(EntityKind::Customer, id)
            .and_then(|entity| entity.metadata.get("notes").cloned())
    }

    #[tokio::test]
    async fn first_append_writes_encoded_array() {
        let api = InMemoryEntityApi::new();
        let id = customer(&api, Metadata::new());
        let list = notes_list(&api);

        let outcome = list.load(&id).await.unwrap();
        assert!(outcome.items.is_empty());
        assert!(outcome.recovered.is_none());

        let hi = note(&[], "hi", 1_000);
        let items = list.append(hi.clone()).await.unwrap();
        assert_eq!(items.len(), 1);

        let calls = api.update_calls();
        assert_eq!(calls.len(), 1);
        let written = calls[0].metadata.get("notes").and_then(Value::as_str).unwrap();
        let parsed: Value = serde_json::from_str(written).unwrap();
        assert_eq!(parsed[0]["content"], "hi");
        assert_eq!(list.items().await, vec![hi]);
    }

    #[tokio::test]
    async fn sequential_appends_accumulate_in_order() {
        let api = InMemoryEntityApi::new();
        let id = customer(&api, Metadata::new());
        let list = notes_list(&api);
        list.load(&id).await.unwrap();

        let first = note(&[], "one", 1_000);
        let second = note(std::slice::from_ref(&first), "two", 2_000);
        list.append(first.clone()).await.unwrap();
        list.append(second.clone()).await.unwrap();

        let calls = api.update_calls();
        assert_eq!(calls.len(), 2);
        let lengths = calls
            .iter()
            .map(|call| {
                let raw = call.metadata.get("notes").and_then(Value::as_str).unwrap();
                serde_json::from_str::<Vec<Note>>(raw).unwrap().len()
            })
            .collect::<Vec<_>>();
        assert_eq!(lengths, vec![1, 2]);
        assert_eq!(list.items().await, vec![first, second]);
    }

    #[tokio::test]
    async fn write_back_keeps_unrelated_metadata() {
        let api = InMemoryEntityApi::new();
        let mut metadata = Metadata::new();
        metadata.insert("a".to_string(), json!(1));
        let id = customer(&api, metadata);
        let list = notes_list(&api);
        list.load(&id).await.unwrap();

        // Another client adds a key after our load; it must survive too.
        api.set_metadata_value(EntityKind::Customer, &id, "b", json!("late"));
        list.append(note(&[], "hi", 1_000)).await.unwrap();

        let stored = api.get(EntityKind::Customer, &id).unwrap();
        assert_eq!(stored.metadata.get("a"), Some(&json!(1)));
        assert_eq!(stored.metadata.get("b"), Some(&json!("late")));
        assert!(stored.metadata.get("notes").is_some());
    }

    #[tokio::test]
    async fn failed_update_leaves_local_list_untouched() {
        let api = InMemoryEntityApi::new();
        let id = customer(&api, Metadata::new());
        let list = notes_list(&api);
        list.load(&id).await.unwrap();
        let kept = note(&[], "kept", 1_000);
        list.append(kept.clone()).await.unwrap();

        api.inject(Fault::UpdateFails);
        let result = list.append(note(&[], "lost", 2_000)).await;
        assert!(result.is_err());
        assert_eq!(list.items().await, vec![kept.clone()]);

        api.inject(Fault::RetrieveFails);
        assert!(list.remove_by_key(&kept.id).await.is_err());
        assert_eq!(list.items().await, vec![kept]);
    }

    #[tokio::test]
    async fn update_without_entity_is_a_failure() {
        let api = InMemoryEntityApi::new();
        let id = customer(&api, Metadata::new());
        let list = notes_list(&api);
        list.load(&id).await.unwrap();

        api.inject(Fault::UpdateReturnsNoEntity);
        let error = list.append(note(&[], "hi", 1_000)).await.unwrap_err();
        assert!(matches!(error, Error::MissingEntity { .. }));
        assert!(list.items().await.is_empty());
    }

    #[tokio::test]
    async fn removing_absent_key_rewrites_identical_field() {
        let api = InMemoryEntityApi::new();
        let id = customer(&api, Metadata::new());
        let list = notes_list(&api);
        list.load(&id).await.unwrap();
        list.append(note(&[], "hi", 1_000)).await.unwrap();
        let before = stored_notes(&api, &id);

        let items = list.remove_by_key(&NoteKey::from_millis(42)).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(api.update_calls().len(), 2);
        assert_eq!(stored_notes(&api, &id), before);
    }

    #[tokio::test]
    async fn remove_by_key_drops_matching_item() {
        let api = InMemoryEntityApi::new();
        let id = customer(&api, Metadata::new());
        let list = notes_list(&api);
        list.load(&id).await.unwrap();
        let first = note(&[], "one", 1_000);
        let second = note(std::slice::from_ref(&first), "two", 2_000);
        list.append(first.clone()).await.unwrap();
        list.append(second.clone()).await.unwrap();

        let items = list.remove_by_key(&first.id).await.unwrap();
        assert_eq!(items, vec![second]);
    }

    #[tokio::test]
    async fn update_by_key_with_unknown_key_is_a_no_op_write() {
        let api = InMemoryEntityApi::new();
        let id = customer(&api, Metadata::new());
        let list = notes_list(&api);
        list.load(&id).await.unwrap();
        let only = note(&[], "one", 1_000);
        list.append(only.clone()).await.unwrap();
        let before = stored_notes(&api, &id);

        let items = list
            .update_by_key(&NoteKey::from_millis(7), |item| {
                item.edited("changed", Utc.timestamp_millis_opt(9_000).unwrap())
            })
            .await
            .unwrap();
        assert_eq!(items, vec![only]);
        assert_eq!(stored_notes(&api, &id), before);
    }

    #[tokio::test]
    async fn update_by_key_replaces_item_in_place() {
        let api = InMemoryEntityApi::new();
        let id = customer(&api, Metadata::new());
        let list = notes_list(&api);
        list.load(&id).await.unwrap();
        let first = note(&[], "one", 1_000);
        let second = note(std::slice::from_ref(&first), "two", 2_000);
        list.append(first.clone()).await.unwrap();
        list.append(second.clone()).await.unwrap();

        let edited_at = Utc.timestamp_millis_opt(3_000).unwrap();
        let items = list
            .update_by_key(&first.id, |item| item.edited("uno", edited_at))
            .await
            .unwrap();
        assert_eq!(items[0].content, "uno");
        assert_eq!(items[0].edited_at, Some(edited_at));
        assert_eq!(items[1], second);
    }

    #[tokio::test]
    async fn malformed_field_loads_empty_and_is_backed_up() {
        let api = InMemoryEntityApi::new();
        let mut metadata = Metadata::new();
        metadata.insert("notes".to_string(), json!("not-json"));
        let id = customer(&api, metadata);
        let list = notes_list(&api);

        let outcome = list.load(&id).await.unwrap();
        assert!(outcome.items.is_empty());
        assert!(matches!(outcome.recovered, Some(DecodeError::Malformed(_))));

        list.append(note(&[], "fresh", 1_000)).await.unwrap();
        let stored = api.get(EntityKind::Customer, &id).unwrap();
        assert_eq!(
            stored.metadata.get("notes_corrupt_backup"),
            Some(&json!("not-json"))
        );

        // Later writes carry the backup along with the rest of the bag.
        list.append(note(&[], "again", 2_000)).await.unwrap();
        let calls = api.update_calls();
        assert!(calls[1].metadata.get("notes_corrupt_backup").is_some());
        assert_eq!(list.items().await.len(), 2);
    }

    #[tokio::test]
    async fn load_failure_is_an_error() {
        let api = InMemoryEntityApi::new();
        let list = notes_list(&api);
        let result = list.load(&EntityId::new("cus_missing").unwrap()).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert!(list.entity_id().await.is_none());
    }

    #[tokio::test]
    async fn mutation_before_load_is_rejected() {
        let api = InMemoryEntityApi::new();
        let list = notes_list(&api);
        let result = list.append(note(&[], "hi", 1_000)).await;
        assert!(matches!(result, Err(Error::NotLoaded(_))));
        assert!(api.update_calls().is_empty());
    }

    #[tokio::test]
    async fn remote_change_to_field_is_a_conflict() {
        let api = InMemoryEntityApi::new();
        let id = customer(&api, Metadata::new());
        let list = notes_list(&api);
        list.load(&id).await.unwrap();

        api.set_metadata_value(EntityKind::Customer, &id, "notes", json!("[]"));
        let error = list.append(note(&[], "hi", 1_000)).await.unwrap_err();
        assert!(error.is_conflict());
        assert!(api.update_calls().is_empty());
        assert!(list.items().await.is_empty());

        list.load(&id).await.unwrap();
        assert!(list.append(note(&[], "hi", 1_000)).await.is_ok());
    }

    #[tokio::test]
    async fn write_racing_the_refetch_is_rejected_by_version() {
        let api = InMemoryEntityApi::new();
        let id = customer(&api, Metadata::new());
        let list = notes_list(&api);
        list.load(&id).await.unwrap();

        api.inject(Fault::ConcurrentWrite {
            key: "tier".to_string(),
            value: json!("gold"),
        });
        let error = list.append(note(&[], "hi", 1_000)).await.unwrap_err();
        assert!(error.is_conflict());
        assert!(list.items().await.is_empty());

        let stored = api.get(EntityKind::Customer, &id).unwrap();
        assert_eq!(stored.metadata.get("tier"), Some(&json!("gold")));
        assert!(stored.metadata.get("notes").is_none());
    }

    #[tokio::test]
    async fn quicklinks_keep_identity_after_reorder() {
        let api = InMemoryEntityApi::new();
        let id = EntityId::new("prod_01").unwrap();
        api.insert(Entity::new(EntityKind::Product, id.clone()));
        let list: MetadataList<_, Quicklink> =
            MetadataList::new(api.clone(), EntityKind::Product, "quicklinks");
        list.load(&id).await.unwrap();

        let a = Quicklink::custom("A", "/a");
        let b = Quicklink::custom("B", "/b");
        list.append(a.clone()).await.unwrap();
        list.append(b.clone()).await.unwrap();
        list.remove_by_key(&a.id).await.unwrap();

        let items = list.update_by_key(&b.id, |link| Quicklink {
            title: "B2".to_string(),
            ..link.clone()
        })
        .await
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, b.id);
        assert_eq!(items[0].title, "B2");
    }
}
