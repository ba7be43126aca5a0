//! In-process entity store.
//!
//! Honors version preconditions like a real backend and can inject faults,
//! which makes it the backing store for synchronizer tests and dry runs.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::{EntityApi, EntityPage, ListQuery};
use crate::models::{Entity, EntityId, EntityKind, EntityVersion, Metadata};
use crate::{Error, Result};

/// A failure or interleaving to apply on a future call.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// Next `retrieve` fails with a transport-style error.
    RetrieveFails,
    /// Next `update_metadata` fails without touching the entity.
    UpdateFails,
    /// Next `update_metadata` applies the write but reports no entity back.
    UpdateReturnsNoEntity,
    /// Right after the next `retrieve`, another writer sets `key` to `value`.
    ConcurrentWrite { key: String, value: Value },
}

/// A recorded `update_metadata` call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCall {
    pub kind: EntityKind,
    pub id: EntityId,
    pub metadata: Metadata,
    pub expected: Option<EntityVersion>,
}

#[derive(Debug, Default)]
struct State {
    entities: BTreeMap<(EntityKind, EntityId), (Entity, u64)>,
    faults: VecDeque<Fault>,
    updates: Vec<UpdateCall>,
}

impl State {
    fn take_fault(&mut self, matches: impl Fn(&Fault) -> bool) -> Option<Fault> {
        let position = self.faults.iter().position(matches)?;
        self.faults.remove(position)
    }

    fn bump(&mut self, kind: EntityKind, id: &EntityId, metadata: Metadata) -> Option<Entity> {
        let (entity, revision) = self.entities.get_mut(&(kind, id.clone()))?;
        *revision += 1;
        entity.metadata = metadata;
        entity.version = Some(EntityVersion::new(revision.to_string()));
        Some(entity.clone())
    }
}

/// Shared in-memory implementation of `EntityApi`. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityApi {
    state: Arc<Mutex<State>>,
}

impl InMemoryEntityApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace an entity; returns it with its assigned version.
    pub fn insert(&self, mut entity: Entity) -> Entity {
        entity.version = Some(EntityVersion::new("1"));
        self.state()
            .entities
            .insert((entity.kind, entity.id.clone()), (entity.clone(), 1));
        entity
    }

    /// Current stored copy of an entity.
    pub fn get(&self, kind: EntityKind, id: &EntityId) -> Option<Entity> {
        self.state()
            .entities
            .get(&(kind, id.clone()))
            .map(|(entity, _)| entity.clone())
    }

    /// Out-of-band write of one metadata key, as another client would do.
    pub fn set_metadata_value(&self, kind: EntityKind, id: &EntityId, key: &str, value: Value) {
        let mut state = self.state();
        let Some(mut metadata) = state
            .entities
            .get(&(kind, id.clone()))
            .map(|(entity, _)| entity.metadata.clone())
        else {
            return;
        };
        metadata.insert(key.to_string(), value);
        state.bump(kind, id, metadata);
    }

    /// Queue a fault for a future call.
    pub fn inject(&self, fault: Fault) {
        self.state().faults.push_back(fault);
    }

    /// Every update attempt that reached the store, in order.
    pub fn update_calls(&self) -> Vec<UpdateCall> {
        self.state().updates.clone()
    }
}

#[async_trait]
impl EntityApi for InMemoryEntityApi {
    async fn retrieve(&self, kind: EntityKind, id: &EntityId) -> Result<Entity> {
        let mut state = self.state();
        if state
            .take_fault(|fault| matches!(fault, Fault::RetrieveFails))
            .is_some()
        {
            return Err(Error::Api("injected retrieve failure".to_string()));
        }

        let entity = state
            .entities
            .get(&(kind, id.clone()))
            .map(|(entity, _)| entity.clone())
            .ok_or_else(|| Error::NotFound {
                kind,
                id: id.clone(),
            })?;

        if let Some(Fault::ConcurrentWrite { key, value }) =
            state.take_fault(|fault| matches!(fault, Fault::ConcurrentWrite { .. }))
        {
            let mut metadata = entity.metadata.clone();
            metadata.insert(key, value);
            state.bump(kind, id, metadata);
        }

        Ok(entity)
    }

    async fn update_metadata(
        &self,
        kind: EntityKind,
        id: &EntityId,
        metadata: Metadata,
        expected: Option<&EntityVersion>,
    ) -> Result<Entity> {
        let mut state = self.state();
        state.updates.push(UpdateCall {
            kind,
            id: id.clone(),
            metadata: metadata.clone(),
            expected: expected.cloned(),
        });

        if state
            .take_fault(|fault| matches!(fault, Fault::UpdateFails))
            .is_some()
        {
            return Err(Error::Api("injected update failure".to_string()));
        }

        let current = state
            .entities
            .get(&(kind, id.clone()))
            .map(|(entity, _)| entity.version.clone())
            .ok_or_else(|| Error::NotFound {
                kind,
                id: id.clone(),
            })?;
        if let Some(expected) = expected {
            if current.as_ref() != Some(expected) {
                return Err(Error::Conflict {
                    kind,
                    id: id.clone(),
                    reason: format!(
                        "expected version {expected}, found {}",
                        current.map_or_else(|| "none".to_string(), |v| v.to_string())
                    ),
                });
            }
        }

        let updated = state.bump(kind, id, metadata).ok_or_else(|| Error::NotFound {
            kind,
            id: id.clone(),
        })?;
        if state
            .take_fault(|fault| matches!(fault, Fault::UpdateReturnsNoEntity))
            .is_some()
        {
            return Err(Error::MissingEntity {
                kind,
                id: id.clone(),
            });
        }
        Ok(updated)
    }

    async fn list(&self, kind: EntityKind, query: &ListQuery) -> Result<EntityPage> {
        let state = self.state();
        let needle = query.q.as_deref().map(str::to_lowercase);
        let matching = state
            .entities
            .values()
            .map(|(entity, _)| entity)
            .filter(|entity| entity.kind == kind)
            .filter(|entity| {
                needle.as_deref().is_none_or(|needle| {
                    [
                        Some(entity.id.as_str()),
                        entity.title.as_deref(),
                        entity.handle.as_deref(),
                        entity.email.as_deref(),
                    ]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(needle))
                })
            })
            .collect::<Vec<_>>();

        Ok(EntityPage {
            count: matching.len(),
            items: matching
                .into_iter()
                .skip(query.offset)
                .take(query.limit)
                .cloned()
                .collect(),
        })
    }
}
