//! Single boolean mirrored into one metadata field.

use serde_json::Value;
use tokio::sync::Mutex;

use super::write_field;
use crate::models::{EntityId, EntityKind};
use crate::remote::EntityApi;
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct FlagState {
    entity_id: EntityId,
    value: bool,
}

/// Local mirror of a boolean stored under `field` of one remote entity.
///
/// Absent or unrecognized values read as `default`.
pub struct MetadataFlag<A> {
    api: A,
    kind: EntityKind,
    field: String,
    default: bool,
    state: Mutex<Option<FlagState>>,
}

impl<A: EntityApi> MetadataFlag<A> {
    pub fn new(api: A, kind: EntityKind, field: impl Into<String>, default: bool) -> Self {
        Self {
            api,
            kind,
            field: field.into(),
            default,
            state: Mutex::new(None),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Fetch the entity and read the flag.
    pub async fn load(&self, entity_id: &EntityId) -> Result<bool> {
        let mut guard = self.state.lock().await;
        let entity = self
            .api
            .retrieve(self.kind, entity_id)
            .await
            .inspect_err(|error| {
                tracing::error!(kind = %self.kind, id = %entity_id, %error, "Failed to load entity");
            })?;

        let value = parse_flag(entity.metadata_value(&self.field), self.default);
        *guard = Some(FlagState {
            entity_id: entity_id.clone(),
            value,
        });
        Ok(value)
    }

    /// Last confirmed value, `None` before `load`.
    pub async fn value(&self) -> Option<bool> {
        self.state.lock().await.as_ref().map(|state| state.value)
    }

    /// Write `value` and commit it locally once confirmed.
    ///
    /// On failure the local value stays at the last confirmed one.
    pub async fn set(&self, value: bool) -> Result<bool> {
        let mut guard = self.state.lock().await;
        let state = guard
            .as_mut()
            .ok_or_else(|| Error::NotLoaded(self.field.clone()))?;

        let updated = write_field(
            &self.api,
            self.kind,
            &state.entity_id,
            &self.field,
            Value::Bool(value),
            Vec::new(),
            |_| Ok(()),
        )
        .await?;

        state.value = parse_flag(updated.metadata_value(&self.field), value);
        tracing::info!(
            kind = %self.kind,
            id = %state.entity_id,
            field = %self.field,
            value = state.value,
            "Committed flag write-back"
        );
        Ok(state.value)
    }
}

/// Read a loosely typed boolean: JSON booleans and `"true"`/`"false"`
/// strings; anything else is `default`.
pub fn parse_flag(value: Option<&Value>, default: bool) -> bool {
    match value {
        None | Some(Value::Null) => default,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(raw)) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            _ => default,
        },
        Some(other) => {
            tracing::warn!(value = %other, "Unrecognized flag value; using default");
            default
        }
    }
}
