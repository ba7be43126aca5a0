//! Synchronizers mirroring local state into one metadata field of a remote
//! entity.
//!
//! Every write re-fetches the entity, merges the new field value into the
//! freshly fetched metadata bag and updates the entity with the fetched
//! version as precondition. Local state only advances once the store has
//! confirmed the write.

mod flag;
mod list;

use serde_json::Value;

use crate::models::{Entity, EntityId, EntityKind};
use crate::remote::EntityApi;
use crate::Result;

pub use flag::{parse_flag, MetadataFlag};
pub use list::{LoadOutcome, MetadataList};

/// Re-fetch, merge `field = value` into the latest metadata, and update.
///
/// `check` runs against the re-fetched entity before anything is written and
/// can veto the write. `extra` entries are merged alongside the field.
async fn write_field<A, C>(
    api: &A,
    kind: EntityKind,
    id: &EntityId,
    field: &str,
    value: Value,
    extra: Vec<(String, Value)>,
    check: C,
) -> Result<Entity>
where
    A: EntityApi + ?Sized,
    C: FnOnce(&Entity) -> Result<()> + Send,
{
    let latest = api.retrieve(kind, id).await.inspect_err(|error| {
        tracing::error!(%kind, %id, field, %error, "Failed to re-fetch entity before write-back");
    })?;
    check(&latest)?;

    let mut metadata = latest.metadata;
    for (key, extra_value) in extra {
        metadata.insert(key, extra_value);
    }
    metadata.insert(field.to_string(), value);

    api.update_metadata(kind, id, metadata, latest.version.as_ref())
        .await
        .inspect_err(|error| {
            tracing::error!(%kind, %id, field, %error, "Metadata write-back failed");
        })
}
