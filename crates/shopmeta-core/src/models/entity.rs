//! Remote entity model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Open-ended key-value bag attached to a remote entity.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Kinds of remote entities the widgets touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customer,
    Product,
    Collection,
}

impl EntityKind {
    /// Singular resource name, also the response envelope key for one entity.
    #[must_use]
    pub const fn singular(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Product => "product",
            Self::Collection => "collection",
        }
    }

    /// Plural resource name used in admin paths and list envelopes.
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Customer => "customers",
            Self::Product => "products",
            Self::Collection => "collections",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

/// Opaque identifier of a remote entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Build an id, rejecting blank values.
    pub fn new(raw: impl Into<String>) -> crate::Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("entity id must not be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Optimistic-concurrency token for an entity.
///
/// Any change to the entity produces a different version. The HTTP backend
/// derives it from `updated_at`; the in-memory store uses a counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityVersion(String);

impl EntityVersion {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A remote entity as seen by the widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub id: EntityId,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub version: Option<EntityVersion>,
    /// Display title (products, collections)
    #[serde(default)]
    pub title: Option<String>,
    /// URL handle (products, collections)
    #[serde(default)]
    pub handle: Option<String>,
    /// Contact email (customers)
    #[serde(default)]
    pub email: Option<String>,
}

impl Entity {
    /// Create a bare entity with empty metadata.
    #[must_use]
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self {
            kind,
            id,
            metadata: Metadata::new(),
            version: None,
            title: None,
            handle: None,
            email: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    /// Raw metadata value for `field`, if present.
    #[must_use]
    pub fn metadata_value(&self, field: &str) -> Option<&serde_json::Value> {
        self.metadata.get(field)
    }

    /// Label for listings: title, then email, then id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or_else(|| self.id.as_str())
    }
}
