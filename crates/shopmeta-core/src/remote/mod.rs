//! Remote entity API consumed by the synchronizers.
//!
//! The admin API owns customers, products and collections; this crate only
//! reads them, lists them for pickers, and writes their `metadata` bag back.

mod http;
mod memory;

use async_trait::async_trait;

use crate::models::{Entity, EntityId, EntityKind, EntityVersion, Metadata};
use crate::Result;

pub use http::HttpEntityApi;
pub use memory::{Fault, InMemoryEntityApi, UpdateCall};

/// Default page size for picker searches.
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Search and pagination parameters for `EntityApi::list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Free-text search term
    pub q: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            q: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl ListQuery {
    /// Search for `term`; blank terms list everything.
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            q: crate::util::normalize_text_option(Some(term.into())),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub const fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityPage {
    pub items: Vec<Entity>,
    /// Total matches across all pages
    pub count: usize,
}

/// Operations offered by the remote admin API.
#[async_trait]
pub trait EntityApi: Send + Sync {
    /// Fetch one entity including its metadata bag.
    async fn retrieve(&self, kind: EntityKind, id: &EntityId) -> Result<Entity>;

    /// Replace the entity's metadata bag and return the updated entity.
    ///
    /// When `expected` is set the store must reject the write with
    /// `Error::Conflict` if the entity's current version differs.
    async fn update_metadata(
        &self,
        kind: EntityKind,
        id: &EntityId,
        metadata: Metadata,
        expected: Option<&EntityVersion>,
    ) -> Result<Entity>;

    /// Search entities of `kind`.
    async fn list(&self, kind: EntityKind, query: &ListQuery) -> Result<EntityPage>;
}
