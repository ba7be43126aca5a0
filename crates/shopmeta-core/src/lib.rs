//! shopmeta-core - Core library for shopmeta
//!
//! Customer notes, a password-change restriction and product quicklinks,
//! each stored in the `metadata` bag of an entity owned by a remote
//! e-commerce admin API. This crate holds the models, the remote API seam
//! and the synchronizers that keep a local copy in step with the store.

pub mod codec;
pub mod config;
pub mod error;
pub mod models;
pub mod navigation;
pub mod remote;
pub mod sync;
pub mod util;
pub mod widgets;

pub use error::{Error, Result};
pub use models::{Entity, EntityId, EntityKind, Note, NoteKey, Quicklink, QuicklinkId};
