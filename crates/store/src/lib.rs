//! Entity storage for FOLIO content kinds.
//!
//! Every stored item is an [`Entity`]: a record with a storage-assigned id,
//! a kind discriminator (`"book"`, `"author"`, ...), and a flat field map.
//! Engines implement [`EntityStore`] so the rest of the system never talks
//! to a concrete backend directly.

pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by a storage engine. No retry policy lives here;
/// callers propagate these as server errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no entity with id {0}")]
    NotFound(Uuid),

    #[error("storage engine failure: {0}")]
    Engine(String),
}

/// A storage-managed content item.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: Uuid,
    kind: String,
    fields: Map<String, Value>,
}

impl Entity {
    pub fn new(id: Uuid, kind: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id,
            kind: kind.into(),
            fields,
        }
    }

    /// Storage-assigned identifier, immutable after creation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Kind discriminator this entity was created under.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Read a field by name. Fields never written are absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Write a field by name, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }
}

/// Storage engine contract. All durability and concurrent-write arbitration
/// is the engine's business; callers impose no ordering or locking of their
/// own.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// All entities of the given kind, in storage iteration order.
    async fn load_all_by_kind(&self, kind: &str) -> Result<Vec<Entity>, StoreError>;

    /// Single entity lookup; `Ok(None)` when the id resolves to nothing.
    async fn load_by_id(&self, id: Uuid) -> Result<Option<Entity>, StoreError>;

    /// Create and persist a fresh entity of the given kind. The engine
    /// assigns the id.
    async fn create(&self, kind: &str, fields: Map<String, Value>) -> Result<Entity, StoreError>;

    /// Persist field changes on an existing entity.
    async fn save(&self, entity: &Entity) -> Result<(), StoreError>;

    /// Hard-delete an entity. No soft-delete or versioning.
    async fn delete(&self, entity: &Entity) -> Result<(), StoreError>;
}
