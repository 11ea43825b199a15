//! In-memory entity engine backing local runs and tests.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::{Timestamp, Uuid};

use crate::{Entity, EntityStore, StoreError};

/// Entity engine keeping everything in process memory. Insertion order is
/// iteration order, so listings are stable across reads.
pub struct MemoryStore {
    entities: RwLock<IndexMap<Uuid, Entity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(IndexMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EntityStore for MemoryStore {
    async fn load_all_by_kind(&self, kind: &str) -> Result<Vec<Entity>, StoreError> {
        let entities = self.entities.read().await;
        Ok(entities
            .values()
            .filter(|entity| entity.kind() == kind)
            .cloned()
            .collect())
    }

    async fn load_by_id(&self, id: Uuid) -> Result<Option<Entity>, StoreError> {
        let entities = self.entities.read().await;
        Ok(entities.get(&id).cloned())
    }

    async fn create(&self, kind: &str, fields: Map<String, Value>) -> Result<Entity, StoreError> {
        let id = Uuid::new_v7(Timestamp::now(uuid::NoContext));
        let entity = Entity::new(id, kind, fields);

        let mut entities = self.entities.write().await;
        entities.insert(id, entity.clone());

        tracing::debug!(%id, kind, "entity created");
        Ok(entity)
    }

    async fn save(&self, entity: &Entity) -> Result<(), StoreError> {
        let mut entities = self.entities.write().await;
        match entities.get_mut(&entity.id()) {
            Some(stored) => {
                *stored = entity.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(entity.id())),
        }
    }

    async fn delete(&self, entity: &Entity) -> Result<(), StoreError> {
        let mut entities = self.entities.write().await;
        // shift_remove keeps the iteration order of the survivors intact.
        entities
            .shift_remove(&entity.id())
            .map(|_| ())
            .ok_or(StoreError::NotFound(entity.id()))
    }
}
