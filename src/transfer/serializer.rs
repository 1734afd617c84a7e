use async_trait::async_trait;

use super::document::render_entity;
use super::envelope::{CARD_KEY, Record};
use super::error::Result;
use crate::repository::{Entity, EntityId, Repository};

/// Entity created by a successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedEntity {
    pub id: EntityId,
    pub type_name: String,
    pub name: String,
}

impl ImportedEntity {
    pub fn of(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            type_name: entity.type_name.clone(),
            name: entity.name().to_string(),
        }
    }
}

/// Converts one logical entity type to and from envelope records
#[async_trait]
pub trait EntitySerializer: Send + Sync {
    /// Logical name used for registry lookup and in the envelope header
    fn entity_name(&self) -> &str;

    /// Repository type queried on export
    fn entity_type_name(&self) -> &str;

    /// Narrow the exported set; identity unless overridden
    fn filter(&self, entities: Vec<Entity>) -> Vec<Entity> {
        entities
    }

    /// Build the record document of one entity
    async fn export(&self, repo: &dyn Repository, entity: &Entity) -> Result<Record> {
        let mut record = Record::new();
        record.insert(CARD_KEY, render_entity(repo, entity).await?);
        Ok(record)
    }

    /// Create, fill and commit one entity from its record
    async fn import(&self, repo: &mut dyn Repository, record: &Record) -> Result<ImportedEntity>;
}

/// Keep only active entities
pub fn active_only(entities: Vec<Entity>) -> Vec<Entity> {
    entities.into_iter().filter(Entity::is_active).collect()
}
