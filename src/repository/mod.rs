//! Repository collaborator interface
//!
//! The host platform is reached through a [`Repository`] session. One session is
//! shared by every record of a pipeline run: entities created and committed while
//! importing one record are visible to the records after it.

pub mod catalog;
pub mod entity;
pub mod memory;

pub use entity::{Entity, EntityId, EntityRef, Fields, STATUS_ACTIVE, STATUS_CLOSED};
pub use memory::MemoryRepository;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("entity {id} of type {type_name} does not exist")]
    EntityNotFound { id: EntityId, type_name: String },
    #[error("cannot create an entity without a type name")]
    EmptyTypeName,
    #[error("entity {id} was not created by this session")]
    UnknownDraft { id: EntityId },
    #[error("snapshot io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot parse error at {path:?}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Session against one platform instance
#[async_trait]
pub trait Repository: Send + Sync {
    /// Committed entities whose type is `type_name` or derives from it, in enumeration order
    async fn get_entities(&self, type_name: &str) -> Result<Vec<Entity>, RepositoryError>;

    /// Committed entity behind a reference
    async fn get_entity(&self, entity_ref: &EntityRef) -> Result<Option<Entity>, RepositoryError>;

    /// Fresh draft with a newly allocated id; invisible until saved and submitted
    async fn create_entity(&mut self, type_name: &str) -> Result<Entity, RepositoryError>;

    /// Stage an entity into the pending changes of the session
    async fn save(&mut self, entity: Entity) -> Result<(), RepositoryError>;

    /// Commit pending changes
    async fn submit_changes(&mut self) -> Result<(), RepositoryError>;
}
