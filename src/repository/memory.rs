//! In-memory repository session with an optional JSON snapshot file

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::catalog;
use super::{Entity, EntityId, EntityRef, Repository, RepositoryError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    next_id: EntityId,
    entities: Vec<Entity>,
}

/// Repository held entirely in memory
///
/// When opened from a snapshot path, every `submit_changes` writes the committed
/// state back to that file.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    committed: BTreeMap<EntityId, Entity>,
    pending: BTreeMap<EntityId, Entity>,
    drafts: BTreeSet<EntityId>,
    next_id: EntityId,
    snapshot_path: Option<PathBuf>,
    calls: AtomicUsize,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Load a snapshot file; a missing file yields an empty repository bound to that path
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();
        let mut repository = Self::new();

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let snapshot: Snapshot =
                    serde_json::from_str(&content).map_err(|source| RepositoryError::Snapshot {
                        path: path.clone(),
                        source,
                    })?;

                let max_id = snapshot.entities.iter().map(|e| e.id).max().unwrap_or(0);
                repository.next_id = snapshot.next_id.max(max_id + 1);
                repository.committed = snapshot
                    .entities
                    .into_iter()
                    .map(|entity| (entity.id, entity))
                    .collect();
                info!(
                    "Loaded {} entities from snapshot {:?}",
                    repository.committed.len(),
                    path
                );
            }
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                info!("Snapshot {:?} does not exist, starting empty", path);
            }
            Err(source) => {
                return Err(RepositoryError::Io {
                    path: path.clone(),
                    source,
                });
            }
        }

        repository.snapshot_path = Some(path);
        Ok(repository)
    }

    /// Insert a committed entity directly, bypassing the session
    pub fn add(&mut self, type_name: &str, build: impl FnOnce(&mut Entity)) -> Entity {
        let mut entity = Entity::new(self.allocate_id(), type_name);
        build(&mut entity);
        self.committed.insert(entity.id, entity.clone());
        entity
    }

    /// Number of trait calls made against this session
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Committed entities of exactly this concrete type
    pub fn entities_of_exact_type(&self, type_name: &str) -> Vec<&Entity> {
        self.committed
            .values()
            .filter(|entity| entity.type_name == type_name)
            .collect()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.committed.get(&id)
    }

    fn allocate_id(&mut self) -> EntityId {
        if self.next_id < 1 {
            self.next_id = 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn track_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    async fn write_snapshot(&self, path: &Path) -> Result<(), RepositoryError> {
        let snapshot = Snapshot {
            next_id: self.next_id,
            entities: self.committed.values().cloned().collect(),
        };
        let content =
            serde_json::to_string_pretty(&snapshot).map_err(|source| RepositoryError::Snapshot {
                path: path.to_path_buf(),
                source,
            })?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| RepositoryError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Snapshot written to {:?}", path);
        Ok(())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_entities(&self, type_name: &str) -> Result<Vec<Entity>, RepositoryError> {
        self.track_call();
        Ok(self
            .committed
            .values()
            .filter(|entity| catalog::is_assignable(&entity.type_name, type_name))
            .cloned()
            .collect())
    }

    async fn get_entity(&self, entity_ref: &EntityRef) -> Result<Option<Entity>, RepositoryError> {
        self.track_call();
        Ok(self.committed.get(&entity_ref.id).cloned())
    }

    async fn create_entity(&mut self, type_name: &str) -> Result<Entity, RepositoryError> {
        self.track_call();
        if type_name.trim().is_empty() {
            return Err(RepositoryError::EmptyTypeName);
        }
        let id = self.allocate_id();
        self.drafts.insert(id);
        debug!("Allocated draft {} of type {}", id, type_name);
        Ok(Entity::new(id, type_name))
    }

    async fn save(&mut self, entity: Entity) -> Result<(), RepositoryError> {
        self.track_call();
        if !self.drafts.contains(&entity.id) && !self.committed.contains_key(&entity.id) {
            return Err(RepositoryError::UnknownDraft { id: entity.id });
        }
        self.pending.insert(entity.id, entity);
        Ok(())
    }

    async fn submit_changes(&mut self) -> Result<(), RepositoryError> {
        self.track_call();
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for (id, entity) in pending {
            self.drafts.remove(&id);
            self.committed.insert(id, entity);
        }
        debug!("Committed {} pending entities", count);

        if let Some(path) = self.snapshot_path.clone() {
            self.write_snapshot(&path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{STATUS_ACTIVE, catalog};

    #[tokio::test]
    async fn test_drafts_are_invisible_until_submitted() {
        let mut repo = MemoryRepository::new();
        let mut role = repo.create_entity(catalog::ROLE).await.unwrap();
        role.set("Name", "Clerks");
        repo.save(role.clone()).await.unwrap();

        assert!(repo.get_entities(catalog::ROLE).await.unwrap().is_empty());
        assert_eq!(repo.pending_len(), 1);

        repo.submit_changes().await.unwrap();
        let roles = repo.get_entities(catalog::RECIPIENT).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name(), "Clerks");
        assert_eq!(repo.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_save_rejects_foreign_entity() {
        let mut repo = MemoryRepository::new();
        let stranger = Entity::new(99, catalog::ROLE);
        assert!(matches!(
            repo.save(stranger).await,
            Err(RepositoryError::UnknownDraft { id: 99 })
        ));
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.json");

        let mut repo = MemoryRepository::open(&path).await.unwrap();
        assert!(repo.is_empty());
        let mut unit = repo.create_entity(catalog::BUSINESS_UNIT).await.unwrap();
        unit.set("Name", "Head office");
        unit.set("Status", STATUS_ACTIVE);
        repo.save(unit).await.unwrap();
        repo.submit_changes().await.unwrap();

        let mut reopened = MemoryRepository::open(&path).await.unwrap();
        assert_eq!(reopened.len(), 1);
        let next = reopened.create_entity(catalog::DEPARTMENT).await.unwrap();
        assert!(next.id > 1);
    }

    #[test]
    fn test_add_commits_immediately() {
        let mut repo = MemoryRepository::new();
        let first = repo.add(catalog::CURRENCY, |e| e.set("Name", "EUR"));
        let second = repo.add(catalog::CURRENCY, |e| e.set("Name", "USD"));
        assert_eq!(first.id + 1, second.id);
        assert_eq!(repo.get(first.id).map(Entity::name), Some("EUR"));
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();
        assert!(matches!(
            MemoryRepository::open(&path).await,
            Err(RepositoryError::Snapshot { .. })
        ));
    }
}
