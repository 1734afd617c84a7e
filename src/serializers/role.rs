use async_trait::async_trait;
use log::{info, warn};
use uuid::Uuid;

use super::{commit, create_active, reject_existing};
use crate::repository::catalog::{RECIPIENT, ROLE};
use crate::repository::{Entity, Repository};
use crate::transfer::document::{reference_list, render_entity};
use crate::transfer::resolve::{find_by_name, resolve_references};
use crate::transfer::{CARD_KEY, EntitySerializer, ImportedEntity, Record, Result, TransferError};

const SERVICE_USER: &str = "Service User";

pub struct RoleSerializer {
    service_users_role: String,
}

impl RoleSerializer {
    pub const ENTITY_NAME: &'static str = "Role";

    pub fn new(service_users_role: impl Into<String>) -> Self {
        Self {
            service_users_role: service_users_role.into(),
        }
    }

    /// `Service User` member of the service-users role
    async fn service_user(&self, repo: &dyn Repository) -> Result<Entity> {
        let role = find_by_name(repo, ROLE, &self.service_users_role, false)
            .await?
            .ok_or_else(|| TransferError::missing("RecipientLinks", ROLE, &self.service_users_role))?;

        for member_ref in role.linked("RecipientLinks", "Member") {
            if let Some(member) = repo.get_entity(member_ref).await? {
                if member.name() == SERVICE_USER {
                    return Ok(member);
                }
            }
        }
        Err(TransferError::missing("RecipientLinks", RECIPIENT, SERVICE_USER))
    }
}

fn parse_sid(value: Option<&str>, role_name: &str) -> Result<Uuid> {
    match value {
        Some(sid) => Uuid::parse_str(sid).map_err(|e| TransferError::invalid("Sid", e.to_string())),
        None => {
            let sid = Uuid::new_v4();
            warn!("Role '{}' has no Sid, assigning {}", role_name, sid);
            Ok(sid)
        }
    }
}

fn same_sid(entity: &Entity, sid: &Uuid) -> bool {
    entity
        .get_str("Sid")
        .and_then(|value| Uuid::parse_str(value).ok())
        .is_some_and(|existing| existing == *sid)
}

#[async_trait]
impl EntitySerializer for RoleSerializer {
    fn entity_name(&self) -> &str {
        Self::ENTITY_NAME
    }

    fn entity_type_name(&self) -> &str {
        ROLE
    }

    async fn export(&self, repo: &dyn Repository, entity: &Entity) -> Result<Record> {
        let mut record = Record::new();
        record.insert(CARD_KEY, render_entity(repo, entity).await?);
        record.insert(
            "RecipientLinks",
            reference_list(repo, entity.linked("RecipientLinks", "Member")).await?,
        );
        record.insert("Sid", entity.get_str("Sid"));
        Ok(record)
    }

    async fn import(&self, repo: &mut dyn Repository, record: &Record) -> Result<ImportedEntity> {
        let card = record.card()?;
        let top = record.top();
        let role_name = card.name()?;
        let sid_text = match top.str_opt("Sid")? {
            Some(sid) => Some(sid),
            None => card.str_opt("Sid")?,
        };
        let sid = parse_sid(sid_text, role_name)?;

        let existing = repo.get_entities(ROLE).await?;
        reject_existing(
            existing
                .iter()
                .find(|role| same_sid(role, &sid) || role.name() == role_name),
            "Role",
            role_name,
        )?;

        info!("Filling role members");
        let members = resolve_references(&*repo, &top, "RecipientLinks", RECIPIENT, true).await?;

        let mut role = create_active(repo, ROLE, "role", role_name).await?;
        role.set("Sid", sid.to_string());
        role.set("Description", card.str_opt("Description")?);
        let is_single_user = card.bool_opt("IsSingleUser")?;
        role.set("IsSingleUser", is_single_user);

        for member in &members {
            role.add_link("RecipientLinks", "Member", member);
        }

        if is_single_user.unwrap_or(false) && members.is_empty() {
            let service_user = self.service_user(&*repo).await?;
            role.add_link("RecipientLinks", "Member", &service_user);
            info!("Role '{}' filled with the service user", role_name);
        }

        commit(repo, role).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sid_parsing() {
        let sid = parse_sid(Some("6f8b3c1e-2a4d-4e5f-9b0a-1c2d3e4f5a6b"), "Clerks").unwrap();
        assert_eq!(sid.to_string(), "6f8b3c1e-2a4d-4e5f-9b0a-1c2d3e4f5a6b");
        assert!(parse_sid(Some("not-a-guid"), "Clerks").is_err());
        assert!(parse_sid(None, "Clerks").is_ok());
    }

    #[test]
    fn test_sid_comparison_ignores_case() {
        let mut role = Entity::new(1, ROLE);
        role.set("Sid", "6F8B3C1E-2A4D-4E5F-9B0A-1C2D3E4F5A6B");
        let sid = Uuid::parse_str("6f8b3c1e-2a4d-4e5f-9b0a-1c2d3e4f5a6b").unwrap();
        assert!(same_sid(&role, &sid));
    }
}
