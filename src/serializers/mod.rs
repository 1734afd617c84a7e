//! Built-in serializers and their registration table

pub mod approval_rule;
pub mod document_register;
pub mod registration_group;
pub mod registration_setting;
pub mod role;

pub use approval_rule::ApprovalRuleSerializer;
pub use document_register::DocumentRegisterSerializer;
pub use registration_group::RegistrationGroupSerializer;
pub use registration_setting::RegistrationSettingSerializer;
pub use role::RoleSerializer;

use log::info;

use crate::repository::{Entity, Repository, STATUS_ACTIVE};
use crate::transfer::{ImportedEntity, Result, SerializerRegistry, TransferError};

/// Name of the system role whose `Service User` member fills empty single-user roles
pub const DEFAULT_SERVICE_USERS_ROLE: &str = "Service Users";

/// Settings the built-in serializers depend on
#[derive(Debug, Clone)]
pub struct SerializerOptions {
    pub service_users_role: String,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            service_users_role: DEFAULT_SERVICE_USERS_ROLE.to_string(),
        }
    }
}

/// Registry holding every built-in serializer
pub fn builtin_registry(options: &SerializerOptions) -> Result<SerializerRegistry> {
    SerializerRegistry::new(vec![
        Box::new(ApprovalRuleSerializer::new()),
        Box::new(DocumentRegisterSerializer::new()),
        Box::new(RegistrationGroupSerializer::new()),
        Box::new(RegistrationSettingSerializer::new()),
        Box::new(RoleSerializer::new(&options.service_users_role)),
    ])
}

/// Fail with `Duplicate` when an equivalent record already exists
fn reject_existing(existing: Option<&Entity>, label: &str, name: &str) -> Result<()> {
    match existing {
        Some(entity) => {
            info!("{} '{}' already exists with id {}", label, name, entity.id);
            Err(TransferError::duplicate(label, name))
        }
        None => Ok(()),
    }
}

/// Fresh active entity of `type_name`
async fn create_active(repo: &mut dyn Repository, type_name: &str, label: &str, name: &str) -> Result<Entity> {
    let mut entity = repo.create_entity(type_name).await?;
    info!("Id = {}. Creating {} '{}'", entity.id, label, name);
    entity.set("Name", name);
    entity.set("Status", STATUS_ACTIVE);
    Ok(entity)
}

/// Save one entity and commit the session
async fn commit(repo: &mut dyn Repository, entity: Entity) -> Result<ImportedEntity> {
    let imported = ImportedEntity::of(&entity);
    repo.save(entity).await?;
    repo.submit_changes().await?;
    Ok(imported)
}
