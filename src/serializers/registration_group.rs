use async_trait::async_trait;
use log::info;

use super::{commit, create_active, reject_existing};
use crate::repository::catalog::{DEPARTMENT, EMPLOYEE, RECIPIENT, REGISTRATION_GROUP};
use crate::repository::{Entity, Repository};
use crate::transfer::document::{reference_list, reference_value, render_entity};
use crate::transfer::resolve::{optional_reference, require_reference, resolve_references};
use crate::transfer::serializer::active_only;
use crate::transfer::{CARD_KEY, EntitySerializer, ImportedEntity, Record, Result};

const REGISTRATION_FLAGS: [&str; 4] = [
    "CanRegisterIncoming",
    "CanRegisterOutgoing",
    "CanRegisterInternal",
    "CanRegisterContractual",
];

#[derive(Debug, Default)]
pub struct RegistrationGroupSerializer;

impl RegistrationGroupSerializer {
    pub const ENTITY_NAME: &'static str = "RegistrationGroup";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EntitySerializer for RegistrationGroupSerializer {
    fn entity_name(&self) -> &str {
        Self::ENTITY_NAME
    }

    fn entity_type_name(&self) -> &str {
        REGISTRATION_GROUP
    }

    fn filter(&self, entities: Vec<Entity>) -> Vec<Entity> {
        active_only(entities)
    }

    async fn export(&self, repo: &dyn Repository, entity: &Entity) -> Result<Record> {
        let mut record = Record::new();
        record.insert(CARD_KEY, render_entity(repo, entity).await?);
        record.insert(
            "Departments",
            reference_list(repo, entity.linked("Departments", "Department")).await?,
        );
        record.insert(
            "RecipientLinks",
            reference_list(repo, entity.linked("RecipientLinks", "Member")).await?,
        );
        record.insert(
            "ResponsibleEmployee",
            reference_value(repo, entity.get_ref("ResponsibleEmployee")).await?,
        );
        record.insert("Parent", reference_value(repo, entity.get_ref("Parent")).await?);
        Ok(record)
    }

    async fn import(&self, repo: &mut dyn Repository, record: &Record) -> Result<ImportedEntity> {
        let card = record.card()?;
        let top = record.top();
        let group_name = card.name()?;
        let index = card.str_opt("Index")?;

        let existing = repo.get_entities(REGISTRATION_GROUP).await?;
        reject_existing(
            existing.iter().find(|group| {
                group.get_str("Index") == index && group.name() == group_name && group.is_active()
            }),
            "Registration group",
            group_name,
        )?;

        info!("Filling members");
        let members = resolve_references(&*repo, &top, "RecipientLinks", RECIPIENT, true).await?;
        let responsible = require_reference(&*repo, &top, "ResponsibleEmployee", EMPLOYEE, true).await?;
        info!("Filling departments");
        let departments = resolve_references(&*repo, &top, "Departments", DEPARTMENT, true).await?;
        let parent = optional_reference(&*repo, &top, "Parent", REGISTRATION_GROUP, true).await?;

        let mut group = create_active(repo, REGISTRATION_GROUP, "registration group", group_name).await?;
        group.set("Index", index);
        group.set("Description", card.str_opt("Description")?);
        for flag in REGISTRATION_FLAGS {
            group.set(flag, card.bool_opt(flag)?);
        }

        for member in &members {
            group.add_link("RecipientLinks", "Member", member);
        }
        group.set_ref("ResponsibleEmployee", &responsible);
        for department in &departments {
            group.add_link("Departments", "Department", department);
        }
        if let Some(parent) = &parent {
            group.set_ref("Parent", parent);
        }

        commit(repo, group).await
    }
}
