use async_trait::async_trait;
use log::info;

use super::{commit, create_active, reject_existing};
use crate::repository::catalog::{BUSINESS_UNIT, DEPARTMENT, DOCUMENT_KIND, DOCUMENT_REGISTER, REGISTRATION_SETTING};
use crate::repository::{Entity, Repository};
use crate::transfer::document::{reference_list, reference_value, render_entity};
use crate::transfer::resolve::{require_reference, resolve_references};
use crate::transfer::serializer::active_only;
use crate::transfer::{CARD_KEY, EntitySerializer, ImportedEntity, Record, Result};

#[derive(Debug, Default)]
pub struct RegistrationSettingSerializer;

impl RegistrationSettingSerializer {
    pub const ENTITY_NAME: &'static str = "RegistrationSetting";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EntitySerializer for RegistrationSettingSerializer {
    fn entity_name(&self) -> &str {
        Self::ENTITY_NAME
    }

    fn entity_type_name(&self) -> &str {
        REGISTRATION_SETTING
    }

    fn filter(&self, entities: Vec<Entity>) -> Vec<Entity> {
        active_only(entities)
    }

    async fn export(&self, repo: &dyn Repository, entity: &Entity) -> Result<Record> {
        let mut record = Record::new();
        record.insert(CARD_KEY, render_entity(repo, entity).await?);
        record.insert(
            "DocumentRegister",
            reference_value(repo, entity.get_ref("DocumentRegister")).await?,
        );
        record.insert(
            "DocumentKinds",
            reference_list(repo, entity.linked("DocumentKinds", "DocumentKind")).await?,
        );
        record.insert(
            "BusinessUnits",
            reference_list(repo, entity.linked("BusinessUnits", "BusinessUnit")).await?,
        );
        record.insert(
            "Departments",
            reference_list(repo, entity.linked("Departments", "Department")).await?,
        );
        Ok(record)
    }

    async fn import(&self, repo: &mut dyn Repository, record: &Record) -> Result<ImportedEntity> {
        let card = record.card()?;
        let top = record.top();
        let setting_name = card.name()?;
        let document_flow = card.str_required("DocumentFlow")?;
        let setting_type = card.str_required("SettingType")?;

        let existing = repo.get_entities(REGISTRATION_SETTING).await?;
        reject_existing(
            existing.iter().find(|setting| {
                setting.get_str("DocumentFlow") == Some(document_flow)
                    && setting.get_str("SettingType") == Some(setting_type)
                    && setting.name() == setting_name
                    && setting.is_active()
            }),
            "Registration setting",
            setting_name,
        )?;

        info!("Filling document kinds");
        let document_kinds = resolve_references(&*repo, &top, "DocumentKinds", DOCUMENT_KIND, false).await?;
        info!("Filling business units");
        let business_units = resolve_references(&*repo, &top, "BusinessUnits", BUSINESS_UNIT, false).await?;
        info!("Filling departments");
        let departments = resolve_references(&*repo, &top, "Departments", DEPARTMENT, true).await?;
        let register = require_reference(&*repo, &top, "DocumentRegister", DOCUMENT_REGISTER, true).await?;

        let mut setting = create_active(repo, REGISTRATION_SETTING, "registration setting", setting_name).await?;
        setting.set("DocumentFlow", document_flow);
        setting.set("SettingType", setting_type);

        for kind in &document_kinds {
            setting.add_link("DocumentKinds", "DocumentKind", kind);
        }
        for unit in &business_units {
            setting.add_link("BusinessUnits", "BusinessUnit", unit);
        }
        for department in &departments {
            setting.add_link("Departments", "Department", department);
        }
        setting.set_ref("DocumentRegister", &register);

        commit(repo, setting).await
    }
}
