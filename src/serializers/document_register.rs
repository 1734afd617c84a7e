use async_trait::async_trait;
use log::info;
use serde_json::Value;

use super::{commit, create_active, reject_existing};
use crate::repository::catalog::{DOCUMENT_REGISTER, REGISTRATION_GROUP};
use crate::repository::{Entity, Fields, Repository};
use crate::transfer::document::{Card, reference_value, render_entity};
use crate::transfer::resolve::optional_reference;
use crate::transfer::serializer::active_only;
use crate::transfer::{CARD_KEY, EntitySerializer, ImportedEntity, Record, Result, TransferError};

#[derive(Debug, Default)]
pub struct DocumentRegisterSerializer;

impl DocumentRegisterSerializer {
    pub const ENTITY_NAME: &'static str = "DocumentRegister";

    pub fn new() -> Self {
        Self
    }
}

/// `NumberFormatItems` rows of the card
fn number_format_items(card: &Card<'_>) -> Result<Vec<Fields>> {
    card.array("NumberFormatItems")?
        .iter()
        .map(|item| {
            let Value::Object(map) = item else {
                return Err(TransferError::invalid("Card.NumberFormatItems", "expected an object"));
            };
            let item = Card::new(map, "Card.NumberFormatItems");
            Ok(Fields::new()
                .with("Number", item.i64_opt("Number")?)
                .with("Separator", item.str_opt("Separator")?)
                .with("Element", item.enum_opt("Element")?))
        })
        .collect()
}

#[async_trait]
impl EntitySerializer for DocumentRegisterSerializer {
    fn entity_name(&self) -> &str {
        Self::ENTITY_NAME
    }

    fn entity_type_name(&self) -> &str {
        DOCUMENT_REGISTER
    }

    fn filter(&self, entities: Vec<Entity>) -> Vec<Entity> {
        active_only(entities)
    }

    async fn export(&self, repo: &dyn Repository, entity: &Entity) -> Result<Record> {
        let mut record = Record::new();
        record.insert(CARD_KEY, render_entity(repo, entity).await?);
        record.insert(
            "RegistrationGroup",
            reference_value(repo, entity.get_ref("RegistrationGroup")).await?,
        );
        Ok(record)
    }

    async fn import(&self, repo: &mut dyn Repository, record: &Record) -> Result<ImportedEntity> {
        let card = record.card()?;
        let register_name = card.name()?;
        let document_flow = card.str_required("DocumentFlow")?;

        let existing = repo.get_entities(DOCUMENT_REGISTER).await?;
        reject_existing(
            existing.iter().find(|register| {
                register.get_str("DocumentFlow") == Some(document_flow)
                    && register.name() == register_name
                    && register.is_active()
            }),
            "Document register",
            register_name,
        )?;

        let format_items = number_format_items(&card)?;
        let registration_group =
            optional_reference(&*repo, &record.top(), "RegistrationGroup", REGISTRATION_GROUP, true).await?;

        let mut register = create_active(repo, DOCUMENT_REGISTER, "document register", register_name).await?;
        register.set("DocumentFlow", document_flow);
        register.set("Index", card.str_opt("Index")?);
        register.set("NumberOfDigitsInNumber", card.i64_opt("NumberOfDigitsInNumber")?);
        register.set("RegisterType", card.enum_opt("RegisterType")?);
        register.set("NumberingPeriod", card.enum_opt("NumberingPeriod")?);
        register.set("NumberingSection", card.enum_opt("NumberingSection")?);

        register.clear_collection("NumberFormatItems");
        for item in format_items {
            register.add_row("NumberFormatItems", item);
        }

        if let Some(group) = &registration_group {
            info!("Registration group '{}' attached", group.name());
            register.set_ref("RegistrationGroup", group);
        }

        commit(repo, register).await
    }
}
