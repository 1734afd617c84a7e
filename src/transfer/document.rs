//! Record documents: reading cards and references, rendering entities
//!
//! A reference is written as a small document carrying the referenced entity's
//! `Name`, concrete type and status. Nothing about the source instance's ids is
//! needed to read it back; resolution happens by name on import.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::envelope::{CARD_KEY, Record};
use super::error::{Result, TransferError};
use crate::repository::{Entity, EntityRef, Fields, Repository};

/// By-name pointer to an entity owned by the target repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReferenceDoc {
    pub name: String,
    #[serde(default)]
    pub entity_type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ReferenceDoc {
    pub fn of(entity: &Entity) -> Self {
        Self {
            name: entity.name().to_string(),
            entity_type_name: entity.type_name.clone(),
            status: entity.status().map(str::to_string),
        }
    }

    fn parse(field: &str, value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| TransferError::invalid(field, format!("not a reference document: {}", e)))
    }
}

/// Read-only view over a JSON object with typed, field-named accessors
#[derive(Debug, Clone, Copy)]
pub struct Card<'a> {
    map: &'a Map<String, Value>,
    context: &'a str,
}

impl<'a> Card<'a> {
    pub fn new(map: &'a Map<String, Value>, context: &'a str) -> Self {
        Self { map, context }
    }

    /// View a nested object; absent or non-object values are an invalid record
    pub fn object(value: Option<&'a Value>, context: &'a str) -> Result<Self> {
        match value {
            Some(Value::Object(map)) => Ok(Self { map, context }),
            Some(_) => Err(TransferError::invalid(context, "expected an object")),
            None => Err(TransferError::invalid(context, "missing")),
        }
    }

    fn field(&self, key: &str) -> String {
        format!("{}.{}", self.context, key)
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        match self.map.get(key) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    /// Non-empty `Name`
    pub fn name(&self) -> Result<&'a str> {
        match self.str_opt("Name")? {
            Some(name) if !name.trim().is_empty() => Ok(name),
            _ => Err(TransferError::invalid(self.field("Name"), "missing or empty")),
        }
    }

    pub fn str_required(&self, key: &str) -> Result<&'a str> {
        self.str_opt(key)?
            .ok_or_else(|| TransferError::invalid(self.field(key), "missing"))
    }

    pub fn str_opt(&self, key: &str) -> Result<Option<&'a str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(TransferError::invalid(self.field(key), "expected a string")),
        }
    }

    /// Enumerated value; an empty string means unset
    pub fn enum_opt(&self, key: &str) -> Result<Option<&'a str>> {
        Ok(self.str_opt(key)?.filter(|s| !s.is_empty()))
    }

    pub fn bool_opt(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(TransferError::invalid(self.field(key), "expected a boolean")),
        }
    }

    pub fn i64_opt(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| TransferError::invalid(self.field(key), "expected an integer")),
        }
    }

    pub fn f64_opt(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| TransferError::invalid(self.field(key), "expected a number")),
        }
    }

    /// Array elements; absent or null is empty
    pub fn array(&self, key: &str) -> Result<&'a [Value]> {
        match self.get(key) {
            None => Ok(Default::default()),
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(_) => Err(TransferError::invalid(self.field(key), "expected an array")),
        }
    }

    pub fn reference(&self, key: &str) -> Result<Option<ReferenceDoc>> {
        self.get(key)
            .map(|value| ReferenceDoc::parse(&self.field(key), value))
            .transpose()
    }

    pub fn references(&self, key: &str) -> Result<Vec<ReferenceDoc>> {
        let field = self.field(key);
        self.array(key)?
            .iter()
            .filter(|value| !value.is_null())
            .map(|value| ReferenceDoc::parse(&field, value))
            .collect()
    }
}

impl Record {
    /// The rendered entity of this record
    pub fn card(&self) -> Result<Card<'_>> {
        Card::object(self.get(CARD_KEY), CARD_KEY)
    }

    /// The record's top level, for related-collection keys next to `Card`
    pub fn top(&self) -> Card<'_> {
        Card::new(self.as_map(), "record")
    }

    /// Card `Name` if readable, for failure reports
    pub fn display_name(&self) -> Option<String> {
        self.card()
            .ok()
            .and_then(|card| card.name().ok().map(str::to_string))
    }
}

/// Reference document for a stored reference, `None` when unset or dangling
pub async fn reference_doc(repo: &dyn Repository, entity_ref: Option<&EntityRef>) -> Result<Option<ReferenceDoc>> {
    let Some(entity_ref) = entity_ref else {
        return Ok(None);
    };
    match repo.get_entity(entity_ref).await? {
        Some(entity) => Ok(Some(ReferenceDoc::of(&entity))),
        None => {
            warn!(
                "Dangling reference to {} {}, exported as null",
                entity_ref.type_name, entity_ref.id
            );
            Ok(None)
        }
    }
}

/// Reference documents of a link column, skipping dangling references
pub async fn reference_docs(repo: &dyn Repository, refs: Vec<&EntityRef>) -> Result<Vec<ReferenceDoc>> {
    let mut docs = Vec::with_capacity(refs.len());
    for entity_ref in refs {
        if let Some(doc) = reference_doc(repo, Some(entity_ref)).await? {
            docs.push(doc);
        }
    }
    Ok(docs)
}

pub async fn reference_value(repo: &dyn Repository, entity_ref: Option<&EntityRef>) -> Result<Value> {
    match reference_doc(repo, entity_ref).await? {
        Some(doc) => to_value(&doc),
        None => Ok(Value::Null),
    }
}

pub async fn reference_list(repo: &dyn Repository, refs: Vec<&EntityRef>) -> Result<Value> {
    to_value(&reference_docs(repo, refs).await?)
}

async fn render_fields(repo: &dyn Repository, fields: &Fields) -> Result<Map<String, Value>> {
    let mut map: Map<String, Value> = fields
        .values
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    for (key, entity_ref) in &fields.refs {
        map.insert(key.clone(), reference_value(repo, Some(entity_ref)).await?);
    }
    Ok(map)
}

/// An entity's card object: `Id`, scalars, references and child collections
pub async fn render_card(repo: &dyn Repository, entity: &Entity) -> Result<Map<String, Value>> {
    let mut card = Map::new();
    card.insert("Id".to_string(), Value::from(entity.id));
    card.extend(render_fields(repo, &entity.fields).await?);

    for (name, rows) in &entity.collections {
        let mut rendered = Vec::with_capacity(rows.len());
        for row in rows {
            rendered.push(Value::Object(render_fields(repo, row).await?));
        }
        card.insert(name.clone(), Value::Array(rendered));
    }

    Ok(card)
}

pub async fn render_entity(repo: &dyn Repository, entity: &Entity) -> Result<Value> {
    Ok(Value::Object(render_card(repo, entity).await?))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| TransferError::Format(e.to_string()))
}
