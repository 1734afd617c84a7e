//! Entity model shared by the repository and the serializers
//!
//! Property names are the host platform's own names, verbatim and case-sensitive.
//! An entity is a flat set of scalar values, single-entity references, and named
//! child collections whose rows carry the same two kinds of fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type EntityId = i64;

/// `Status` value of a live record
pub const STATUS_ACTIVE: &str = "Active";
/// `Status` value of a retired record
pub const STATUS_CLOSED: &str = "Closed";

/// Pointer to another entity in the same repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityId,
    pub type_name: String,
}

/// Scalar values plus single-entity references
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fields {
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
    #[serde(default)]
    pub refs: BTreeMap<String, EntityRef>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style scalar setter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder-style reference setter
    pub fn with_ref(mut self, key: impl Into<String>, entity: &Entity) -> Self {
        self.set_ref(key, entity);
        self
    }

    /// Set a scalar value; `null` removes the property
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        match value.into() {
            Value::Null => {
                self.values.remove(&key);
            }
            value => {
                self.values.insert(key, value);
            }
        }
    }

    pub fn set_ref(&mut self, key: impl Into<String>, entity: &Entity) {
        self.refs.insert(key.into(), entity.to_ref());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(Value::as_i64)
    }

    pub fn get_ref(&self, key: &str) -> Option<&EntityRef> {
        self.refs.get(key)
    }
}

/// A record stored in the repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub type_name: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default)]
    pub collections: BTreeMap<String, Vec<Fields>>,
}

impl Entity {
    pub fn new(id: EntityId, type_name: impl Into<String>) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            fields: Fields::default(),
            collections: BTreeMap::new(),
        }
    }

    pub fn to_ref(&self) -> EntityRef {
        EntityRef {
            id: self.id,
            type_name: self.type_name.clone(),
        }
    }

    /// `Name` property, empty when unset
    pub fn name(&self) -> &str {
        self.fields.get_str("Name").unwrap_or_default()
    }

    pub fn status(&self) -> Option<&str> {
        self.fields.get_str("Status")
    }

    pub fn is_active(&self) -> bool {
        self.status() == Some(STATUS_ACTIVE)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.set(key, value);
    }

    pub fn set_ref(&mut self, key: impl Into<String>, entity: &Entity) {
        self.fields.set_ref(key, entity);
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get_str(key)
    }

    pub fn get_ref(&self, key: &str) -> Option<&EntityRef> {
        self.fields.get_ref(key)
    }

    /// Rows of a child collection, empty when the collection was never filled
    pub fn collection(&self, name: &str) -> &[Fields] {
        self.collections
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Append a row to a child collection
    pub fn add_row(&mut self, name: impl Into<String>, row: Fields) {
        self.collections.entry(name.into()).or_default().push(row);
    }

    /// Append a single-link row (`{ link_key: entity }`) to a child collection
    pub fn add_link(&mut self, name: impl Into<String>, link_key: &str, entity: &Entity) {
        self.add_row(name, Fields::new().with_ref(link_key, entity));
    }

    /// References held by one link column of a child collection, in row order
    pub fn linked(&self, name: &str, link_key: &str) -> Vec<&EntityRef> {
        self.collection(name)
            .iter()
            .filter_map(|row| row.get_ref(link_key))
            .collect()
    }

    pub fn clear_collection(&mut self, name: &str) {
        self.collections.remove(name);
    }
}
