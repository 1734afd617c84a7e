//! Serializer registration table
//!
//! Lookup is by logical entity name. Registering two serializers under the same
//! name is rejected when the table is built.

use log::debug;

use super::error::{Result, TransferError};
use super::serializer::EntitySerializer;

#[derive(Default)]
pub struct SerializerRegistry {
    serializers: Vec<Box<dyn EntitySerializer>>,
}

impl SerializerRegistry {
    pub fn new(serializers: Vec<Box<dyn EntitySerializer>>) -> Result<Self> {
        let mut registry = Self::default();
        for serializer in serializers {
            registry.register(serializer)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, serializer: Box<dyn EntitySerializer>) -> Result<()> {
        if self.get(serializer.entity_name()).is_some() {
            return Err(TransferError::DuplicateSerializer {
                name: serializer.entity_name().to_string(),
            });
        }
        debug!(
            "Registered serializer {} for {}",
            serializer.entity_name(),
            serializer.entity_type_name()
        );
        self.serializers.push(serializer);
        Ok(())
    }

    /// Serializer for a logical name; `None` is an expected outcome
    pub fn get(&self, entity_name: &str) -> Option<&dyn EntitySerializer> {
        self.serializers
            .iter()
            .find(|serializer| serializer.entity_name() == entity_name)
            .map(|serializer| &**serializer)
    }

    /// Like [`get`](Self::get), mapping absence to `SerializerNotFound`
    pub fn require(&self, entity_name: &str) -> Result<&dyn EntitySerializer> {
        self.get(entity_name)
            .ok_or_else(|| TransferError::SerializerNotFound {
                name: entity_name.to_string(),
            })
    }

    /// (logical name, concrete type) pairs in registration order
    pub fn entries(&self) -> Vec<(&str, &str)> {
        self.serializers
            .iter()
            .map(|serializer| (serializer.entity_name(), serializer.entity_type_name()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.serializers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serializers.is_empty()
    }
}

impl std::fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries()).finish()
    }
}
