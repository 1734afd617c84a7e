//! Envelope codec
//!
//! An envelope is a JSON array. The element tagged with the reserved [`META_TAG`]
//! key carries the header; every other element is one exported record. Files
//! written by the oldest format revision have no header at all, so the header is
//! found by its tag, never by position.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{Result, TransferError};

/// Reserved key of the header element
pub const META_TAG: &str = "Meta";

/// Key of the rendered entity inside a record
pub const CARD_KEY: &str = "Card";

/// Header naming the logical entity and the concrete repository type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetaRecord {
    pub entity_name: String,
    pub entity_type_name: String,
}

impl MetaRecord {
    pub fn new(entity_name: impl Into<String>, entity_type_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            entity_type_name: entity_type_name.into(),
        }
    }
}

/// One exported record: `Card` plus related collections, keyed by property name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Decoded file contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub meta: Option<MetaRecord>,
    pub records: Vec<Record>,
}

impl Envelope {
    pub fn new(meta: MetaRecord, records: Vec<Record>) -> Self {
        Self {
            meta: Some(meta),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Serialize an envelope, header first, records in order
pub fn encode(envelope: &Envelope, pretty: bool) -> Result<Vec<u8>> {
    let mut elements = Vec::with_capacity(envelope.records.len() + 1);

    if let Some(meta) = &envelope.meta {
        let meta_value = serde_json::to_value(meta)
            .map_err(|e| TransferError::Format(format!("cannot encode meta record: {}", e)))?;
        let mut element = Map::new();
        element.insert(META_TAG.to_string(), meta_value);
        elements.push(Value::Object(element));
    }

    elements.extend(
        envelope
            .records
            .iter()
            .map(|record| Value::Object(record.as_map().clone())),
    );

    let array = Value::Array(elements);
    let bytes = if pretty {
        serde_json::to_vec_pretty(&array)
    } else {
        serde_json::to_vec(&array)
    };
    bytes.map_err(|e| TransferError::Format(format!("cannot encode envelope: {}", e)))
}

/// Parse an envelope; malformed input yields `Format` with no partial result
pub fn decode(bytes: &[u8]) -> Result<Envelope> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| TransferError::Format(format!("invalid JSON: {}", e)))?;

    let Value::Array(elements) = value else {
        return Err(TransferError::Format(
            "top-level value must be an array of records".to_string(),
        ));
    };

    let mut meta = None;
    let mut records = Vec::with_capacity(elements.len());

    for (position, element) in elements.into_iter().enumerate() {
        let Value::Object(mut map) = element else {
            return Err(TransferError::Format(format!(
                "element {} is not an object",
                position + 1
            )));
        };

        match map.remove(META_TAG) {
            Some(meta_value) => {
                if meta.is_some() {
                    return Err(TransferError::Format(format!(
                        "element {} is a second meta record",
                        position + 1
                    )));
                }
                if !map.is_empty() {
                    let extra: Vec<_> = map.keys().map(String::as_str).collect();
                    return Err(TransferError::Format(format!(
                        "meta record at element {} carries other keys: {}",
                        position + 1,
                        extra.join(", ")
                    )));
                }
                let parsed: MetaRecord = serde_json::from_value(meta_value).map_err(|e| {
                    TransferError::Format(format!("invalid meta record: {}", e))
                })?;
                debug!(
                    "Envelope header at element {}: {} ({})",
                    position + 1,
                    parsed.entity_name,
                    parsed.entity_type_name
                );
                meta = Some(parsed);
            }
            None => records.push(Record(map)),
        }
    }

    Ok(Envelope { meta, records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record(name: &str) -> Record {
        let mut record = Record::new();
        record.insert(CARD_KEY, json!({ "Name": name, "Status": "Active" }));
        record.insert("RecipientLinks", json!([]));
        record
    }

    #[test]
    fn test_meta_is_written_first() {
        let envelope = Envelope::new(
            MetaRecord::new("Role", "Sungero.CoreEntities.IRole"),
            vec![sample_record("Clerks"), sample_record("Auditors")],
        );
        let bytes = encode(&envelope, false).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value[0]["Meta"]["EntityName"], "Role");
        assert_eq!(value[0]["Meta"]["EntityTypeName"], "Sungero.CoreEntities.IRole");
        assert_eq!(value[1]["Card"]["Name"], "Clerks");
        assert_eq!(value[2]["Card"]["Name"], "Auditors");

        assert_eq!(decode(&bytes).unwrap(), envelope);
    }

    #[test]
    fn test_legacy_envelope_has_no_meta() {
        let text = r#"[{"Card": {"Name": "Clerks"}}, {"Card": {"Name": "Auditors"}}]"#;
        let envelope = decode(text.as_bytes()).unwrap();
        assert!(envelope.meta.is_none());
        assert_eq!(envelope.len(), 2);
    }

    #[test]
    fn test_meta_found_by_tag_not_position() {
        let text = r#"[{"Card": {"Name": "Clerks"}}, {"Meta": {"EntityName": "Role", "EntityTypeName": "Sungero.CoreEntities.IRole"}}]"#;
        let envelope = decode(text.as_bytes()).unwrap();
        assert_eq!(envelope.meta.unwrap().entity_name, "Role");
        assert_eq!(envelope.records.len(), 1);
    }

    #[test]
    fn test_empty_array_is_legal() {
        let envelope = decode(b"[]").unwrap();
        assert!(envelope.meta.is_none());
        assert!(envelope.is_empty());
    }

    #[test]
    fn test_byte_order_mark_is_tolerated() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(b"[{\"Card\": {}}]");
        assert_eq!(decode(&bytes).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_input_is_format_error() {
        let inputs: [&[u8]; 4] = [b"{", b"", b"{\"Card\": {}}", b"[1, 2]"];
        for input in inputs {
            assert!(matches!(decode(input), Err(TransferError::Format(_))));
        }
    }

    #[test]
    fn test_second_meta_is_rejected() {
        let text = r#"[{"Meta": {"EntityName": "Role", "EntityTypeName": "T"}}, {"Meta": {"EntityName": "Role", "EntityTypeName": "T"}}]"#;
        assert!(matches!(decode(text.as_bytes()), Err(TransferError::Format(_))));
    }

    #[test]
    fn test_incomplete_meta_is_rejected() {
        let text = r#"[{"Meta": {"EntityName": "Role"}}]"#;
        assert!(matches!(decode(text.as_bytes()), Err(TransferError::Format(_))));
    }

    #[test]
    fn test_meta_mixed_with_record_keys_is_rejected() {
        let text = r#"[{"Meta": {"EntityName": "Role", "EntityTypeName": "T"}, "Card": {"Name": "Clerks"}}]"#;
        match decode(text.as_bytes()) {
            Err(TransferError::Format(message)) => assert!(message.contains("Card")),
            other => panic!("expected a format error, got {:?}", other),
        }
    }
}
