//! Stage, condition and transition sub-records of an approval rule
//!
//! Stages and conditions share one `Number` space inside a rule; transitions refer
//! to those numbers on both ends. Numbers travel unchanged through export and
//! import, so no id remapping table is needed.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::transfer::{Record, ReferenceDoc, Result, TransferError};

pub const STAGES_KEY: &str = "Stages";
pub const CONDITIONS_KEY: &str = "Conditions";
pub const TRANSITIONS_KEY: &str = "Transitions";

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StageRecord {
    pub number: i64,
    pub stage_object: Map<String, Value>,
    #[serde(default)]
    pub approval_role: Option<ReferenceDoc>,
    #[serde(default)]
    pub assignee: Option<ReferenceDoc>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub approval_roles: Vec<ReferenceDoc>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub recipients: Vec<ReferenceDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConditionRecord {
    pub number: i64,
    /// `Card` plus the condition's reference keys
    pub condition_object: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransitionRecord {
    pub source_stage: Option<i64>,
    pub target_stage: Option<i64>,
    /// `None` is an unconditional transition
    pub condition_value: Option<bool>,
}

/// The directed graph carried by one rule record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleGraph {
    pub stages: Vec<StageRecord>,
    pub conditions: Vec<ConditionRecord>,
    pub transitions: Vec<TransitionRecord>,
}

fn parse_list<T: for<'de> Deserialize<'de>>(record: &Record, key: &str) -> Result<Vec<T>> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| TransferError::invalid(key, e.to_string())),
    }
}

fn to_list<T: Serialize>(key: &str, items: &[T]) -> Result<Value> {
    serde_json::to_value(items).map_err(|e| TransferError::invalid(key, e.to_string()))
}

impl RuleGraph {
    /// Read the three sub-record lists, stages and conditions ordered by `Number`
    pub fn from_record(record: &Record) -> Result<Self> {
        let mut graph = Self {
            stages: parse_list(record, STAGES_KEY)?,
            conditions: parse_list(record, CONDITIONS_KEY)?,
            transitions: parse_list(record, TRANSITIONS_KEY)?,
        };
        graph.stages.sort_by_key(|stage| stage.number);
        graph.conditions.sort_by_key(|condition| condition.number);
        Ok(graph)
    }

    /// Write the three lists into a rule record
    pub fn write_to(&self, record: &mut Record) -> Result<()> {
        record.insert(STAGES_KEY, to_list(STAGES_KEY, &self.stages)?);
        record.insert(CONDITIONS_KEY, to_list(CONDITIONS_KEY, &self.conditions)?);
        record.insert(TRANSITIONS_KEY, to_list(TRANSITIONS_KEY, &self.transitions)?);
        Ok(())
    }

    /// Reject reused numbers and transitions that point nowhere
    pub fn validate(&self) -> Result<()> {
        let mut numbers = BTreeSet::new();
        let node_numbers = self
            .stages
            .iter()
            .map(|stage| (STAGES_KEY, stage.number))
            .chain(self.conditions.iter().map(|condition| (CONDITIONS_KEY, condition.number)));

        for (key, number) in node_numbers {
            if number <= 0 {
                return Err(TransferError::invalid(
                    format!("{}.Number", key),
                    format!("{} is not a positive number", number),
                ));
            }
            if !numbers.insert(number) {
                return Err(TransferError::invalid(
                    format!("{}.Number", key),
                    format!("number {} is used more than once", number),
                ));
            }
        }

        for (index, transition) in self.transitions.iter().enumerate() {
            let ends = [
                ("SourceStage", transition.source_stage),
                ("TargetStage", transition.target_stage),
            ];
            for (end, number) in ends {
                if let Some(number) = number {
                    if !numbers.contains(&number) {
                        return Err(TransferError::invalid(
                            format!("{}[{}].{}", TRANSITIONS_KEY, index, end),
                            format!("no stage or condition numbered {}", number),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
