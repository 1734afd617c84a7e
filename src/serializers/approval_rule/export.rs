//! Flattening a stored rule into its record

use serde_json::Value;

use super::flow::{DocumentFlow, RuleKind};
use super::graph::{ConditionRecord, RuleGraph, StageRecord, TransitionRecord};
use crate::repository::{Entity, EntityRef, Fields, Repository};
use crate::transfer::document::{reference_doc, reference_docs, reference_list, reference_value, render_card};
use crate::transfer::{CARD_KEY, Record, Result, TransferError};

/// Kind of a stored rule, from its concrete type or else its document flow
pub fn stored_kind(rule: &Entity) -> RuleKind {
    RuleKind::of_type(&rule.type_name)
        .or_else(|| {
            rule.get_str("DocumentFlow")
                .and_then(|flow| flow.parse::<DocumentFlow>().ok())
                .map(|flow| flow.rule_kind())
        })
        .unwrap_or(RuleKind::General)
}

/// `Number` of a stage or condition row; rows without a positive one cannot be imported back
fn row_number(collection: &str, row: &Fields) -> Result<i64> {
    match row.get_i64("Number") {
        Some(number) if number > 0 => Ok(number),
        Some(number) => Err(TransferError::invalid(
            collection,
            format!("row number {} is not positive", number),
        )),
        None => Err(TransferError::invalid(collection, "row has no Number")),
    }
}

async fn load(repo: &dyn Repository, collection: &str, entity_ref: Option<&EntityRef>, number: i64) -> Result<Entity> {
    let Some(entity_ref) = entity_ref else {
        return Err(TransferError::invalid(
            collection,
            format!("row {} has no linked entity", number),
        ));
    };
    repo.get_entity(entity_ref).await?.ok_or_else(|| {
        TransferError::invalid(
            collection,
            format!("row {} links missing {} {}", number, entity_ref.type_name, entity_ref.id),
        )
    })
}

async fn export_stages(repo: &dyn Repository, rule: &Entity) -> Result<Vec<StageRecord>> {
    let mut stages = Vec::new();
    for row in rule.collection("Stages") {
        let number = row_number("Stages", row)?;
        let stage = load(repo, "Stages", row.get_ref("Stage"), number).await?;
        stages.push(StageRecord {
            number,
            stage_object: render_card(repo, &stage).await?,
            approval_role: reference_doc(repo, stage.get_ref("ApprovalRole")).await?,
            assignee: reference_doc(repo, stage.get_ref("Assignee")).await?,
            approval_roles: reference_docs(repo, stage.linked("ApprovalRoles", "ApprovalRole")).await?,
            recipients: reference_docs(repo, stage.linked("Recipients", "Recipient")).await?,
        });
    }
    Ok(stages)
}

async fn export_conditions(repo: &dyn Repository, rule: &Entity, kind: RuleKind) -> Result<Vec<ConditionRecord>> {
    let mut conditions = Vec::new();
    for row in rule.collection("Conditions") {
        let number = row_number("Conditions", row)?;
        let condition = load(repo, "Conditions", row.get_ref("Condition"), number).await?;

        let mut object = serde_json::Map::new();
        object.insert(CARD_KEY.to_string(), Value::Object(render_card(repo, &condition).await?));
        let lists = [
            ("Currencies", "Currency"),
            ("DocumentKinds", "DocumentKind"),
            ("ConditionDocumentKinds", "DocumentKind"),
            ("DeliveryMethods", "DeliveryMethod"),
        ];
        for (collection, link) in lists {
            object.insert(
                collection.to_string(),
                reference_list(repo, condition.linked(collection, link)).await?,
            );
        }
        for key in [
            "ApprovalRole",
            "ApprovalRoleForComparison",
            "RecipientForComparison",
            "AddendaDocumentKind",
        ] {
            object.insert(key.to_string(), reference_value(repo, condition.get_ref(key)).await?);
        }
        if kind.has_addressees() {
            object.insert(
                "Addressees".to_string(),
                reference_list(repo, condition.linked("Addressees", "Addressee")).await?,
            );
        }

        conditions.push(ConditionRecord {
            number,
            condition_object: object,
        });
    }
    Ok(conditions)
}

fn export_transitions(rule: &Entity) -> Vec<TransitionRecord> {
    rule.collection("Transitions")
        .iter()
        .map(|row| TransitionRecord {
            source_stage: row.get_i64("SourceStage"),
            target_stage: row.get_i64("TargetStage"),
            condition_value: row.get_bool("ConditionValue"),
        })
        .collect()
}

pub async fn export_rule(repo: &dyn Repository, rule: &Entity) -> Result<Record> {
    let kind = stored_kind(rule);
    let mut record = Record::new();
    record.insert(CARD_KEY, Value::Object(render_card(repo, rule).await?));

    // Header keys keep their historical singular names
    let header = [
        ("DocumentKinds", "DocumentKinds", "DocumentKind"),
        ("Departments", "Departments", "Department"),
        ("BusinessUnit", "BusinessUnits", "BusinessUnit"),
        ("DocumentGroup", "DocumentGroups", "DocumentGroup"),
    ];
    for (key, collection, link) in header {
        record.insert(key, reference_list(repo, rule.linked(collection, link)).await?);
    }

    let graph = RuleGraph {
        stages: export_stages(repo, rule).await?,
        conditions: export_conditions(repo, rule, kind).await?,
        transitions: export_transitions(rule),
    };
    graph.write_to(&mut record)?;
    Ok(record)
}
