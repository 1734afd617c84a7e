//! Rebuilding a rule and its stage graph from a record
//!
//! Conditions and stages are created in `Number` order and attached to the rule
//! at their original numbers, so transitions are copied over verbatim. Stages are
//! shared by name across rules: an existing stage, or one created earlier in the
//! same rule, is reused instead of being created again. Nothing is saved until
//! the whole graph has been built, so a failed rule leaves no pending entities.

use log::{debug, info};
use serde_json::Value;

use super::flow::{DocumentFlow, RuleKind};
use super::graph::{ConditionRecord, RuleGraph, StageRecord, TransitionRecord};
use crate::repository::catalog::{
    APPROVAL_ROLE_BASE, APPROVAL_RULE_BASE, APPROVAL_STAGE, BUSINESS_UNIT, CURRENCY, DEPARTMENT,
    DOCUMENT_GROUP_BASE, DOCUMENT_KIND, EMPLOYEE, MAIL_DELIVERY_METHOD, RECIPIENT,
};
use crate::repository::{Entity, Fields, Repository, STATUS_ACTIVE};
use crate::serializers::{create_active, reject_existing};
use crate::transfer::document::Card;
use crate::transfer::resolve::{find_by_name, optional_reference, resolve_reference, resolve_references};
use crate::transfer::{CARD_KEY, ImportedEntity, Record, ReferenceDoc, Result};

const STAGE_FLAGS: [&str; 5] = [
    "NeedStrongSign",
    "AllowSendToRework",
    "IsConfirmSigning",
    "IsResultSubmission",
    "AllowAdditionalApprovers",
];
const STAGE_TEXT: [&str; 2] = ["Subject", "Note"];
const STAGE_ENUMS: [&str; 3] = ["Sequence", "ReworkType", "AssigneeType"];

async fn optional_doc(
    repo: &dyn Repository,
    field: &str,
    doc: Option<&ReferenceDoc>,
    type_name: &str,
) -> Result<Option<Entity>> {
    match doc {
        Some(doc) => resolve_reference(repo, field, doc, type_name, false).await.map(Some),
        None => Ok(None),
    }
}

async fn build_condition(
    repo: &mut dyn Repository,
    kind: RuleKind,
    condition: &ConditionRecord,
) -> Result<Entity> {
    let object = Card::new(&condition.condition_object, "ConditionObject");
    let card = Card::object(object.get(CARD_KEY), "ConditionObject.Card")?;

    // References first, so an unresolved one leaves nothing half-built
    info!("Checking condition currencies");
    let currencies = resolve_references(&*repo, &object, "Currencies", CURRENCY, false).await?;
    let document_kinds = resolve_references(&*repo, &object, "DocumentKinds", DOCUMENT_KIND, false).await?;
    info!("Checking condition document kinds");
    let condition_kinds =
        resolve_references(&*repo, &object, "ConditionDocumentKinds", DOCUMENT_KIND, false).await?;
    let approval_role = optional_reference(&*repo, &object, "ApprovalRole", APPROVAL_ROLE_BASE, false).await?;
    let role_for_comparison =
        optional_reference(&*repo, &object, "ApprovalRoleForComparison", APPROVAL_ROLE_BASE, false).await?;
    let recipient_for_comparison =
        optional_reference(&*repo, &object, "RecipientForComparison", RECIPIENT, true).await?;
    let delivery_methods =
        resolve_references(&*repo, &object, "DeliveryMethods", MAIL_DELIVERY_METHOD, false).await?;
    let addenda_kind = optional_reference(&*repo, &object, "AddendaDocumentKind", DOCUMENT_KIND, true).await?;
    let addressees = if kind.has_addressees() {
        resolve_references(&*repo, &object, "Addressees", EMPLOYEE, false).await?
    } else {
        Vec::new()
    };

    let mut entity = repo.create_entity(kind.condition_type()).await?;
    info!(
        "Id = {}. Creating condition {} ({})",
        entity.id,
        condition.number,
        card.enum_opt("ConditionType")?.unwrap_or("untyped")
    );
    entity.set("Name", card.str_opt("Name")?);
    entity.set("ConditionType", card.enum_opt("ConditionType")?);
    entity.set("Amount", card.f64_opt("Amount")?);
    entity.set("AmountOperator", card.enum_opt("AmountOperator")?);
    entity.set("Note", card.str_opt("Note")?);
    entity.set("Status", STATUS_ACTIVE);

    for currency in &currencies {
        entity.add_link("Currencies", "Currency", currency);
    }
    for document_kind in &document_kinds {
        entity.add_link("DocumentKinds", "DocumentKind", document_kind);
    }
    for document_kind in &condition_kinds {
        entity.add_link("ConditionDocumentKinds", "DocumentKind", document_kind);
    }
    if let Some(role) = &approval_role {
        entity.set_ref("ApprovalRole", role);
    }
    if let Some(role) = &role_for_comparison {
        entity.set_ref("ApprovalRoleForComparison", role);
    }
    if let Some(recipient) = &recipient_for_comparison {
        entity.set_ref("RecipientForComparison", recipient);
    }
    for method in &delivery_methods {
        entity.add_link("DeliveryMethods", "DeliveryMethod", method);
    }
    if let Some(document_kind) = &addenda_kind {
        entity.set_ref("AddendaDocumentKind", document_kind);
    }
    for addressee in &addressees {
        entity.add_link("Addressees", "Addressee", addressee);
    }

    Ok(entity)
}

async fn build_stage(repo: &mut dyn Repository, stage: &StageRecord, object: &Card<'_>, name: &str) -> Result<Entity> {
    let approval_role = optional_doc(&*repo, "ApprovalRole", stage.approval_role.as_ref(), APPROVAL_ROLE_BASE).await?;
    let assignee = optional_doc(&*repo, "Assignee", stage.assignee.as_ref(), RECIPIENT).await?;
    let mut approval_roles = Vec::with_capacity(stage.approval_roles.len());
    for doc in &stage.approval_roles {
        approval_roles.push(resolve_reference(&*repo, "ApprovalRoles", doc, APPROVAL_ROLE_BASE, false).await?);
    }
    let mut recipients = Vec::with_capacity(stage.recipients.len());
    for doc in &stage.recipients {
        recipients.push(resolve_reference(&*repo, "Recipients", doc, RECIPIENT, false).await?);
    }

    let mut entity = create_active(repo, APPROVAL_STAGE, "approval stage", name).await?;
    entity.set("StageType", object.enum_opt("StageType")?);

    match (object.i64_opt("DeadlineInDays")?, object.i64_opt("DeadlineInHours")?) {
        (Some(days), hours) => {
            if hours.is_some() {
                debug!("Stage '{}' has both deadlines, keeping days", name);
            }
            entity.set("DeadlineInDays", days);
        }
        (None, Some(hours)) => entity.set("DeadlineInHours", hours),
        (None, None) => {}
    }

    for key in STAGE_ENUMS {
        entity.set(key, object.enum_opt(key)?);
    }
    for key in STAGE_FLAGS {
        entity.set(key, object.bool_opt(key)?);
    }
    for key in STAGE_TEXT {
        entity.set(key, object.str_opt(key)?);
    }
    entity.set("StartDelayDays", object.i64_opt("StartDelayDays")?);

    if let Some(role) = &approval_role {
        entity.set_ref("ApprovalRole", role);
    }
    if let Some(assignee) = &assignee {
        entity.set_ref("Assignee", assignee);
    }
    for role in &approval_roles {
        entity.add_link("ApprovalRoles", "ApprovalRole", role);
    }
    for recipient in &recipients {
        entity.add_link("Recipients", "Recipient", recipient);
    }

    Ok(entity)
}

/// Stage named `name`: an existing one, one built earlier for this rule, or a new one
async fn stage_for(
    repo: &mut dyn Repository,
    stage: &StageRecord,
    created: &mut Vec<Entity>,
) -> Result<Entity> {
    let object = Card::new(&stage.stage_object, "StageObject");
    let name = object.name()?;

    if let Some(existing) = find_by_name(&*repo, APPROVAL_STAGE, name, false).await? {
        info!("Reusing approval stage '{}' (id {})", name, existing.id);
        return Ok(existing);
    }
    if let Some(shared) = created.iter().find(|entity| entity.name() == name) {
        info!("Reusing approval stage '{}' built for this rule", name);
        return Ok(shared.clone());
    }

    let entity = build_stage(repo, stage, &object, name).await?;
    created.push(entity.clone());
    Ok(entity)
}

fn transition_row(transition: &TransitionRecord) -> Fields {
    Fields::new()
        .with("SourceStage", transition.source_stage)
        .with("TargetStage", transition.target_stage)
        .with("ConditionValue", transition.condition_value)
}

pub async fn import_rule(repo: &mut dyn Repository, record: &Record) -> Result<ImportedEntity> {
    let card = record.card()?;
    let top = record.top();
    let rule_name = card.name()?;
    let flow: DocumentFlow = card.str_required("DocumentFlow")?.parse()?;
    let kind = flow.rule_kind();
    let graph = RuleGraph::from_record(record)?;
    graph.validate()?;

    let existing = repo.get_entities(APPROVAL_RULE_BASE).await?;
    reject_existing(
        existing.iter().find(|rule| {
            rule.get_str("DocumentFlow") == Some(flow.as_str()) && rule.name() == rule_name && rule.is_active()
        }),
        "Approval rule",
        rule_name,
    )?;

    info!("Looking up document kinds");
    let document_kinds = resolve_references(&*repo, &top, "DocumentKinds", DOCUMENT_KIND, false).await?;
    info!("Looking up business units");
    let business_units = resolve_references(&*repo, &top, "BusinessUnit", BUSINESS_UNIT, false).await?;
    info!("Looking up departments");
    let departments = resolve_references(&*repo, &top, "Departments", DEPARTMENT, false).await?;
    let document_groups = if kind.has_document_groups() {
        info!("Looking up document groups");
        resolve_references(&*repo, &top, "DocumentGroup", DOCUMENT_GROUP_BASE, false).await?
    } else {
        Vec::new()
    };

    let mut rule = repo.create_entity(kind.rule_type()).await?;
    info!("Id = {}. Creating approval rule '{}'", rule.id, rule_name);
    rule.set("Name", rule_name);
    rule.set("DocumentFlow", flow.as_str());
    rule.set("IsSmallApprovalAllowed", card.bool_opt("IsSmallApprovalAllowed")?.unwrap_or(false));
    rule.set("Priority", card.i64_opt("Priority")?.unwrap_or_default());

    for document_kind in &document_kinds {
        rule.add_link("DocumentKinds", "DocumentKind", document_kind);
    }
    for unit in &business_units {
        rule.add_link("BusinessUnits", "BusinessUnit", unit);
    }
    for department in &departments {
        rule.add_link("Departments", "Department", department);
    }
    for group in &document_groups {
        rule.add_link("DocumentGroups", "DocumentGroup", group);
    }

    let mut conditions = Vec::with_capacity(graph.conditions.len());
    for condition in &graph.conditions {
        let entity = build_condition(repo, kind, condition).await?;
        rule.add_row(
            "Conditions",
            Fields::new().with("Number", condition.number).with_ref("Condition", &entity),
        );
        conditions.push(entity);
    }

    let mut created = Vec::new();
    for stage in &graph.stages {
        let entity = stage_for(repo, stage, &mut created).await?;
        let stage_type = entity
            .get_str("StageType")
            .map(|value| Value::from(value.to_string()))
            .unwrap_or(Value::Null);
        rule.add_row(
            "Stages",
            Fields::new()
                .with("Number", stage.number)
                .with("StageType", stage_type)
                .with_ref("Stage", &entity),
        );
    }

    for transition in &graph.transitions {
        rule.add_row("Transitions", transition_row(transition));
    }

    debug!(
        "Saving {} conditions and {} new stages of rule '{}'",
        conditions.len(),
        created.len(),
        rule_name
    );
    for entity in conditions.into_iter().chain(created) {
        repo.save(entity).await?;
    }

    rule.set("Status", STATUS_ACTIVE);
    let imported = ImportedEntity::of(&rule);
    repo.save(rule).await?;
    repo.submit_changes().await?;
    info!(
        "Approval rule '{}' created: {} stages, {} conditions, {} transitions",
        rule_name,
        graph.stages.len(),
        graph.conditions.len(),
        graph.transitions.len()
    );
    Ok(imported)
}
