//! Shared fixtures for the integration tests

#![allow(dead_code)]

use docflow_transfer::repository::catalog::{
    APPROVAL_ROLE, BUSINESS_UNIT, CONTRACT_CATEGORY, CURRENCY, DEPARTMENT, DOCUMENT_KIND, EMPLOYEE,
    MAIL_DELIVERY_METHOD, ROLE, USER,
};
use docflow_transfer::repository::{Entity, MemoryRepository, STATUS_ACTIVE};
use docflow_transfer::serializers::{SerializerOptions, builtin_registry};
use docflow_transfer::transfer::{Record, TransferEngine};
use serde_json::Value;

pub const PADDING_TYPE: &str = "Tests.IPadding";

pub fn active(repo: &mut MemoryRepository, type_name: &str, name: &str) -> Entity {
    repo.add(type_name, |e| {
        e.set("Name", name);
        e.set("Status", STATUS_ACTIVE);
    })
}

/// Unrelated entities so that two repositories allocate different ids
pub fn pad(repo: &mut MemoryRepository, count: usize) {
    for n in 0..count {
        active(repo, PADDING_TYPE, &format!("padding {}", n));
    }
}

/// People, org units and dictionaries present on both instances
pub fn org_data(repo: &mut MemoryRepository) {
    active(repo, EMPLOYEE, "Anna Ivanova");
    active(repo, EMPLOYEE, "Boris Petrov");
    active(repo, DEPARTMENT, "Office");
    active(repo, BUSINESS_UNIT, "Head office");
    active(repo, DOCUMENT_KIND, "Contract");
    active(repo, DOCUMENT_KIND, "Memo");
    active(repo, APPROVAL_ROLE, "Initiator's manager");
    active(repo, CURRENCY, "Euro");
    active(repo, CONTRACT_CATEGORY, "Supply");
    active(repo, MAIL_DELIVERY_METHOD, "Email");
}

/// Org data plus the system roles a target instance always has
pub fn target_repository(padding: usize) -> MemoryRepository {
    let mut repo = MemoryRepository::new();
    pad(&mut repo, padding);
    org_data(&mut repo);

    let service_user = active(&mut repo, USER, "Service User");
    repo.add(ROLE, |e| {
        e.set("Name", "Service Users");
        e.set("Status", STATUS_ACTIVE);
        e.add_link("RecipientLinks", "Member", &service_user);
    });
    active(&mut repo, ROLE, "Lawyers");
    repo
}

pub fn find<'a>(repo: &'a MemoryRepository, type_name: &str, name: &str) -> &'a Entity {
    repo.entities_of_exact_type(type_name)
        .into_iter()
        .find(|entity| entity.name() == name)
        .unwrap_or_else(|| panic!("no {} named '{}'", type_name, name))
}

/// Names of the entities behind one link column
pub fn linked_names(repo: &MemoryRepository, entity: &Entity, collection: &str, link: &str) -> Vec<String> {
    entity
        .linked(collection, link)
        .into_iter()
        .map(|entity_ref| repo.get(entity_ref.id).unwrap().name().to_string())
        .collect()
}

pub fn engine(repo: MemoryRepository) -> TransferEngine<MemoryRepository> {
    let registry = builtin_registry(&SerializerOptions::default()).unwrap();
    TransferEngine::new(registry, repo)
}

pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => Record::from_map(map),
        other => panic!("record must be an object, got {}", other),
    }
}
