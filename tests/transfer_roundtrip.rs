//! Export from one repository, import into another, compare what arrived

mod common;

use common::{active, engine, find, linked_names, org_data, target_repository};
use docflow_transfer::repository::catalog::{
    BUSINESS_UNIT, DEPARTMENT, DOCUMENT_KIND, DOCUMENT_REGISTER, EMPLOYEE, REGISTRATION_GROUP,
    REGISTRATION_SETTING, ROLE,
};
use docflow_transfer::repository::{Fields, MemoryRepository, STATUS_ACTIVE, STATUS_CLOSED};
use docflow_transfer::transfer::ErrorKind;

const CLERKS_SID: &str = "6f8b3c1e-2a4d-4e5f-9b0a-1c2d3e4f5a6b";

fn source_with_role() -> MemoryRepository {
    let mut repo = MemoryRepository::new();
    org_data(&mut repo);
    let anna = find(&repo, EMPLOYEE, "Anna Ivanova").clone();
    let boris = find(&repo, EMPLOYEE, "Boris Petrov").clone();
    repo.add(ROLE, |e| {
        e.set("Name", "Clerks");
        e.set("Status", STATUS_ACTIVE);
        e.set("Sid", CLERKS_SID);
        e.set("Description", "Registers incoming mail");
        e.set("IsSingleUser", false);
        e.add_link("RecipientLinks", "Member", &anna);
        e.add_link("RecipientLinks", "Member", &boris);
    });
    repo
}

fn source_with_registration() -> MemoryRepository {
    let mut repo = MemoryRepository::new();
    org_data(&mut repo);
    let anna = find(&repo, EMPLOYEE, "Anna Ivanova").clone();
    let office = find(&repo, DEPARTMENT, "Office").clone();
    let unit = find(&repo, BUSINESS_UNIT, "Head office").clone();
    let memo = find(&repo, DOCUMENT_KIND, "Memo").clone();

    let group = repo.add(REGISTRATION_GROUP, |e| {
        e.set("Name", "Office registrars");
        e.set("Status", STATUS_ACTIVE);
        e.set("Index", "OR");
        e.set("CanRegisterIncoming", true);
        e.set("CanRegisterOutgoing", false);
        e.set_ref("ResponsibleEmployee", &anna);
        e.add_link("RecipientLinks", "Member", &anna);
        e.add_link("Departments", "Department", &office);
    });
    let register = repo.add(DOCUMENT_REGISTER, |e| {
        e.set("Name", "Incoming letters");
        e.set("Status", STATUS_ACTIVE);
        e.set("DocumentFlow", "Incoming");
        e.set("Index", "IN");
        e.set("NumberOfDigitsInNumber", 4);
        e.set("RegisterType", "Registration");
        e.set("NumberingPeriod", "Year");
        e.set("NumberingSection", "NoSection");
        e.set_ref("RegistrationGroup", &group);
        e.add_row(
            "NumberFormatItems",
            Fields::new().with("Number", 1).with("Element", "Number"),
        );
        e.add_row(
            "NumberFormatItems",
            Fields::new().with("Number", 2).with("Separator", "/").with("Element", "Index"),
        );
    });
    repo.add(REGISTRATION_SETTING, |e| {
        e.set("Name", "Memos of the head office");
        e.set("Status", STATUS_ACTIVE);
        e.set("DocumentFlow", "Inner");
        e.set("SettingType", "Registration");
        e.set_ref("DocumentRegister", &register);
        e.add_link("DocumentKinds", "DocumentKind", &memo);
        e.add_link("BusinessUnits", "BusinessUnit", &unit);
        e.add_link("Departments", "Department", &office);
    });
    repo.add(DOCUMENT_REGISTER, |e| {
        e.set("Name", "Retired register");
        e.set("Status", STATUS_CLOSED);
        e.set("DocumentFlow", "Incoming");
    });
    repo
}

/// Test that a role arrives with its fields and members
#[tokio::test]
async fn test_role_round_trip() {
    let source = engine(source_with_role());
    let (envelope, export) = source.export("Role").await.unwrap();
    assert_eq!(export.exported, 1);
    assert_eq!(envelope.meta.as_ref().unwrap().entity_type_name, ROLE);

    let mut target = engine(target_repository(7));
    let report = target.import(envelope, None).await.unwrap();
    assert!(report.is_complete(), "{:?}", report.failures);

    let repo = target.repository();
    let role = find(repo, ROLE, "Clerks");
    assert_eq!(role.get_str("Sid"), Some(CLERKS_SID));
    assert_eq!(role.get_str("Description"), Some("Registers incoming mail"));
    assert_eq!(role.fields.get_bool("IsSingleUser"), Some(false));
    assert!(role.is_active());
    assert_eq!(
        linked_names(repo, role, "RecipientLinks", "Member"),
        vec!["Anna Ivanova", "Boris Petrov"]
    );
}

/// Test that group, register and setting arrive in dependency order with links re-resolved
#[tokio::test]
async fn test_registration_chain_round_trip() {
    let source = engine(source_with_registration());
    let mut target = engine(target_repository(13));

    for entity_name in ["RegistrationGroup", "DocumentRegister", "RegistrationSetting"] {
        let (envelope, export) = source.export(entity_name).await.unwrap();
        assert_eq!(export.found, 1, "only active {} records are exported", entity_name);
        let report = target.import(envelope, None).await.unwrap();
        assert!(report.is_complete(), "{}: {:?}", entity_name, report.failures);
    }

    let repo = target.repository();
    let group = find(repo, REGISTRATION_GROUP, "Office registrars");
    assert_eq!(group.get_str("Index"), Some("OR"));
    assert_eq!(group.fields.get_bool("CanRegisterIncoming"), Some(true));
    assert_eq!(group.fields.get_bool("CanRegisterOutgoing"), Some(false));
    let responsible = repo.get(group.get_ref("ResponsibleEmployee").unwrap().id).unwrap();
    assert_eq!(responsible.name(), "Anna Ivanova");
    assert_eq!(linked_names(repo, group, "Departments", "Department"), vec!["Office"]);

    let register = find(repo, DOCUMENT_REGISTER, "Incoming letters");
    assert_eq!(register.get_str("DocumentFlow"), Some("Incoming"));
    assert_eq!(register.fields.get_i64("NumberOfDigitsInNumber"), Some(4));
    assert_eq!(register.get_str("NumberingPeriod"), Some("Year"));
    assert_eq!(register.get_ref("RegistrationGroup").unwrap().id, group.id);
    let items = register.collection("NumberFormatItems");
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].get_str("Separator"), Some("/"));
    assert_eq!(items[1].get_str("Element"), Some("Index"));

    let setting = find(repo, REGISTRATION_SETTING, "Memos of the head office");
    assert_eq!(setting.get_ref("DocumentRegister").unwrap().id, register.id);
    assert_eq!(linked_names(repo, setting, "DocumentKinds", "DocumentKind"), vec!["Memo"]);
    assert_eq!(linked_names(repo, setting, "BusinessUnits", "BusinessUnit"), vec!["Head office"]);
}

/// Test that importing the same file twice is rejected instead of duplicating
#[tokio::test]
async fn test_second_import_is_rejected_as_duplicate() {
    let source = engine(source_with_role());
    let (envelope, _) = source.export("Role").await.unwrap();

    let mut target = engine(target_repository(0));
    let first = target.import(envelope.clone(), None).await.unwrap();
    assert_eq!(first.succeeded(), 1);

    let second = target.import(envelope, None).await.unwrap();
    assert_eq!(second.succeeded(), 0);
    assert_eq!(second.failures_of(ErrorKind::Duplicate).count(), 1);

    let clerks = target
        .repository()
        .entities_of_exact_type(ROLE)
        .into_iter()
        .filter(|role| role.name() == "Clerks")
        .count();
    assert_eq!(clerks, 1);
}

/// Test that a closed record with the same key does not block a new active one
#[tokio::test]
async fn test_closed_register_does_not_block_import() {
    let source = engine(source_with_registration());
    let (group_envelope, _) = source.export("RegistrationGroup").await.unwrap();
    let (register_envelope, _) = source.export("DocumentRegister").await.unwrap();

    let mut target_repo = target_repository(0);
    target_repo.add(DOCUMENT_REGISTER, |e| {
        e.set("Name", "Incoming letters");
        e.set("DocumentFlow", "Incoming");
        e.set("Status", STATUS_CLOSED);
    });
    active(&mut target_repo, DOCUMENT_REGISTER, "Unrelated register");

    let mut target = engine(target_repo);
    target.import(group_envelope, None).await.unwrap();
    let report = target.import(register_envelope, None).await.unwrap();
    assert!(report.is_complete(), "{:?}", report.failures);
}
