//! File-level export and import against snapshot-backed repositories

mod common;

use common::{active, engine, find, org_data, target_repository};
use docflow_transfer::repository::MemoryRepository;
use docflow_transfer::repository::catalog::{EMPLOYEE, ROLE};
use docflow_transfer::transfer::{TransferError, decode};
use tempfile::TempDir;

fn source() -> MemoryRepository {
    let mut repo = MemoryRepository::new();
    org_data(&mut repo);
    let anna = find(&repo, EMPLOYEE, "Anna Ivanova").clone();
    repo.add(ROLE, |e| {
        e.set("Name", "Clerks");
        e.set("Status", "Active");
        e.add_link("RecipientLinks", "Member", &anna);
    });
    active(&mut repo, ROLE, "Reviewers");
    repo
}

/// Test that an exported file starts with its header and imports back
#[tokio::test]
async fn test_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("roles.json");

    let report = engine(source()).export_to_file("Role", &file).await.unwrap();
    assert_eq!(report.exported, 2);

    let content = std::fs::read_to_string(&file).unwrap();
    let elements: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(elements[0]["Meta"]["EntityName"], "Role");
    assert_eq!(elements[0]["Meta"]["EntityTypeName"], ROLE);
    assert_eq!(elements.as_array().unwrap().len(), 3);

    let mut target = engine(target_repository(5));
    let imported = target.import_file(&file, None).await.unwrap();
    assert_eq!(imported.succeeded(), 2);
    assert!(find(target.repository(), ROLE, "Reviewers").is_active());
}

/// Test that compact output decodes to the same envelope
#[tokio::test]
async fn test_compact_output() {
    let dir = TempDir::new().unwrap();
    let pretty = dir.path().join("pretty.json");
    let compact = dir.path().join("compact.json");

    engine(source()).export_to_file("Role", &pretty).await.unwrap();
    engine(source())
        .with_pretty_output(false)
        .export_to_file("Role", &compact)
        .await
        .unwrap();

    let compact_bytes = std::fs::read(&compact).unwrap();
    assert!(!compact_bytes.contains(&b'\n'));
    assert_eq!(
        decode(&std::fs::read(&pretty).unwrap()).unwrap(),
        decode(&compact_bytes).unwrap()
    );
}

/// Test that a file with a byte order mark is accepted
#[tokio::test]
async fn test_byte_order_mark_is_tolerated() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bom.json");
    let mut bytes = b"\xEF\xBB\xBF".to_vec();
    bytes.extend_from_slice(br#"[{"Meta":{"EntityName":"Role","EntityTypeName":"Sungero.CoreEntities.IRole"}},{"Card":{"Name":"Clerks"}}]"#);
    std::fs::write(&file, bytes).unwrap();

    let mut target = engine(target_repository(0));
    let report = target.import_file(&file, None).await.unwrap();
    assert_eq!(report.succeeded(), 1);
}

/// Test that malformed and missing files abort before any record is touched
#[tokio::test]
async fn test_unreadable_files_abort() {
    let dir = TempDir::new().unwrap();
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "[{\"Card\": ").unwrap();

    let mut target = engine(MemoryRepository::new());
    let result = target.import_file(&broken, Some("Role")).await;
    assert!(matches!(result, Err(TransferError::Format(_))));

    let result = target.import_file(&dir.path().join("absent.json"), Some("Role")).await;
    assert!(matches!(result, Err(TransferError::Io { .. })));
    assert_eq!(target.repository().calls(), 0);
}

/// Test that imported records persist in the snapshot file
#[tokio::test]
async fn test_snapshot_keeps_imported_records() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("roles.json");
    let snapshot = dir.path().join("target.json");
    engine(source()).export_to_file("Role", &file).await.unwrap();

    let mut seeded = MemoryRepository::open(&snapshot).await.unwrap();
    org_data(&mut seeded);
    let mut target = engine(seeded);
    let report = target.import_file(&file, None).await.unwrap();
    assert!(report.is_complete(), "{:?}", report.failures);

    let reopened = MemoryRepository::open(&snapshot).await.unwrap();
    assert!(find(&reopened, ROLE, "Clerks").is_active());
    assert!(find(&reopened, EMPLOYEE, "Anna Ivanova").is_active());
}
