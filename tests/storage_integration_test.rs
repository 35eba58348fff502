//! Storage integration tests
//!
//! These run against SQLite in memory; the Postgres backend shares the same queries apart
//! from placeholder and column type syntax.

use scanroute::models::{
    DeviceType, GeoData, MultiUrl, NewScanLog, QrAction, QrActionKind, QrRecord, QrType,
};
use scanroute::storage::{CachedStorage, SqliteStorage, Storage, StorageError};
use serde_json::json;
use std::sync::Arc;

async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn scan(qr_id: &str, device_type: DeviceType) -> NewScanLog {
    NewScanLog {
        qr_code_id: qr_id.to_string(),
        device_type,
        referrer: None,
        country: Some("Unknown".to_string()),
        city: Some("Unknown".to_string()),
        latitude: None,
        longitude: None,
        user_agent: None,
    }
}

fn action(id: &str, qr_id: &str, kind: QrActionKind, order: i64, active: bool) -> QrAction {
    QrAction {
        id: id.to_string(),
        qr_code_id: qr_id.to_string(),
        action_type: kind,
        action_data: json!({"phone": "+15550100"}),
        display_order: order,
        is_active: active,
    }
}

#[tokio::test]
async fn test_record_payloads_round_trip_through_columns() {
    let storage = create_test_storage().await;

    let record = QrRecord::new("full", QrType::MultiUrl)
        .with_multi_urls(vec![
            MultiUrl::new("https://a.example", Some(2.5)),
            MultiUrl::new("https://b.example", None),
        ])
        .with_action("email", json!({"email": "a@b.co"}))
        .with_geo(GeoData {
            latitude: Some(1.5),
            longitude: Some(-2.25),
            address: Some("Somewhere".to_string()),
        });
    let created = storage.create_qr_record(&record).await.unwrap();
    assert_eq!(created.scan_count, 0);
    assert!(created.created_at > 0);

    let loaded = storage.get_qr_record("full").await.unwrap().unwrap();
    assert_eq!(loaded.qr_type, QrType::MultiUrl);
    assert!(loaded.is_active);
    assert_eq!(loaded.multi_urls, record.multi_urls);
    assert_eq!(loaded.action_type.as_deref(), Some("email"));
    assert_eq!(loaded.action_data, Some(json!({"email": "a@b.co"})));
    assert_eq!(loaded.geo_data, record.geo_data);
}

#[tokio::test]
async fn test_unknown_type_survives_storage() {
    let storage = create_test_storage().await;
    storage
        .create_qr_record(&QrRecord::new("odd", QrType::parse("coupon")))
        .await
        .unwrap();

    let loaded = storage.get_qr_record("odd").await.unwrap().unwrap();
    assert_eq!(loaded.qr_type, QrType::Unknown("coupon".to_string()));
}

#[tokio::test]
async fn test_duplicate_record_is_a_conflict() {
    let storage = create_test_storage().await;
    let record = QrRecord::new("dup", QrType::Static).with_destination("a.example");

    storage.create_qr_record(&record).await.unwrap();
    let err = storage.create_qr_record(&record).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict), "got {err:?}");
}

#[tokio::test]
async fn test_inactive_records_are_still_returned() {
    let storage = create_test_storage().await;
    storage
        .create_qr_record(&QrRecord::new("off", QrType::Static).with_destination("a.example"))
        .await
        .unwrap();

    assert!(storage.set_active("off", false).await.unwrap());
    let loaded = storage.get_qr_record("off").await.unwrap().unwrap();
    assert!(!loaded.is_active);

    assert!(!storage.set_active("missing", false).await.unwrap());
}

#[tokio::test]
async fn test_actions_are_active_only_and_ordered() {
    let storage = create_test_storage().await;
    storage
        .create_qr_record(&QrRecord::new("menu", QrType::MultiAction))
        .await
        .unwrap();

    for a in [
        action("b", "menu", QrActionKind::Call, 2, true),
        action("a", "menu", QrActionKind::Whatsapp, 2, true),
        action("first", "menu", QrActionKind::Website, 0, true),
        action("off", "menu", QrActionKind::Call, 1, false),
        action("future", "menu", QrActionKind::parse("coupon"), 5, true),
    ] {
        storage.create_qr_action(&a).await.unwrap();
    }

    let actions = storage.get_qr_actions("menu").await.unwrap();
    let ids: Vec<&str> = actions.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "a", "b", "future"]);
    assert_eq!(actions[3].action_type, QrActionKind::Unknown("coupon".to_string()));
    assert_eq!(actions[1].action_data, json!({"phone": "+15550100"}));
}

#[tokio::test]
async fn test_action_requires_existing_record() {
    let storage = create_test_storage().await;
    let err = storage
        .create_qr_action(&action("orphan", "nope", QrActionKind::Call, 0, true))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::MissingParent), "got {err:?}");
}

#[tokio::test]
async fn test_scan_logs_and_counter() {
    let storage = create_test_storage().await;
    storage
        .create_qr_record(&QrRecord::new("logged", QrType::Static).with_destination("a.example"))
        .await
        .unwrap();

    let first = storage
        .insert_scan_log(scan("logged", DeviceType::Mobile))
        .await
        .unwrap();
    let second = storage
        .insert_scan_log(scan("logged", DeviceType::Desktop))
        .await
        .unwrap();
    storage.increment_scan_count("logged").await.unwrap();
    storage.increment_scan_count("logged").await.unwrap();

    assert!(second.id > first.id);
    assert_eq!(first.device_type, "mobile");
    assert!(first.scanned_at > 0);

    let logs = storage.list_scan_logs("logged", 10).await.unwrap();
    assert_eq!(logs.len(), 2);
    // Newest first
    assert_eq!(logs[0].id, second.id);

    let limited = storage.list_scan_logs("logged", 1).await.unwrap();
    assert_eq!(limited.len(), 1);

    let record = storage.get_qr_record("logged").await.unwrap().unwrap();
    assert_eq!(record.scan_count, 2);
}

#[tokio::test]
async fn test_incrementing_unknown_record_is_a_no_op() {
    let storage = create_test_storage().await;
    storage.increment_scan_count("ghost").await.unwrap();
    assert!(storage.get_qr_record("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn test_cached_menu_refreshes_after_new_action() {
    let inner = create_test_storage().await;
    let cached = CachedStorage::new(Arc::clone(&inner), 100, 300);
    cached
        .create_qr_record(&QrRecord::new("menu", QrType::MultiAction))
        .await
        .unwrap();

    assert!(cached.get_qr_actions("menu").await.unwrap().is_empty());

    cached
        .create_qr_action(&action("call", "menu", QrActionKind::Call, 0, true))
        .await
        .unwrap();
    assert_eq!(cached.get_qr_actions("menu").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("scans.db").display());

    {
        let storage = SqliteStorage::new(&url, 4).await.unwrap();
        storage.init().await.unwrap();
        storage
            .create_qr_record(&QrRecord::new("kept", QrType::Dynamic).with_destination("a.example"))
            .await
            .unwrap();
        storage.increment_scan_count("kept").await.unwrap();
    }

    let reopened = SqliteStorage::new(&url, 4).await.unwrap();
    // Creating tables again must not disturb existing rows
    reopened.init().await.unwrap();
    let record = reopened.get_qr_record("kept").await.unwrap().unwrap();
    assert_eq!(record.destination(), Some("a.example"));
    assert_eq!(record.scan_count, 1);
}
