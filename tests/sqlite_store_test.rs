// ABOUTME: Integration tests for the SQLite sync store
// ABOUTME: Covers schema idempotency, enumeration filters, deduplicating inserts, partial updates, and file persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use cgm_sync_engine::database::{SqliteSyncStore, SyncStore};
use cgm_sync_engine::errors::StoreError;
use cgm_sync_engine::models::{
    ConfigurationFilter, ConfigurationUpdate, ConnectionStatus, GlucoseRecord, ProviderKind,
    UpsertOutcome,
};
use chrono::Utc;
use common::{base_time, create_test_store, dexcom_config, init_test_logging, readings};
use tempfile::TempDir;
use uuid::Uuid;

#[tokio::test]
async fn test_migrate_is_idempotent() {
    let store = create_test_store().await;
    store
        .insert_configuration(&dexcom_config("cfg-1", "+15551230600"))
        .await
        .unwrap();

    store.migrate().await.unwrap();
    store.migrate().await.unwrap();

    assert!(store.get_configuration("cfg-1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_fleet_filter_selects_enabled_active_and_error() {
    let store = create_test_store().await;

    let active = dexcom_config("active", "+15551230601");
    let mut erroring = dexcom_config("erroring", "+15551230602");
    erroring.connection_status = ConnectionStatus::Error;
    let mut unauthorized = dexcom_config("unauthorized", "+15551230603");
    unauthorized.connection_status = ConnectionStatus::Unauthorized;
    let mut disabled = dexcom_config("disabled", "+15551230604");
    disabled.sync_enabled = false;

    for config in [&active, &erroring, &unauthorized, &disabled] {
        store.insert_configuration(config).await.unwrap();
    }

    let fleet = store
        .list_configurations(&ConfigurationFilter::fleet())
        .await
        .unwrap();
    let mut ids: Vec<&str> = fleet.iter().map(|config| config.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["active", "erroring"]);

    let everything = store
        .list_configurations(&ConfigurationFilter::default())
        .await
        .unwrap();
    assert_eq!(everything.len(), 4);

    let enabled = store
        .list_configurations(&ConfigurationFilter {
            sync_enabled: Some(true),
            statuses: Vec::new(),
        })
        .await
        .unwrap();
    assert_eq!(enabled.len(), 3);
}

#[tokio::test]
async fn test_duplicate_natural_id_is_ignored() {
    let store = create_test_store().await;
    let config = dexcom_config("cfg-dup", "+15551230605");
    store.insert_configuration(&config).await.unwrap();

    let reading = readings(ProviderKind::DexcomShare, base_time(), 1).remove(0);
    let first = GlucoseRecord::from_reading(&config, reading.clone(), Uuid::new_v4(), Utc::now());
    let mut second = GlucoseRecord::from_reading(&config, reading, Uuid::new_v4(), Utc::now());
    second.glucose_value = 250.0;

    assert_eq!(
        store.upsert_reading(&first).await.unwrap(),
        UpsertOutcome::Inserted
    );
    assert_eq!(
        store.upsert_reading(&second).await.unwrap(),
        UpsertOutcome::Duplicate
    );

    let stored = store.readings_for_configuration("cfg-dup").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].natural_id, first.natural_id);
    assert!((stored[0].glucose_value - first.glucose_value).abs() < f64::EPSILON);
    assert_eq!(stored[0].sync_batch_id, first.sync_batch_id);
}

#[tokio::test]
async fn test_partial_update_touches_only_named_fields() {
    let store = create_test_store().await;
    let mut config = dexcom_config("cfg-upd", "+15551230606");
    config.sync_error_count = 2;
    config.last_sync_error = Some("connection reset".to_owned());
    store.insert_configuration(&config).await.unwrap();

    let attempted = base_time();
    store
        .update_configuration(
            "cfg-upd",
            &ConfigurationUpdate {
                last_sync_attempt_at: Some(attempted),
                ..ConfigurationUpdate::default()
            },
        )
        .await
        .unwrap();
    let stored = store.get_configuration("cfg-upd").await.unwrap().unwrap();
    assert_eq!(stored.sync_error_count, 2);
    assert_eq!(stored.last_sync_error.as_deref(), Some("connection reset"));
    assert_eq!(stored.last_sync_attempt_at, Some(attempted));

    store
        .update_configuration(
            "cfg-upd",
            &ConfigurationUpdate {
                connection_status: Some(ConnectionStatus::Active),
                sync_error_count: Some(0),
                last_sync_error: Some(None),
                last_successful_sync_at: Some(attempted),
                ..ConfigurationUpdate::default()
            },
        )
        .await
        .unwrap();
    let stored = store.get_configuration("cfg-upd").await.unwrap().unwrap();
    assert_eq!(stored.sync_error_count, 0);
    assert_eq!(stored.last_sync_error, None);
    assert_eq!(stored.last_successful_sync_at, Some(attempted));
}

#[tokio::test]
async fn test_update_of_unknown_configuration_is_not_found() {
    let store = create_test_store().await;

    let error = store
        .update_configuration(
            "missing",
            &ConfigurationUpdate {
                sync_error_count: Some(1),
                ..ConfigurationUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(error, StoreError::NotFound { ref id, .. } if id == "missing"));

    let error = store
        .link_unified_patient("missing", "unified-1")
        .await
        .unwrap_err();
    assert!(matches!(error, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_unified_patient_lookup_uses_normalized_phone() {
    let store = create_test_store().await;
    store
        .insert_unified_patient("unified-7", "5551230607", Some("Ada"))
        .await
        .unwrap();

    assert_eq!(
        store.find_unified_patient_id("5551230607").await.unwrap(),
        Some("unified-7".to_owned())
    );
    assert_eq!(store.find_unified_patient_id("+15551230607").await.unwrap(), None);
}

#[tokio::test]
async fn test_file_database_survives_reconnect() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}", dir.path().join("cgm.db").display());

    let config = dexcom_config("cfg-file", "+15551230608");
    {
        let store = SqliteSyncStore::connect(&url).await.unwrap();
        store.insert_configuration(&config).await.unwrap();
        let reading = readings(ProviderKind::DexcomShare, base_time(), 1).remove(0);
        let record = GlucoseRecord::from_reading(&config, reading, Uuid::new_v4(), Utc::now());
        store.upsert_reading(&record).await.unwrap();
        store.pool().close().await;
    }

    let reopened = SqliteSyncStore::connect(&url).await.unwrap();
    let stored = reopened.get_configuration("cfg-file").await.unwrap().unwrap();
    assert_eq!(stored.dexcom_username, config.dexcom_username);
    assert_eq!(
        reopened
            .count_readings_for_phone(&config.patient_phone)
            .await
            .unwrap(),
        1
    );
}
