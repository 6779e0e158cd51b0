// ABOUTME: End-to-end tests for building the sync engine from environment configuration
// ABOUTME: Exercises key loading, file-backed storage, the configured provider deadline, and a full sync
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cgm_providers::{ProviderRegistry, StaticProvider};
use cgm_sync_engine::config::environment::env_vars;
use cgm_sync_engine::config::{Environment, SyncEngineConfig};
use cgm_sync_engine::database::SqliteSyncStore;
use cgm_sync_engine::errors::{ProviderError, SyncError};
use cgm_sync_engine::models::{ProviderKind, SyncOptions};
use cgm_sync_engine::sync::SyncEngine;
use common::{base_time, dexcom_config, init_test_logging, readings, TEST_KEY};
use tempfile::TempDir;

fn lookup<'a>(pairs: &'a [(&'a str, String)]) -> impl Fn(&str) -> Option<String> + 'a {
    move |name| {
        pairs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.clone())
    }
}

fn file_config(dir: &TempDir, extra: &[(&'static str, String)]) -> SyncEngineConfig {
    let mut pairs = vec![
        (
            env_vars::DATABASE_URL,
            format!("sqlite:{}", dir.path().join("engine.db").display()),
        ),
        (env_vars::SECRET_KEY, STANDARD.encode(TEST_KEY)),
        (env_vars::ENVIRONMENT, "testing".to_owned()),
    ];
    pairs.extend(extra.iter().cloned());
    SyncEngineConfig::from_lookup(lookup(&pairs)).unwrap()
}

#[tokio::test]
async fn test_engine_from_config_syncs_end_to_end() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir, &[(env_vars::FLEET_CONCURRENCY, "2".to_owned())]);
    assert_eq!(config.environment, Environment::Testing);
    assert_eq!(config.fleet_concurrency, 2);

    let dexcom = Arc::new(StaticProvider::returning(
        ProviderKind::DexcomShare,
        readings(ProviderKind::DexcomShare, base_time(), 4),
    ));
    let engine = SyncEngine::from_config(
        &config,
        ProviderRegistry::default().with_adapter(dexcom.clone()),
    )
    .await
    .unwrap();

    let fixtures = SqliteSyncStore::connect(&config.database_url).await.unwrap();
    fixtures
        .insert_configuration(&dexcom_config("cfg-e2e", "+15551230700"))
        .await
        .unwrap();
    fixtures
        .insert_configuration(&dexcom_config("cfg-e2e-2", "+15551230701"))
        .await
        .unwrap();

    let outcome = engine
        .sync_one("(555) 123-0700", SyncOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.persisted, 4);
    assert_eq!(outcome.provider, Some(ProviderKind::DexcomShare));

    let fleet = engine.sync_all().await.unwrap();
    assert_eq!(fleet.total, 2);
    assert_eq!(fleet.successful, 2);
    assert_eq!(fleet.total_persisted, 8);

    assert_eq!(
        fixtures
            .count_readings_for_phone("+15551230700")
            .await
            .unwrap(),
        4
    );
    assert_eq!(dexcom.call_count(), 3);
}

#[tokio::test]
async fn test_configured_deadline_replaces_registry_default() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir, &[(env_vars::PROVIDER_TIMEOUT_SECS, "1".to_owned())]);
    assert_eq!(config.provider_timeout, Duration::from_secs(1));

    let slow = Arc::new(
        StaticProvider::returning(
            ProviderKind::DexcomShare,
            readings(ProviderKind::DexcomShare, base_time(), 1),
        )
        .with_delay(Duration::from_secs(10)),
    );
    let engine = SyncEngine::from_config(
        &config,
        ProviderRegistry::new(Duration::from_secs(60)).with_adapter(slow),
    )
    .await
    .unwrap();

    let fixtures = SqliteSyncStore::connect(&config.database_url).await.unwrap();
    fixtures
        .insert_configuration(&dexcom_config("cfg-slow", "+15551230702"))
        .await
        .unwrap();

    let error = engine
        .sync_one("5551230702", SyncOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        SyncError::Provider(ProviderError::Timeout { seconds: 1, .. })
    ));

    let stored = fixtures.get_configuration("cfg-slow").await.unwrap().unwrap();
    assert_eq!(stored.sync_error_count, 1);
}

#[tokio::test]
async fn test_production_requires_a_secret_key() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let pairs = vec![
        (
            env_vars::DATABASE_URL,
            format!("sqlite:{}", dir.path().join("prod.db").display()),
        ),
        (env_vars::ENVIRONMENT, "production".to_owned()),
    ];
    let config = SyncEngineConfig::from_lookup(lookup(&pairs)).unwrap();

    let result = SyncEngine::from_config(&config, ProviderRegistry::default()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_invalid_concurrency_is_rejected() {
    let pairs = vec![(env_vars::FLEET_CONCURRENCY, "0".to_owned())];
    assert!(SyncEngineConfig::from_lookup(lookup(&pairs)).is_err());

    let pairs = vec![(env_vars::PROVIDER_TIMEOUT_SECS, "soon".to_owned())];
    assert!(SyncEngineConfig::from_lookup(lookup(&pairs)).is_err());
}
