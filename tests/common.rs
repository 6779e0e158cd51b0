// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory stores, configuration fixtures, scripted providers, and a flaky store wrapper
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used,
    missing_docs
)]
//! Shared test utilities for `cgm_sync_engine`

use std::collections::HashSet;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use cgm_providers::{ProviderRegistry, StaticProvider};
use cgm_sync_engine::crypto::{AesGcmSecretCipher, KEY_LEN};
use cgm_sync_engine::database::{SqliteSyncStore, SyncStore};
use cgm_sync_engine::errors::{StoreError, StoreResult};
use cgm_sync_engine::models::{
    ConfigurationFilter, ConfigurationUpdate, GlucoseRecord, ProviderKind, Reading,
    SyncConfiguration, UpsertOutcome,
};
use cgm_sync_engine::sync::SyncExecutor;
use cgm_sync_engine::utils::{NanpPhoneNormalizer, PhoneNormalizer};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Fixed key so fixtures and executors agree on stored secrets
pub const TEST_KEY: [u8; KEY_LEN] = [42u8; KEY_LEN];

/// Initialize quiet test logging once per process
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

pub fn test_cipher() -> AesGcmSecretCipher {
    AesGcmSecretCipher::new(TEST_KEY)
}

pub fn encrypt(plaintext: &str) -> String {
    test_cipher().encrypt(plaintext).unwrap()
}

/// Standard in-memory store
pub async fn create_test_store() -> Arc<SqliteSyncStore> {
    init_test_logging();
    Arc::new(SqliteSyncStore::connect("sqlite::memory:").await.unwrap())
}

/// Configuration for `phone` with nothing configured yet
pub fn bare_config(id: &str, phone: &str) -> SyncConfiguration {
    let phones = NanpPhoneNormalizer;
    let mut config = SyncConfiguration::new(id, phones.to_e164(phone), phones.to_normalized(phone));
    config.patient_name = Some(format!("Patient {id}"));
    config.patient_mrn = Some(format!("MRN-{id}"));
    config
}

pub fn dexcom_config(id: &str, phone: &str) -> SyncConfiguration {
    let mut config = bare_config(id, phone);
    config.dexcom_username = Some(format!("dexcom-{id}"));
    config.dexcom_password_encrypted = Some(encrypt("dexcom-password"));
    config
}

pub fn libre_config(id: &str, phone: &str) -> SyncConfiguration {
    let mut config = bare_config(id, phone);
    config.libre_email = Some(format!("{id}@libre.example.org"));
    config.libre_password_encrypted = Some(encrypt("libre-password"));
    config.libre_region = Some("eu".to_owned());
    config
}

pub fn nightscout_config(id: &str, phone: &str) -> SyncConfiguration {
    let mut config = bare_config(id, phone);
    config.nightscout_url = Some(format!("https://{id}.nightscout.example.org"));
    config
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// `count` readings five minutes apart starting at `start`, without provider ids
pub fn readings(kind: ProviderKind, start: DateTime<Utc>, count: usize) -> Vec<Reading> {
    (0..count)
        .map(|i| {
            let minutes = i64::try_from(i).unwrap() * 5;
            let mut reading = Reading::new(
                kind,
                100.0 + f64::from(u32::try_from(i).unwrap()),
                start + ChronoDuration::minutes(minutes),
            );
            reading.trend_direction = Some("Flat".to_owned());
            reading.trend_arrow = Some("→".to_owned());
            reading.device_name = Some("G7".to_owned());
            reading
        })
        .collect()
}

/// Readings carrying provider-supplied identifiers `{prefix}-{i}`
pub fn identified_readings(
    kind: ProviderKind,
    start: DateTime<Utc>,
    count: usize,
    prefix: &str,
) -> Vec<Reading> {
    readings(kind, start, count)
        .into_iter()
        .enumerate()
        .map(|(i, mut reading)| {
            reading.nightscout_id = Some(format!("{prefix}-{i}"));
            reading
        })
        .collect()
}

/// Scripted providers plus an executor wired to a store
pub struct Harness {
    pub store: Arc<SqliteSyncStore>,
    pub dexcom: Arc<StaticProvider>,
    pub libre: Arc<StaticProvider>,
    pub nightscout: Arc<StaticProvider>,
    pub executor: Arc<SyncExecutor>,
}

impl Harness {
    /// Providers that return no readings
    pub async fn new() -> Self {
        Self::with_providers(
            StaticProvider::returning(ProviderKind::DexcomShare, Vec::new()),
            StaticProvider::returning(ProviderKind::LibreLinkUp, Vec::new()),
            StaticProvider::returning(ProviderKind::Nightscout, Vec::new()),
        )
        .await
    }

    pub async fn with_providers(
        dexcom: StaticProvider,
        libre: StaticProvider,
        nightscout: StaticProvider,
    ) -> Self {
        let store = create_test_store().await;
        Self::over_store(store.clone(), store, dexcom, libre, nightscout)
    }

    /// Executor that talks to `engine_store`; fixtures go through `store`
    pub fn over_store(
        store: Arc<SqliteSyncStore>,
        engine_store: Arc<dyn SyncStore>,
        dexcom: StaticProvider,
        libre: StaticProvider,
        nightscout: StaticProvider,
    ) -> Self {
        let dexcom = Arc::new(dexcom);
        let libre = Arc::new(libre);
        let nightscout = Arc::new(nightscout);
        let registry = registry_with(&dexcom, &libre, &nightscout, Duration::from_secs(30));
        let executor = Arc::new(SyncExecutor::new(
            engine_store,
            Arc::new(registry),
            Arc::new(test_cipher()),
            Arc::new(NanpPhoneNormalizer),
        ));
        Self {
            store,
            dexcom,
            libre,
            nightscout,
            executor,
        }
    }

    pub async fn provision(&self, config: &SyncConfiguration) {
        self.store.insert_configuration(config).await.unwrap();
    }

    pub async fn reload(&self, id: &str) -> SyncConfiguration {
        self.store.get_configuration(id).await.unwrap().unwrap()
    }

    pub fn total_calls(&self) -> usize {
        self.dexcom.call_count() + self.libre.call_count() + self.nightscout.call_count()
    }
}

pub fn registry_with(
    dexcom: &Arc<StaticProvider>,
    libre: &Arc<StaticProvider>,
    nightscout: &Arc<StaticProvider>,
    timeout: Duration,
) -> ProviderRegistry {
    ProviderRegistry::new(timeout)
        .with_adapter(dexcom.clone())
        .with_adapter(libre.clone())
        .with_adapter(nightscout.clone())
}

/// Store wrapper that fails chosen upserts and, on demand, configuration updates
pub struct FlakyStore {
    inner: Arc<SqliteSyncStore>,
    failing_natural_ids: HashSet<String>,
    fail_updates: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<SqliteSyncStore>) -> Self {
        Self {
            inner,
            failing_natural_ids: HashSet::new(),
            fail_updates: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn failing_upsert(mut self, natural_id: impl Into<String>) -> Self {
        self.failing_natural_ids.insert(natural_id.into());
        self
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SyncStore for FlakyStore {
    async fn find_configuration_by_phone(
        &self,
        e164: &str,
        normalized: &str,
    ) -> StoreResult<Option<SyncConfiguration>> {
        self.inner.find_configuration_by_phone(e164, normalized).await
    }

    async fn find_configuration(&self, config_id: &str) -> StoreResult<Option<SyncConfiguration>> {
        self.inner.find_configuration(config_id).await
    }

    async fn list_configurations(
        &self,
        filter: &ConfigurationFilter,
    ) -> StoreResult<Vec<SyncConfiguration>> {
        self.inner.list_configurations(filter).await
    }

    async fn find_unified_patient_id(&self, normalized_phone: &str) -> StoreResult<Option<String>> {
        self.inner.find_unified_patient_id(normalized_phone).await
    }

    async fn link_unified_patient(
        &self,
        config_id: &str,
        unified_patient_id: &str,
    ) -> StoreResult<()> {
        self.inner
            .link_unified_patient(config_id, unified_patient_id)
            .await
    }

    async fn upsert_reading(&self, record: &GlucoseRecord) -> StoreResult<UpsertOutcome> {
        if self.failing_natural_ids.contains(&record.natural_id) {
            return Err(StoreError::Query("disk I/O error".to_owned()));
        }
        self.inner.upsert_reading(record).await
    }

    async fn update_configuration(
        &self,
        config_id: &str,
        update: &ConfigurationUpdate,
    ) -> StoreResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Query("database is locked".to_owned()));
        }
        self.inner.update_configuration(config_id, update).await
    }
}
