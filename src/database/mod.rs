// ABOUTME: Store capability consumed by the sync engine
// ABOUTME: Read, upsert, and update verbs over sync configurations, glucose readings, and the patient registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Persistence contract for the sync engine
//!
//! The engine receives an `Arc<dyn SyncStore>` at construction time; there is
//! no process-wide client. [`SqliteSyncStore`] is the bundled implementation.

use async_trait::async_trait;

use crate::errors::StoreResult;
use crate::models::{
    ConfigurationFilter, ConfigurationUpdate, GlucoseRecord, SyncConfiguration, UpsertOutcome,
};

/// SQLite implementation of [`SyncStore`]
pub mod sqlite;

pub use sqlite::SqliteSyncStore;

/// Persistence verbs the sync engine needs
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Find the configuration whose stored phone matches either representation
    async fn find_configuration_by_phone(
        &self,
        e164: &str,
        normalized: &str,
    ) -> StoreResult<Option<SyncConfiguration>>;

    /// Fetch a configuration by id
    async fn find_configuration(&self, config_id: &str) -> StoreResult<Option<SyncConfiguration>>;

    /// List configurations passing `filter`
    async fn list_configurations(
        &self,
        filter: &ConfigurationFilter,
    ) -> StoreResult<Vec<SyncConfiguration>>;

    /// Look up a unified patient reference by digits-only phone
    async fn find_unified_patient_id(&self, normalized_phone: &str) -> StoreResult<Option<String>>;

    /// Record the unified patient reference on a configuration
    async fn link_unified_patient(
        &self,
        config_id: &str,
        unified_patient_id: &str,
    ) -> StoreResult<()>;

    /// Insert a reading keyed by its natural identifier, ignoring duplicates
    async fn upsert_reading(&self, record: &GlucoseRecord) -> StoreResult<UpsertOutcome>;

    /// Apply a partial update to a configuration
    async fn update_configuration(
        &self,
        config_id: &str,
        update: &ConfigurationUpdate,
    ) -> StoreResult<()>;
}
