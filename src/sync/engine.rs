// ABOUTME: Wires store, cipher, phone normalizer, and provider registry into a ready sync engine
// ABOUTME: Entry point used by the manual-sync handler and the scheduled fleet trigger
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use cgm_providers::ProviderRegistry;

use super::executor::SyncExecutor;
use super::fleet::FleetOrchestrator;
use crate::config::SyncEngineConfig;
use crate::crypto::{AesGcmSecretCipher, SecretDecryptor};
use crate::database::{SqliteSyncStore, SyncStore};
use crate::errors::SyncResult;
use crate::models::{FleetOutcome, SyncOptions, SyncOutcome};
use crate::utils::{NanpPhoneNormalizer, PhoneNormalizer};

/// Sync executor and fleet orchestrator sharing one store
#[derive(Clone)]
pub struct SyncEngine {
    executor: Arc<SyncExecutor>,
    fleet: Arc<FleetOrchestrator>,
}

impl SyncEngine {
    /// Assemble an engine from explicit collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn SyncStore>,
        providers: ProviderRegistry,
        decryptor: Arc<dyn SecretDecryptor>,
        phones: Arc<dyn PhoneNormalizer>,
        fleet_concurrency: usize,
    ) -> Self {
        let executor = Arc::new(SyncExecutor::new(
            Arc::clone(&store),
            Arc::new(providers),
            decryptor,
            phones,
        ));
        let fleet = FleetOrchestrator::new(store, Arc::clone(&executor))
            .with_concurrency(fleet_concurrency);
        Self {
            executor,
            fleet: Arc::new(fleet),
        }
    }

    /// Connect the SQLite store and build the default collaborators from `config`
    ///
    /// The registry's own deadline is replaced by `config.provider_timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret key is unusable or the store cannot be opened
    pub async fn from_config(config: &SyncEngineConfig, providers: ProviderRegistry) -> Result<Self> {
        let cipher = AesGcmSecretCipher::load_or_generate(config)?;
        let store = SqliteSyncStore::connect(&config.database_url).await?;
        let providers = providers.with_timeout(config.provider_timeout);

        Ok(Self::new(
            Arc::new(store),
            providers,
            Arc::new(cipher),
            Arc::new(NanpPhoneNormalizer),
            config.fleet_concurrency,
        ))
    }

    /// Sync one patient by phone
    ///
    /// # Errors
    ///
    /// See [`SyncExecutor::sync_one`]
    pub async fn sync_one(&self, phone: &str, options: SyncOptions) -> SyncResult<SyncOutcome> {
        self.executor.sync_one(phone, options).await
    }

    /// Sync one configuration by id
    ///
    /// # Errors
    ///
    /// See [`SyncExecutor::sync_configuration`]
    pub async fn sync_configuration(
        &self,
        config_id: &str,
        options: SyncOptions,
    ) -> SyncResult<SyncOutcome> {
        self.executor.sync_configuration(config_id, options).await
    }

    /// Sync every eligible patient
    ///
    /// # Errors
    ///
    /// See [`FleetOrchestrator::sync_all`]
    pub async fn sync_all(&self) -> SyncResult<FleetOutcome> {
        self.fleet.sync_all().await
    }

    /// Sync every eligible patient until `cancel` fires
    ///
    /// # Errors
    ///
    /// See [`FleetOrchestrator::sync_all_until`]
    pub async fn sync_all_until(&self, cancel: &CancellationToken) -> SyncResult<FleetOutcome> {
        self.fleet.sync_all_until(cancel).await
    }

    /// Underlying executor
    #[must_use]
    pub fn executor(&self) -> &SyncExecutor {
        &self.executor
    }
}
