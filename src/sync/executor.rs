// ABOUTME: Single-patient sync: resolve, select provider, fetch a bounded window, persist, update status
// ABOUTME: Failures after resolution are classified into a connection status before being returned
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use cgm_providers::{FetchWindow, ProviderRegistry};

use super::identity::IdentityResolver;
use super::locks::PatientLocks;
use super::selection::{credentials_for, ProviderSelector};
use super::status::{
    empty_update, next_status, success_update, AuthMarkerClassifier, FailureClassifier,
};
use crate::constants::messages;
use crate::crypto::SecretDecryptor;
use crate::database::SyncStore;
use crate::errors::{SyncError, SyncResult};
use crate::logging::SyncLogger;
use crate::models::{
    ConnectionStatus, GlucoseRecord, ProviderKind, Reading, SyncConfiguration, SyncOptions,
    SyncOutcome, UpsertOutcome,
};
use crate::utils::PhoneNormalizer;

/// What a fetch-and-persist attempt produced
enum Attempt {
    Empty(ProviderKind),
    Stored {
        provider: ProviderKind,
        batch_id: Uuid,
        returned: usize,
        persisted: usize,
        inserted: usize,
    },
}

/// Runs the sync algorithm for one patient at a time
pub struct SyncExecutor {
    store: Arc<dyn SyncStore>,
    resolver: IdentityResolver,
    providers: Arc<ProviderRegistry>,
    decryptor: Arc<dyn SecretDecryptor>,
    selector: ProviderSelector,
    classifier: Arc<dyn FailureClassifier>,
    locks: PatientLocks,
}

impl SyncExecutor {
    /// Executor with the default provider priority and auth-marker classifier
    #[must_use]
    pub fn new(
        store: Arc<dyn SyncStore>,
        providers: Arc<ProviderRegistry>,
        decryptor: Arc<dyn SecretDecryptor>,
        phones: Arc<dyn PhoneNormalizer>,
    ) -> Self {
        Self {
            resolver: IdentityResolver::new(Arc::clone(&store), phones),
            store,
            providers,
            decryptor,
            selector: ProviderSelector::default(),
            classifier: Arc::new(AuthMarkerClassifier::default()),
            locks: PatientLocks::new(),
        }
    }

    /// Replace the failure classifier
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn FailureClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the provider priority rules
    #[must_use]
    pub fn with_selector(mut self, selector: ProviderSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Identity resolver used by this executor
    #[must_use]
    pub const fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    /// Sync one patient identified by a phone in any format
    ///
    /// A disabled configuration or an empty provider result is a zero
    /// outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotConfigured`] when no configuration matches.
    /// Source selection, decryption and provider failures are recorded on the
    /// configuration's status and then returned unchanged. Store failures
    /// while updating the configuration are returned as they occur.
    #[instrument(skip(self, phone), fields(backfill = options.backfill))]
    pub async fn sync_one(&self, phone: &str, options: SyncOptions) -> SyncResult<SyncOutcome> {
        let config = self.resolver.resolve(phone).await?;
        let _guard = self.locks.acquire(&config.id).await;
        // Re-read under the lock; a sync that held it may have moved the counter.
        let config = self.resolver.resolve_id(&config.id).await?;
        self.run(config, options).await
    }

    /// Sync the configuration with id `config_id`
    ///
    /// Same steps as [`sync_one`](Self::sync_one) without the phone lookup,
    /// so a caller that already enumerated configurations syncs exactly the
    /// one it listed even when several share a phone.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ConfigurationRemoved`] when the id no longer
    /// exists; otherwise as [`sync_one`](Self::sync_one).
    #[instrument(skip(self), fields(backfill = options.backfill))]
    pub async fn sync_configuration(
        &self,
        config_id: &str,
        options: SyncOptions,
    ) -> SyncResult<SyncOutcome> {
        let _guard = self.locks.acquire(config_id).await;
        let config = self.resolver.resolve_id(config_id).await?;
        self.run(config, options).await
    }

    async fn run(&self, config: SyncConfiguration, options: SyncOptions) -> SyncResult<SyncOutcome> {
        if !config.sync_enabled {
            debug!(config_id = %config.id, "Sync disabled; skipping provider call");
            return Ok(SyncOutcome::disabled());
        }

        match self.fetch_and_persist(&config, options).await {
            Ok(Attempt::Empty(provider)) => {
                self.store
                    .update_configuration(
                        &config.id,
                        &empty_update(Utc::now(), messages::NO_READINGS_AVAILABLE),
                    )
                    .await?;
                SyncLogger::log_status_transition(
                    &config.id,
                    config.connection_status,
                    ConnectionStatus::Active,
                );
                info!(config_id = %config.id, provider = %provider, "Provider returned no readings");
                Ok(SyncOutcome::empty(provider))
            }
            Ok(Attempt::Stored {
                provider,
                batch_id,
                returned,
                persisted,
                inserted,
            }) => {
                self.store
                    .update_configuration(&config.id, &success_update(Utc::now()))
                    .await?;
                SyncLogger::log_status_transition(
                    &config.id,
                    config.connection_status,
                    ConnectionStatus::Active,
                );
                SyncLogger::log_sync_completed(
                    &config.id, provider, batch_id, returned, persisted, inserted,
                );
                Ok(SyncOutcome::completed(provider, returned, persisted, inserted))
            }
            Err(error) => {
                self.record_failure(&config, &error).await?;
                Err(error)
            }
        }
    }

    async fn fetch_and_persist(
        &self,
        config: &SyncConfiguration,
        options: SyncOptions,
    ) -> SyncResult<Attempt> {
        let provider = self
            .selector
            .select(config)
            .ok_or_else(|| SyncError::NoSourceConfigured {
                config_id: config.id.clone(),
            })?;
        let window = FetchWindow::for_provider(provider, options.backfill);
        let credentials = credentials_for(provider, config, self.decryptor.as_ref())?;

        let readings = self.providers.fetch(&credentials, window).await?;
        if readings.is_empty() {
            return Ok(Attempt::Empty(provider));
        }

        let returned = readings.len();
        let readings = cap_readings(readings, window.max_count);
        if readings.len() < returned {
            warn!(
                config_id = %config.id,
                provider = %provider,
                returned,
                max_count = window.max_count,
                "Provider exceeded the requested point cap; keeping the newest readings"
            );
        }
        let batch_id = Uuid::new_v4();
        let (persisted, inserted) = self.persist(config, readings, batch_id).await;
        Ok(Attempt::Stored {
            provider,
            batch_id,
            returned,
            persisted,
            inserted,
        })
    }

    /// Upsert every reading; a failed record is skipped, not fatal
    async fn persist(
        &self,
        config: &SyncConfiguration,
        readings: Vec<Reading>,
        batch_id: Uuid,
    ) -> (usize, usize) {
        let fetched_at = Utc::now();
        let mut persisted = 0;
        let mut inserted = 0;

        for reading in readings {
            let record = GlucoseRecord::from_reading(config, reading, batch_id, fetched_at);
            match self.store.upsert_reading(&record).await {
                Ok(UpsertOutcome::Inserted) => {
                    persisted += 1;
                    inserted += 1;
                }
                Ok(UpsertOutcome::Duplicate) => persisted += 1,
                Err(error) => warn!(
                    config_id = %config.id,
                    natural_id = %record.natural_id,
                    error = %error,
                    "Failed to persist glucose reading"
                ),
            }
        }
        (persisted, inserted)
    }

    async fn record_failure(&self, config: &SyncConfiguration, error: &SyncError) -> SyncResult<()> {
        let class = self.classifier.classify(error);
        let decision = next_status(config.connection_status, config.sync_error_count, class);

        SyncLogger::log_sync_failed(
            &config.id,
            &error.to_string(),
            decision.status,
            decision.error_count,
        );
        SyncLogger::log_status_transition(&config.id, config.connection_status, decision.status);

        self.store
            .update_configuration(
                &config.id,
                &decision.into_update(error.to_string(), Utc::now()),
            )
            .await
            .inspect_err(|store_error| {
                warn!(
                    config_id = %config.id,
                    error = %error,
                    store_error = %store_error,
                    "Could not record sync failure on configuration"
                );
            })?;
        Ok(())
    }
}

/// Keep the newest `max_count` readings
fn cap_readings(mut readings: Vec<Reading>, max_count: u32) -> Vec<Reading> {
    let cap = usize::try_from(max_count).unwrap_or(usize::MAX);
    if readings.len() > cap {
        readings.sort_unstable_by(|a, b| b.reading_timestamp.cmp(&a.reading_timestamp));
        readings.truncate(cap);
    }
    readings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn minutely(count: i64) -> Vec<Reading> {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        (0..count)
            .map(|i| Reading::new(ProviderKind::DexcomShare, 100.0, start + Duration::minutes(i)))
            .collect()
    }

    #[test]
    fn test_cap_keeps_newest() {
        let readings = minutely(10);
        let newest = readings[9].reading_timestamp;
        let oldest_kept = readings[6].reading_timestamp;

        let capped = cap_readings(readings, 4);

        assert_eq!(capped.len(), 4);
        assert!(capped.iter().any(|r| r.reading_timestamp == newest));
        assert!(capped.iter().all(|r| r.reading_timestamp >= oldest_kept));
    }

    #[test]
    fn test_cap_leaves_short_batches_alone() {
        let readings = minutely(3);
        assert_eq!(cap_readings(readings.clone(), 864), readings);
    }
}
