// ABOUTME: Fleet orchestrator running the single-patient sync over every eligible configuration
// ABOUTME: Bounded concurrency, per-patient failure isolation, and best-effort cancellation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::num::NonZeroUsize;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::executor::SyncExecutor;
use crate::config::environment::DEFAULT_FLEET_CONCURRENCY;
use crate::database::SyncStore;
use crate::errors::SyncResult;
use crate::logging::SyncLogger;
use crate::models::{ConfigurationFilter, FleetOutcome, SyncOptions, SyncOutcome};

/// Per-patient result inside a fleet run; `None` when cancellation skipped it
type PatientResult = Option<SyncResult<SyncOutcome>>;

/// Syncs all enabled configurations that are not waiting on credential fixes
pub struct FleetOrchestrator {
    store: Arc<dyn SyncStore>,
    executor: Arc<SyncExecutor>,
    concurrency: NonZeroUsize,
}

impl FleetOrchestrator {
    /// Sequential orchestrator
    #[must_use]
    pub fn new(store: Arc<dyn SyncStore>, executor: Arc<SyncExecutor>) -> Self {
        Self {
            store,
            executor,
            concurrency: NonZeroUsize::new(DEFAULT_FLEET_CONCURRENCY).unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// Work on up to `concurrency` patients at once; zero is treated as one
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = NonZeroUsize::new(concurrency).unwrap_or(NonZeroUsize::MIN);
        self
    }

    /// Sync every eligible configuration
    ///
    /// # Errors
    ///
    /// Returns a persistence error only if the configurations cannot be
    /// enumerated. Per-patient failures are logged and counted, never returned.
    pub async fn sync_all(&self) -> SyncResult<FleetOutcome> {
        self.sync_all_until(&CancellationToken::new()).await
    }

    /// Sync every eligible configuration until `cancel` fires
    ///
    /// Once cancelled no further patient is started; syncs already running
    /// finish normally and are counted.
    ///
    /// # Errors
    ///
    /// Returns a persistence error only if the configurations cannot be
    /// enumerated.
    pub async fn sync_all_until(&self, cancel: &CancellationToken) -> SyncResult<FleetOutcome> {
        let configs = self
            .store
            .list_configurations(&ConfigurationFilter::fleet())
            .await?;
        let total = configs.len();
        debug!(total, concurrency = self.concurrency.get(), "Starting fleet sync");

        let results: Vec<PatientResult> = stream::iter(configs)
            .map(|config| async move {
                if cancel.is_cancelled() {
                    return None;
                }
                let result = self
                    .executor
                    .sync_configuration(&config.id, SyncOptions::default())
                    .await;
                if let Err(error) = &result {
                    warn!(
                        config_id = %config.id,
                        error = %error,
                        code = ?error.code(),
                        http_status = error.code().http_status(),
                        "Patient sync failed during fleet run"
                    );
                }
                Some(result)
            })
            .buffer_unordered(self.concurrency.get())
            .collect()
            .await;

        let outcome = tally(total, &results);
        SyncLogger::log_fleet_summary(&outcome);
        Ok(outcome)
    }
}

fn tally(total: usize, results: &[PatientResult]) -> FleetOutcome {
    results
        .iter()
        .flatten()
        .fold(FleetOutcome { total, ..FleetOutcome::default() }, |mut acc, result| {
            acc.attempted += 1;
            if let Ok(outcome) = result {
                acc.successful += 1;
                acc.total_persisted += outcome.persisted;
            }
            acc
        })
}
