// ABOUTME: Sync request options and the outcomes reported for one patient and for a fleet run
// ABOUTME: Outcome constructors keep persisted <= returned by construction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

use super::ProviderKind;
use crate::constants::messages;

/// Options for a single-patient sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Fetch the long historical window instead of the short default one
    pub backfill: bool,
}

impl SyncOptions {
    /// Options for a backfill sync
    #[must_use]
    pub const fn backfill() -> Self {
        Self { backfill: true }
    }
}

/// Result of one patient's sync attempt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Readings whose upsert did not error (duplicates included)
    pub persisted: usize,
    /// Readings returned by the provider
    pub returned: usize,
    /// Readings that were new to the store
    pub inserted: usize,
    /// Provider used, if one was called
    pub provider: Option<ProviderKind>,
    /// Human-readable note
    pub message: Option<String>,
}

impl SyncOutcome {
    /// Zero outcome for a configuration with sync turned off
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            message: Some(messages::SYNC_DISABLED.to_owned()),
            ..Self::default()
        }
    }

    /// Zero outcome for a reachable provider that had nothing to return
    #[must_use]
    pub fn empty(provider: ProviderKind) -> Self {
        Self {
            provider: Some(provider),
            message: Some(messages::NO_READINGS_AVAILABLE.to_owned()),
            ..Self::default()
        }
    }

    /// Outcome of a sync that persisted readings
    ///
    /// Counts are clamped so that `inserted <= persisted <= returned`.
    #[must_use]
    pub fn completed(
        provider: ProviderKind,
        returned: usize,
        persisted: usize,
        inserted: usize,
    ) -> Self {
        let persisted = persisted.min(returned);
        Self {
            persisted,
            returned,
            inserted: inserted.min(persisted),
            provider: Some(provider),
            message: Some(format!(
                "persisted {persisted} of {returned} readings from {provider}"
            )),
        }
    }
}

/// Aggregate result of a fleet sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetOutcome {
    /// Sum of `persisted` over successful patients
    pub total_persisted: usize,
    /// Patients whose sync returned without error
    pub successful: usize,
    /// Patients whose sync was started
    pub attempted: usize,
    /// Patients enumerated for this run
    pub total: usize,
}

impl FleetOutcome {
    /// Patients attempted whose sync raised an error
    #[must_use]
    pub const fn failed(&self) -> usize {
        self.attempted.saturating_sub(self.successful)
    }

    /// Whether cancellation stopped the run before every patient was started
    #[must_use]
    pub const fn was_cancelled(&self) -> bool {
        self.attempted < self.total
    }
}
