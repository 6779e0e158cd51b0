// ABOUTME: Keyed async locks giving each patient configuration a single in-flight sync
// ABOUTME: Prevents two concurrent syncs from racing on the same status and counter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = DashMap<String, Arc<Mutex<()>>>;

/// One async mutex per configuration id
///
/// Entries exist only while a sync holds or waits for them.
#[derive(Debug, Default)]
pub struct PatientLocks {
    locks: Arc<LockTable>,
}

/// Exclusive access to one configuration; releasing it prunes the idle entry
#[derive(Debug)]
pub struct PatientGuard {
    guard: Option<OwnedMutexGuard<()>>,
    config_id: String,
    locks: Arc<LockTable>,
}

impl Drop for PatientGuard {
    fn drop(&mut self) {
        // Release first so our own clone no longer counts.
        drop(self.guard.take());
        self.locks
            .remove_if(&self.config_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl PatientLocks {
    /// Create an empty lock table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `config_id`
    pub async fn acquire(&self, config_id: &str) -> PatientGuard {
        // Clone the Arc out so the shard guard is released before awaiting.
        let lock = self
            .locks
            .entry(config_id.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        PatientGuard {
            guard: Some(guard),
            config_id: config_id.to_owned(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of configurations currently locked or awaited
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no configuration is locked or awaited
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
