// ABOUTME: Scripted glucose provider for development and testing
// ABOUTME: Returns queued or default responses, fails per account on demand, and records every call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Static Provider
//!
//! A provider that needs no upstream. Responses come from, in order:
//!
//! 1. a per-account failure registered with [`StaticProvider::fail_for_account`]
//! 2. the front of the queue filled by [`StaticProvider::push_response`]
//! 3. the default response given at construction
//!
//! Every call is recorded so tests can assert which provider was used and
//! with which window.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::adapter::{FetchWindow, GlucoseProvider, ProviderCredentials};
use crate::errors::{ProviderError, ProviderResult};
use crate::models::{ProviderKind, Reading};

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    /// Account identifier from the credentials
    pub account: String,
    /// Window requested
    pub window: FetchWindow,
}

/// Scripted provider for tests
pub struct StaticProvider {
    kind: ProviderKind,
    default_response: ProviderResult<Vec<Reading>>,
    queued: Mutex<VecDeque<ProviderResult<Vec<Reading>>>>,
    account_failures: Mutex<HashMap<String, ProviderError>>,
    calls: Mutex<Vec<RecordedFetch>>,
    delay: Option<Duration>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StaticProvider {
    /// Provider that returns `readings` on every call
    #[must_use]
    pub fn returning(kind: ProviderKind, readings: Vec<Reading>) -> Self {
        Self::with_default(kind, Ok(readings))
    }

    /// Provider that fails with `error` on every call
    #[must_use]
    pub fn failing(kind: ProviderKind, error: ProviderError) -> Self {
        Self::with_default(kind, Err(error))
    }

    fn with_default(kind: ProviderKind, default_response: ProviderResult<Vec<Reading>>) -> Self {
        Self {
            kind,
            default_response,
            queued: Mutex::new(VecDeque::new()),
            account_failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep this long before answering
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a one-shot response ahead of the default
    pub fn push_response(&self, response: ProviderResult<Vec<Reading>>) {
        lock(&self.queued).push_back(response);
    }

    /// Always fail calls made with this account identifier
    pub fn fail_for_account(&self, account: impl Into<String>, error: ProviderError) {
        lock(&self.account_failures).insert(account.into(), error);
    }

    /// Calls made so far
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedFetch> {
        lock(&self.calls).clone()
    }

    /// Number of calls made so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl GlucoseProvider for StaticProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn fetch_readings(
        &self,
        credentials: &ProviderCredentials,
        window: FetchWindow,
    ) -> ProviderResult<Vec<Reading>> {
        let account = credentials.account().to_owned();
        lock(&self.calls).push(RecordedFetch {
            account: account.clone(),
            window,
        });

        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        if let Some(error) = lock(&self.account_failures).get(&account) {
            return Err(error.clone());
        }
        let queued = lock(&self.queued).pop_front();
        queued.unwrap_or_else(|| self.default_response.clone())
    }
}
