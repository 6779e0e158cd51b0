// ABOUTME: Provider registry mapping each provider kind to its adapter
// ABOUTME: Bounds every fetch with a network deadline and reports expiry as a ProviderError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::adapter::{FetchWindow, GlucoseProvider, ProviderCredentials};
use crate::errors::{ProviderError, ProviderResult};
use crate::models::{ProviderKind, Reading};

/// Default deadline for one provider call
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Registry of glucose provider adapters
pub struct ProviderRegistry {
    adapters: HashMap<ProviderKind, Arc<dyn GlucoseProvider>>,
    timeout: Duration,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDER_TIMEOUT)
    }
}

impl ProviderRegistry {
    /// Create an empty registry with the given per-call deadline
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            adapters: HashMap::new(),
            timeout,
        }
    }

    /// Register an adapter, replacing any previous adapter for the same provider
    pub fn register(&mut self, adapter: Arc<dyn GlucoseProvider>) {
        let kind = adapter.kind();
        if self.adapters.insert(kind, adapter).is_some() {
            warn!(provider = %kind, "Replacing previously registered glucose provider adapter");
        } else {
            info!(provider = %kind, "Registered glucose provider adapter");
        }
    }

    /// Builder-style [`register`](Self::register)
    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn GlucoseProvider>) -> Self {
        self.register(adapter);
        self
    }

    /// Replace the per-call deadline
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-call deadline
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch readings from the adapter matching the credentials
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Unavailable` when no adapter is registered,
    /// `ProviderError::Timeout` when the deadline expires, and otherwise
    /// whatever the adapter reports.
    pub async fn fetch(
        &self,
        credentials: &ProviderCredentials,
        window: FetchWindow,
    ) -> ProviderResult<Vec<Reading>> {
        let kind = credentials.kind();
        let adapter = self
            .adapters
            .get(&kind)
            .ok_or_else(|| ProviderError::Unavailable {
                provider: kind.to_string(),
            })?;

        debug!(
            provider = %kind,
            window_minutes = window.window_minutes,
            max_count = window.max_count,
            "Fetching glucose readings"
        );

        match timeout(self.timeout, adapter.fetch_readings(credentials, window)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                provider: kind.to_string(),
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}
