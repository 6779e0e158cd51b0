// ABOUTME: Identity resolver mapping a phone in any format to its sync configuration
// ABOUTME: Lazily backfills the unified patient reference from the patient registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use tracing::{debug, info};

use crate::database::SyncStore;
use crate::errors::{SyncError, SyncResult};
use crate::models::SyncConfiguration;
use crate::utils::PhoneNormalizer;

/// Looks up configurations by phone and links unified patient identities
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn SyncStore>,
    phones: Arc<dyn PhoneNormalizer>,
}

impl IdentityResolver {
    /// Create a resolver over `store`
    #[must_use]
    pub fn new(store: Arc<dyn SyncStore>, phones: Arc<dyn PhoneNormalizer>) -> Self {
        Self { store, phones }
    }

    /// Resolve `phone` to its configuration
    ///
    /// Not side-effect free: when the configuration has no unified patient
    /// reference and the registry knows the phone, the reference is stored.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotConfigured`] if no configuration matches, or a
    /// persistence error if a lookup or the link write fails
    pub async fn resolve(&self, phone: &str) -> SyncResult<SyncConfiguration> {
        let e164 = self.phones.to_e164(phone);
        let normalized = self.phones.to_normalized(phone);

        let config = self
            .store
            .find_configuration_by_phone(&e164, &normalized)
            .await?
            .ok_or_else(|| SyncError::NotConfigured {
                phone: phone.to_owned(),
            })?;

        self.link_identity(config, &normalized).await
    }

    /// Load the configuration with id `config_id`, linking it like [`resolve`](Self::resolve)
    ///
    /// The registry is searched by the configuration's own digits-only phone.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ConfigurationRemoved`] if the id no longer exists,
    /// or a persistence error if a lookup or the link write fails
    pub async fn resolve_id(&self, config_id: &str) -> SyncResult<SyncConfiguration> {
        let config = self
            .store
            .find_configuration(config_id)
            .await?
            .ok_or_else(|| SyncError::ConfigurationRemoved {
                config_id: config_id.to_owned(),
            })?;
        let normalized = config.patient_phone_normalized.clone();

        self.link_identity(config, &normalized).await
    }

    async fn link_identity(
        &self,
        mut config: SyncConfiguration,
        normalized: &str,
    ) -> SyncResult<SyncConfiguration> {
        if config.unified_patient_id.is_none() {
            if let Some(unified_id) = self.store.find_unified_patient_id(normalized).await? {
                self.store
                    .link_unified_patient(&config.id, &unified_id)
                    .await?;
                info!(
                    config_id = %config.id,
                    unified_patient_id = %unified_id,
                    "Linked sync configuration to unified patient"
                );
                config.unified_patient_id = Some(unified_id);
            } else {
                debug!(config_id = %config.id, "No unified patient registered for phone");
            }
        }

        Ok(config)
    }
}
