// ABOUTME: Provider selection by credential priority and credential decryption for the chosen provider
// ABOUTME: Priority is an explicit ordered rule list: Dexcom Share, then LibreLinkUp, then Nightscout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use zeroize::Zeroizing;

use cgm_providers::ProviderCredentials;

use crate::crypto::SecretDecryptor;
use crate::errors::{SyncError, SyncResult};
use crate::models::{ProviderKind, SyncConfiguration};

/// Whether a configuration carries a usable credential set
pub type CredentialPredicate = fn(&SyncConfiguration) -> bool;

/// Ordered `(provider, predicate)` rules; the first matching rule wins
#[derive(Debug, Clone)]
pub struct ProviderSelector {
    rules: Vec<(ProviderKind, CredentialPredicate)>,
}

impl Default for ProviderSelector {
    fn default() -> Self {
        Self::new(vec![
            (ProviderKind::DexcomShare, SyncConfiguration::has_dexcom_credentials),
            (ProviderKind::LibreLinkUp, SyncConfiguration::has_libre_credentials),
            (ProviderKind::Nightscout, SyncConfiguration::has_nightscout_credentials),
        ])
    }
}

impl ProviderSelector {
    /// Selector over custom rules, evaluated in order
    #[must_use]
    pub const fn new(rules: Vec<(ProviderKind, CredentialPredicate)>) -> Self {
        Self { rules }
    }

    /// Providers in priority order
    pub fn priority(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        self.rules.iter().map(|(kind, _)| *kind)
    }

    /// First provider whose credentials are configured
    #[must_use]
    pub fn select(&self, config: &SyncConfiguration) -> Option<ProviderKind> {
        self.rules
            .iter()
            .find(|(_, configured)| configured(config))
            .map(|(kind, _)| *kind)
    }
}

fn decrypt_required(
    decryptor: &dyn SecretDecryptor,
    encrypted: Option<&String>,
    what: &str,
) -> SyncResult<Zeroizing<String>> {
    let encrypted = encrypted.ok_or_else(|| SyncError::Decryption(format!("{what} is missing")))?;
    decryptor.decrypt(encrypted)
}

/// Decrypt the credential set of `kind` from `config`
///
/// # Errors
///
/// Returns [`SyncError::Decryption`] if a stored secret cannot be recovered
pub fn credentials_for(
    kind: ProviderKind,
    config: &SyncConfiguration,
    decryptor: &dyn SecretDecryptor,
) -> SyncResult<ProviderCredentials> {
    let credentials = match kind {
        ProviderKind::DexcomShare => ProviderCredentials::DexcomShare {
            username: config.dexcom_username.clone().unwrap_or_default(),
            password: decrypt_required(
                decryptor,
                config.dexcom_password_encrypted.as_ref(),
                "Dexcom password",
            )?,
        },
        ProviderKind::LibreLinkUp => ProviderCredentials::LibreLinkUp {
            email: config.libre_email.clone().unwrap_or_default(),
            password: decrypt_required(
                decryptor,
                config.libre_password_encrypted.as_ref(),
                "Libre password",
            )?,
            region: config.libre_region.clone(),
        },
        ProviderKind::Nightscout => ProviderCredentials::Nightscout {
            url: config.nightscout_url.clone().unwrap_or_default(),
            api_secret: config
                .nightscout_api_secret_encrypted
                .as_deref()
                .filter(|secret| !secret.trim().is_empty())
                .map(|secret| decryptor.decrypt(secret))
                .transpose()?,
        },
    };
    Ok(credentials)
}
