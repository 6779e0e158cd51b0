// ABOUTME: Error taxonomy for a single patient's sync attempt
// ABOUTME: Wraps provider and store failures and maps every variant to an ErrorCode
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

use super::{ErrorCode, ProviderError, StoreError};

/// Unrecoverable failures of `sync_one`
///
/// A disabled configuration and an empty provider result are not errors;
/// they come back as a zero `SyncOutcome` instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No configuration matches the phone in any stored representation
    #[error("no CGM sync configuration found for {phone}")]
    NotConfigured {
        /// Phone as supplied by the caller
        phone: String,
    },

    /// A configuration listed for sync was deleted before it ran
    #[error("sync configuration {config_id} no longer exists")]
    ConfigurationRemoved {
        /// Configuration identifier
        config_id: String,
    },

    /// The configuration has no usable provider credential set
    #[error("no glucose data source configured for sync configuration {config_id}")]
    NoSourceConfigured {
        /// Configuration identifier
        config_id: String,
    },

    /// The upstream fetch failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The stored provider secret could not be recovered
    #[error("stored provider secret could not be decrypted: {0}")]
    Decryption(String),

    /// Configuration lookup or bookkeeping failed
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl SyncError {
    /// Standard error code for this failure
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotConfigured { .. } | Self::ConfigurationRemoved { .. } => {
                ErrorCode::ConfigNotFound
            }
            Self::NoSourceConfigured { .. } => ErrorCode::ConfigMissing,
            Self::Provider(error) => error.code(),
            Self::Decryption(_) => ErrorCode::DecryptionError,
            Self::Persistence(_) => ErrorCode::DatabaseError,
        }
    }
}

/// Result alias for sync engine operations
pub type SyncResult<T> = Result<T, SyncError>;
